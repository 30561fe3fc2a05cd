//! In-process backend.
//!
//! Mirrors what provisioning can observe from the engine: the implicit
//! `_id_` index, namespace and index-option conflicts, implicit collection
//! creation on index builds and writes, and unique-key enforcement. It can
//! also be told to behave like a managed emulation without schema validation
//! and to fail chosen operations.

use ::std::collections::{BTreeMap, HashMap};
use ::std::sync::{Mutex, MutexGuard};

use ::serde_json::{Map, Value};

use crate::backend::{key_value, Backend};
use crate::catalog::{IndexSpec, KeyDirection};

const ID_INDEX: &str = "_id_";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredIndex {
    pub name: String,
    pub keys: Vec<(String, KeyDirection)>,
    pub unique: bool,
    pub sparse: bool,
    pub expire_after_seconds: Option<u64>,
}

impl StoredIndex {
    fn id() -> Self {
        Self {
            name: ID_INDEX.to_string(),
            keys: vec![("_id".to_string(), KeyDirection::Ascending)],
            unique: true,
            sparse: false,
            expire_after_seconds: None,
        }
    }

    fn from_spec(index: &IndexSpec) -> Self {
        Self {
            name: index.name().to_string(),
            keys: index
                .keys
                .iter()
                .map(|(path, direction)| (path.to_string(), *direction))
                .collect(),
            unique: index.options.unique,
            sparse: index.options.sparse,
            expire_after_seconds: index.options.expire_after_seconds,
        }
    }

    /// `None` when a sparse index skips the document.
    fn key_of(&self, document: &Map<String, Value>) -> Option<Vec<Value>> {
        let values: Vec<Value> = self
            .keys
            .iter()
            .map(|(path, _)| lookup(document, path).cloned())
            .map(|value| value.unwrap_or(Value::Null))
            .collect();

        if self.sparse
            && self
                .keys
                .iter()
                .all(|(path, _)| lookup(document, path).is_none())
        {
            return None;
        }

        Some(values)
    }
}

fn lookup<'a>(document: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}

struct StoredCollection {
    validator: Option<Value>,
    indexes: Vec<StoredIndex>,
    documents: Vec<Map<String, Value>>,
}

impl StoredCollection {
    fn new(validator: Option<Value>) -> Self {
        Self {
            validator,
            indexes: vec![StoredIndex::id()],
            documents: vec![],
        }
    }

    fn duplicate_under(
        &self,
        index: &StoredIndex,
        candidate: &Map<String, Value>,
    ) -> bool {
        let Some(key) = index.key_of(candidate) else {
            return false;
        };

        self.documents
            .iter()
            .filter_map(|document| index.key_of(document))
            .any(|existing| existing == key)
    }

    fn has_duplicates_under(&self, index: &StoredIndex) -> bool {
        let mut seen = vec![];

        for key in self
            .documents
            .iter()
            .filter_map(|document| index.key_of(document))
        {
            if seen.contains(&key) {
                return true;
            }
            seen.push(key);
        }

        false
    }
}

#[derive(Default)]
struct State {
    collections: BTreeMap<String, StoredCollection>,
    create_collection_calls: HashMap<String, usize>,
}

impl State {
    fn collection_or_create(&mut self, name: &str) -> &mut StoredCollection {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| StoredCollection::new(None))
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    restricted: bool,
    collection_failures: HashMap<String, String>,
    index_failures: HashMap<(String, String), String>,
    upsert_failures: HashMap<String, String>,
    list_index_failures: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects validators the way managed emulations of the engine do.
    pub fn restricted(mut self) -> Self {
        self.restricted = true;
        self
    }

    /// Every creation attempt for `collection` fails with `message`.
    pub fn fail_collection(mut self, collection: &str, message: &str) -> Self {
        self.collection_failures
            .insert(collection.to_string(), message.to_string());
        self
    }

    pub fn fail_index(
        mut self,
        collection: &str,
        index: &str,
        message: &str,
    ) -> Self {
        self.index_failures.insert(
            (collection.to_string(), index.to_string()),
            message.to_string(),
        );
        self
    }

    /// Upserts of the document whose key field equals `key` fail.
    pub fn fail_upsert(mut self, key: &str, message: &str) -> Self {
        self.upsert_failures
            .insert(key.to_string(), message.to_string());
        self
    }

    pub fn fail_list_indexes(mut self, collection: &str, message: &str) -> Self {
        self.list_index_failures
            .insert(collection.to_string(), message.to_string());
        self
    }

    fn state(&self) -> ::anyhow::Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ::anyhow::anyhow!("memory backend lock poisoned"))
    }

    pub fn collection_names(&self) -> ::anyhow::Result<Vec<String>> {
        Ok(self.state()?.collections.keys().cloned().collect())
    }

    pub fn validator(&self, collection: &str) -> ::anyhow::Result<Option<Value>> {
        Ok(self
            .state()?
            .collections
            .get(collection)
            .and_then(|stored| stored.validator.clone()))
    }

    pub fn index(
        &self,
        collection: &str,
        name: &str,
    ) -> ::anyhow::Result<Option<StoredIndex>> {
        Ok(self.state()?.collections.get(collection).and_then(|stored| {
            stored.indexes.iter().find(|index| index.name == name).cloned()
        }))
    }

    pub fn documents(
        &self,
        collection: &str,
    ) -> ::anyhow::Result<Vec<Map<String, Value>>> {
        Ok(self
            .state()?
            .collections
            .get(collection)
            .map(|stored| stored.documents.clone())
            .unwrap_or_default())
    }

    /// Number of `create_collection` calls received for `collection`.
    pub fn create_collection_calls(
        &self,
        collection: &str,
    ) -> ::anyhow::Result<usize> {
        Ok(self
            .state()?
            .create_collection_calls
            .get(collection)
            .copied()
            .unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn list_collection_names(&self) -> ::anyhow::Result<Vec<String>> {
        self.collection_names()
    }

    async fn create_collection(
        &self,
        name: &str,
        validator: Option<&Value>,
    ) -> ::anyhow::Result<()> {
        let mut state = self.state()?;

        *state
            .create_collection_calls
            .entry(name.to_string())
            .or_insert(0) += 1;

        if state.collections.contains_key(name) {
            ::anyhow::bail!(
                "Error code 48 (NamespaceExists): Collection {} already exists.",
                name
            );
        }

        if self.restricted && validator.is_some() {
            ::anyhow::bail!(
                "Error code 115 (CommandNotSupported): validator not supported"
            );
        }

        if let Some(message) = self.collection_failures.get(name) {
            ::anyhow::bail!("{}", message);
        }

        state
            .collections
            .insert(name.to_string(), StoredCollection::new(validator.cloned()));

        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        index: &IndexSpec,
    ) -> ::anyhow::Result<String> {
        if let Some(message) = self
            .index_failures
            .get(&(collection.to_string(), index.name().to_string()))
        {
            ::anyhow::bail!("{}", message);
        }

        let requested = StoredIndex::from_spec(index);
        let mut state = self.state()?;
        let stored = state.collection_or_create(collection);

        if let Some(existing) =
            stored.indexes.iter().find(|i| i.name == requested.name)
        {
            if *existing == requested {
                return Ok(requested.name);
            }
            ::anyhow::bail!(
                "Error code 85 (IndexOptionsConflict): Index with name: {} \
                 already exists with different options",
                requested.name
            );
        }

        if let Some(existing) =
            stored.indexes.iter().find(|i| i.keys == requested.keys)
        {
            ::anyhow::bail!(
                "Error code 85 (IndexOptionsConflict): Index already exists \
                 with a different name: {}",
                existing.name
            );
        }

        if requested.unique && stored.has_duplicates_under(&requested) {
            ::anyhow::bail!(
                "Error code 11000 (DuplicateKey): E11000 duplicate key error \
                 collection: {} index: {}",
                collection,
                requested.name
            );
        }

        let name = requested.name.clone();
        stored.indexes.push(requested);

        Ok(name)
    }

    async fn list_index_names(
        &self,
        collection: &str,
    ) -> ::anyhow::Result<Vec<String>> {
        if let Some(message) = self.list_index_failures.get(collection) {
            ::anyhow::bail!("{}", message);
        }

        match self.state()?.collections.get(collection) {
            Some(stored) => Ok(stored
                .indexes
                .iter()
                .map(|index| index.name.clone())
                .collect()),
            None => ::anyhow::bail!(
                "Error code 26 (NamespaceNotFound): ns does not exist: {}",
                collection
            ),
        }
    }

    async fn upsert_on_insert(
        &self,
        collection: &str,
        key_field: &str,
        document: &Map<String, Value>,
    ) -> ::anyhow::Result<()> {
        let key = key_value(document, key_field)?;

        if let Some(message) =
            key.as_str().and_then(|key| self.upsert_failures.get(key))
        {
            ::anyhow::bail!("{}", message);
        }

        let mut state = self.state()?;
        let stored = state.collection_or_create(collection);

        if stored
            .documents
            .iter()
            .any(|existing| lookup(existing, key_field) == Some(key))
        {
            return Ok(());
        }

        if let Some(index) = stored
            .indexes
            .iter()
            .filter(|index| index.unique && index.name != ID_INDEX)
            .find(|index| stored.duplicate_under(index, document))
        {
            ::anyhow::bail!(
                "Error code 11000 (DuplicateKey): E11000 duplicate key error \
                 collection: {} index: {}",
                collection,
                index.name
            );
        }

        stored.documents.push(document.clone());

        Ok(())
    }

    async fn count_by_keys(
        &self,
        collection: &str,
        key_field: &str,
        keys: &[String],
    ) -> ::anyhow::Result<u64> {
        let state = self.state()?;

        let count = state
            .collections
            .get(collection)
            .map(|stored| {
                stored
                    .documents
                    .iter()
                    .filter_map(|document| lookup(document, key_field))
                    .filter_map(Value::as_str)
                    .filter(|value| keys.iter().any(|key| key.as_str() == *value))
                    .count()
            })
            .unwrap_or(0);

        Ok(u64::try_from(count)?)
    }
}
