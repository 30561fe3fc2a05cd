use ::mongodb::bson::{doc, Bson, Document};
use ::mongodb::options::{
    CreateCollectionOptions, IndexOptions, UpdateOptions,
};
use ::mongodb::IndexModel;
use ::serde_json::{Map, Value};

use crate::backend::{key_value, Backend};
use crate::catalog::{IndexSpec, KeyDirection};

pub struct MongoBackend {
    database: ::mongodb::Database,
}

impl MongoBackend {
    pub fn new(database: ::mongodb::Database) -> Self {
        Self { database }
    }

    /// Connects and waits until the server answers `ping`, retrying with
    /// exponential backoff for at most `timeout`.
    pub async fn connect(
        uri: &str,
        database: &str,
        timeout: ::std::time::Duration,
    ) -> ::anyhow::Result<Self> {
        let client = ::mongodb::Client::with_uri_str(uri).await?;
        let database = client.database(database);

        let backoff = ::backoff::ExponentialBackoff {
            max_elapsed_time: Some(timeout),
            ..Default::default()
        };

        let op = || {
            let database = database.clone();
            async move {
                database
                    .run_command(doc! { "ping": 1 }, None)
                    .await
                    .map_err(|err| {
                        ::log::warn!("database not reachable yet: {}", err);
                        ::backoff::Error::transient(err)
                    })
            }
        };

        ::backoff::future::retry(backoff, op).await?;

        ::log::info!("Connected to database {}", database.name());

        Ok(Self::new(database))
    }

    fn collection(&self, name: &str) -> ::mongodb::Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

fn to_document(value: &Value) -> ::anyhow::Result<Document> {
    Ok(::mongodb::bson::to_document(value)?)
}

/// Key specification in declaration order.
fn index_keys(index: &IndexSpec) -> Document {
    let mut keys = Document::new();

    for (path, direction) in index.keys.iter() {
        let value = match direction {
            KeyDirection::Ascending => Bson::Int32(1),
            KeyDirection::Descending => Bson::Int32(-1),
            KeyDirection::Directive(kind) => Bson::String(kind.to_string()),
        };
        keys.insert(*path, value);
    }

    keys
}

fn index_model(index: &IndexSpec) -> IndexModel {
    let mut options = IndexOptions::default();
    options.name = Some(index.name().to_string());

    if index.options.unique {
        options.unique = Some(true);
    }
    if index.options.sparse {
        options.sparse = Some(true);
    }
    if let Some(seconds) = index.options.expire_after_seconds {
        options.expire_after = Some(::std::time::Duration::from_secs(seconds));
    }

    let mut model = IndexModel::default();
    model.keys = index_keys(index);
    model.options = Some(options);
    model
}

#[async_trait::async_trait]
impl Backend for MongoBackend {
    async fn list_collection_names(&self) -> ::anyhow::Result<Vec<String>> {
        Ok(self.database.list_collection_names(None).await?)
    }

    async fn create_collection(
        &self,
        name: &str,
        validator: Option<&Value>,
    ) -> ::anyhow::Result<()> {
        let mut options = CreateCollectionOptions::default();

        if let Some(validator) = validator {
            options.validator = Some(to_document(validator)?);
        }

        self.database.create_collection(name, options).await?;

        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        index: &IndexSpec,
    ) -> ::anyhow::Result<String> {
        let result = self
            .collection(collection)
            .create_index(index_model(index), None)
            .await?;

        Ok(result.index_name)
    }

    async fn list_index_names(
        &self,
        collection: &str,
    ) -> ::anyhow::Result<Vec<String>> {
        Ok(self.collection(collection).list_index_names().await?)
    }

    async fn upsert_on_insert(
        &self,
        collection: &str,
        key_field: &str,
        document: &Map<String, Value>,
    ) -> ::anyhow::Result<()> {
        let key = key_value(document, key_field)?;

        let mut filter = Document::new();
        filter.insert(key_field, ::mongodb::bson::to_bson(key)?);

        let update = doc! {
            "$setOnInsert": to_document(&Value::Object(document.clone()))?,
        };

        let mut options = UpdateOptions::default();
        options.upsert = Some(true);

        self.collection(collection)
            .update_one(filter, update, options)
            .await?;

        Ok(())
    }

    async fn count_by_keys(
        &self,
        collection: &str,
        key_field: &str,
        keys: &[String],
    ) -> ::anyhow::Result<u64> {
        let mut filter = Document::new();
        filter.insert(key_field, doc! { "$in": keys.to_vec() });

        Ok(self.collection(collection).count_documents(filter, None).await?)
    }
}
