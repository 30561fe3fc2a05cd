use ::serde_json::{Map, Value};

use crate::catalog::IndexSpec;
use crate::config::{BackendKind, Config};

pub mod memory;
pub mod mongo;

/// The collection and index operations provisioning needs from a database.
///
/// Calls are issued one at a time; implementations don't need to coordinate
/// concurrent use from a single run.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn list_collection_names(&self) -> ::anyhow::Result<Vec<String>>;

    /// `validator` is a complete validator document such as
    /// `{ "$jsonSchema": ... }`.
    async fn create_collection(
        &self,
        name: &str,
        validator: Option<&Value>,
    ) -> ::anyhow::Result<()>;

    /// Returns the name of the index as reported by the backend.
    async fn create_index(
        &self,
        collection: &str,
        index: &IndexSpec,
    ) -> ::anyhow::Result<String>;

    async fn list_index_names(
        &self,
        collection: &str,
    ) -> ::anyhow::Result<Vec<String>>;

    /// Inserts `document` unless a document with the same `key_field` value
    /// exists. Existing documents are never modified.
    async fn upsert_on_insert(
        &self,
        collection: &str,
        key_field: &str,
        document: &Map<String, Value>,
    ) -> ::anyhow::Result<()>;

    async fn count_by_keys(
        &self,
        collection: &str,
        key_field: &str,
        keys: &[String],
    ) -> ::anyhow::Result<u64>;
}

pub async fn make_backend(config: &Config) -> ::anyhow::Result<Box<dyn Backend>> {
    match config.backend {
        BackendKind::MongoDb => {
            ::log::info!(
                "Connecting to {}",
                crate::config::redacted_uri(&config.mongo_uri)
            );

            let backend = mongo::MongoBackend::connect(
                &config.mongo_uri,
                &config.db_name,
                config.connect_timeout(),
            )
            .await?;

            Ok(Box::new(backend))
        }
        BackendKind::Memory => {
            ::log::info!("Using in-memory backend, nothing will be persisted");
            Ok(Box::new(memory::MemoryBackend::new()))
        }
    }
}

/// Reads the natural key out of a seed document.
pub(crate) fn key_value<'a>(
    document: &'a Map<String, Value>,
    key_field: &str,
) -> ::anyhow::Result<&'a Value> {
    match document.get(key_field) {
        Some(Value::Null) | None => {
            ::anyhow::bail!("document has no value for key field {}", key_field)
        }
        Some(value) => Ok(value),
    }
}
