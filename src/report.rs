use crate::backend::Backend;
use crate::provision::CollectionHandle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSummary {
    pub collection: String,
    /// Index names, or the error that prevented listing them.
    pub indexes: Result<Vec<String>, String>,
}

/// Lists the indexes of every handle. A listing error is logged and recorded
/// for that collection only.
pub async fn report(
    backend: &dyn Backend,
    handles: &[CollectionHandle],
) -> Vec<IndexSummary> {
    let mut summaries = Vec::with_capacity(handles.len());

    for handle in handles {
        let indexes = match backend.list_index_names(handle.name()).await {
            Ok(names) => {
                ::log::info!(
                    "  -> indexes[{}]: {}",
                    handle.name(),
                    names.join(", ")
                );
                Ok(names)
            }
            Err(err) => {
                ::log::warn!(
                    "  -> indexes[{}]: unavailable: {:#}",
                    handle.name(),
                    err
                );
                Err(format!("{:#}", err))
            }
        };

        summaries.push(IndexSummary {
            collection: handle.name().to_string(),
            indexes,
        });
    }

    summaries
}
