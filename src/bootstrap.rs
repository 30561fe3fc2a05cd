//! The provisioning pipeline: collections and their indexes in declared
//! order, then the optional seed, then the index summary.

use crate::backend::Backend;
use crate::capability::SignatureClassifier;
use crate::catalog::Catalog;
use crate::provision::{
    ensure_collection, ensure_index, CollectionHandle, CollectionOutcome,
    IndexOutcome,
};
use crate::report::{report, IndexSummary};
use crate::seed::{seed, SeedSummary};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub db_name: String,
    pub seed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_name: "turbodex".to_string(),
            seed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexRecord {
    pub collection: String,
    pub name: String,
    pub outcome: IndexOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub collections: Vec<CollectionHandle>,
    pub indexes: Vec<IndexRecord>,
    pub seed: Option<SeedSummary>,
    pub summary: Vec<IndexSummary>,
}

impl RunReport {
    pub fn collection(&self, name: &str) -> Option<&CollectionHandle> {
        self.collections.iter().find(|handle| handle.name() == name)
    }

    pub fn index(&self, collection: &str, name: &str) -> Option<&IndexOutcome> {
        self.indexes
            .iter()
            .find(|record| record.collection == collection && record.name == name)
            .map(|record| &record.outcome)
    }

    /// Collections that ended up without their validator or not at all.
    pub fn degraded_collections(&self) -> Vec<&str> {
        self.collections
            .iter()
            .filter(|handle| {
                matches!(
                    handle.outcome(),
                    CollectionOutcome::CreatedWithoutValidator
                        | CollectionOutcome::Failed(_)
                )
            })
            .map(CollectionHandle::name)
            .collect()
    }

    pub fn failed_indexes(&self) -> Vec<&IndexRecord> {
        self.indexes
            .iter()
            .filter(|record| !matches!(record.outcome, IndexOutcome::Ensured(_)))
            .collect()
    }

    /// True when every collection and index is in place as declared and
    /// every seed record went through.
    pub fn is_clean(&self) -> bool {
        self.collections.iter().all(|handle| {
            matches!(
                handle.outcome(),
                CollectionOutcome::CreatedWithValidator
                    | CollectionOutcome::AlreadyExisted
            )
        }) && self.failed_indexes().is_empty()
            && self.seed.as_ref().map_or(true, |summary| summary.failed == 0)
            && self.summary.iter().all(|summary| summary.indexes.is_ok())
    }
}

/// Runs the whole pipeline. Every failure is contained in the returned
/// report; this never aborts part way.
pub async fn run(
    backend: &dyn Backend,
    classifier: &SignatureClassifier,
    catalog: &Catalog,
    settings: &Settings,
) -> RunReport {
    ::log::info!("[bootstrap] DB={} SEED={}", settings.db_name, settings.seed);

    let mut result = RunReport::default();

    for declaration in catalog.collections.iter() {
        let handle =
            ensure_collection(backend, classifier, &declaration.spec).await;

        for index in declaration.indexes.iter() {
            let outcome = ensure_index(backend, classifier, &handle, index).await;

            result.indexes.push(IndexRecord {
                collection: handle.name().to_string(),
                name: index.name().to_string(),
                outcome,
            });
        }

        result.collections.push(handle);
    }

    if settings.seed {
        let target_usable = result
            .collection(catalog.seed.collection)
            .map_or(true, |handle| handle.outcome().is_usable());

        if target_usable {
            result.seed = Some(seed(backend, &catalog.seed).await);
        } else {
            ::log::warn!(
                "seed skipped, collection {} unavailable",
                catalog.seed.collection
            );
        }
    }

    result.summary = report(backend, &result.collections).await;

    ::log::info!("[bootstrap] done.");

    result
}
