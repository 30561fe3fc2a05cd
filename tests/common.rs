#![allow(dead_code)]

use std::collections::BTreeMap;

use db_bootstrap::backend::memory::MemoryBackend;
use db_bootstrap::backend::Backend;
use db_bootstrap::bootstrap::{run, RunReport, Settings};
use db_bootstrap::capability::SignatureClassifier;
use db_bootstrap::catalog::Catalog;

/// Catalog, classifier and settings shared by the pipeline tests.
pub struct TestSetup {
    pub catalog: Catalog,
    pub classifier: SignatureClassifier,
    pub settings: Settings,
}

impl TestSetup {
    pub fn new(seed: bool) -> Self {
        Self {
            catalog: Catalog::turbodex(),
            classifier: SignatureClassifier::mongodb()
                .expect("Failed to build classifier"),
            settings: Settings {
                db_name: "turbodex_test".to_string(),
                seed,
            },
        }
    }

    pub async fn run(&self, backend: &dyn Backend) -> RunReport {
        run(backend, &self.classifier, &self.catalog, &self.settings).await
    }

    /// Declared index names per collection, plus the implicit `_id_`.
    pub fn expected_indexes(&self) -> BTreeMap<String, Vec<String>> {
        self.catalog
            .collections
            .iter()
            .map(|declaration| {
                let mut names = vec!["_id_".to_string()];
                names.extend(
                    declaration
                        .indexes
                        .iter()
                        .map(|index| index.name().to_string()),
                );
                (declaration.spec.name.to_string(), names)
            })
            .collect()
    }
}

/// Current collection -> index names state of the backend.
pub async fn snapshot(
    backend: &MemoryBackend,
) -> BTreeMap<String, Vec<String>> {
    let mut state = BTreeMap::new();

    for name in backend
        .list_collection_names()
        .await
        .expect("Failed to list collections")
    {
        let indexes = backend
            .list_index_names(&name)
            .await
            .expect("Failed to list indexes");
        state.insert(name, indexes);
    }

    state
}
