use serde_json::json;

use db_bootstrap::backend::memory::MemoryBackend;
use db_bootstrap::backend::Backend;
use db_bootstrap::capability::Diagnosis;
use db_bootstrap::catalog::KeyDirection;
use db_bootstrap::provision::{CollectionOutcome, IndexOutcome};

mod common;
use common::{snapshot, TestSetup};

#[tokio::test]
async fn test_empty_backend_with_seed() {
    let setup = TestSetup::new(true);
    let backend = MemoryBackend::new();

    let report = setup.run(&backend).await;

    assert!(report.is_clean());
    assert_eq!(snapshot(&backend).await, setup.expected_indexes());

    for handle in report.collections.iter() {
        assert_eq!(handle.outcome(), &CollectionOutcome::CreatedWithValidator);
        assert!(backend.validator(handle.name()).unwrap().is_some());
    }

    let mut seeded: Vec<(String, i64)> = backend
        .documents("achievements")
        .unwrap()
        .iter()
        .map(|document| {
            (
                document["key"].as_str().unwrap().to_string(),
                document["points"].as_i64().unwrap(),
            )
        })
        .collect();
    seeded.sort();

    assert_eq!(
        seeded,
        vec![
            ("first_like".to_string(), 2),
            ("first_post".to_string(), 10),
            ("rare_spot".to_string(), 100),
            ("ten_posts".to_string(), 50),
        ]
    );

    let seed = report.seed.unwrap();
    assert_eq!(seed.present, Some(4));
    assert_eq!(seed.failed, 0);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let setup = TestSetup::new(true);
    let backend = MemoryBackend::new();

    setup.run(&backend).await;
    let first = snapshot(&backend).await;
    let first_documents = backend.documents("achievements").unwrap();

    let report = setup.run(&backend).await;

    assert!(report.is_clean());
    assert_eq!(snapshot(&backend).await, first);
    assert_eq!(backend.documents("achievements").unwrap(), first_documents);

    for handle in report.collections.iter() {
        assert_eq!(handle.outcome(), &CollectionOutcome::AlreadyExisted);
        assert_eq!(backend.create_collection_calls(handle.name()).unwrap(), 1);
    }
    assert!(report.failed_indexes().is_empty());
    assert_eq!(report.seed.unwrap().present, Some(4));
}

#[tokio::test]
async fn test_restricted_backend_drops_validators() {
    let setup = TestSetup::new(false);
    let backend = MemoryBackend::new().restricted();

    let report = setup.run(&backend).await;

    assert_eq!(snapshot(&backend).await, setup.expected_indexes());
    assert_eq!(report.degraded_collections().len(), 10);
    assert!(!report.is_clean());

    for handle in report.collections.iter() {
        assert_eq!(
            handle.outcome(),
            &CollectionOutcome::CreatedWithoutValidator
        );
        assert_eq!(backend.validator(handle.name()).unwrap(), None);
    }
    assert!(report.failed_indexes().is_empty());
}

#[tokio::test]
async fn test_rejected_collection_does_not_block_others() {
    let setup = TestSetup::new(true);
    let backend = MemoryBackend::new()
        .fail_collection("likes", "Error code 13 (Unauthorized): not authorized");

    let report = setup.run(&backend).await;

    let collections = backend.collection_names().unwrap();
    assert!(!collections.contains(&"likes".to_string()));
    assert_eq!(collections.len(), 9);

    assert!(matches!(
        report.collection("likes").unwrap().outcome(),
        CollectionOutcome::Failed(_)
    ));
    assert_eq!(
        report.collection("follows").unwrap().outcome(),
        &CollectionOutcome::CreatedWithValidator
    );
    assert_eq!(
        report.index("likes", "user_post_unique"),
        Some(&IndexOutcome::Skipped)
    );

    let likes_summary = report
        .summary
        .iter()
        .find(|summary| summary.collection == "likes")
        .unwrap();
    assert!(likes_summary.indexes.is_err());

    assert_eq!(report.seed.unwrap().present, Some(4));
}

#[tokio::test]
async fn test_index_failure_is_isolated() {
    let setup = TestSetup::new(false);
    let backend = MemoryBackend::new()
        .fail_index("users", "username_ci_1", "boom")
        .fail_index("tokens", "ttl_by_expires", "boom");

    let report = setup.run(&backend).await;

    let users = backend.list_index_names("users").await.unwrap();
    assert_eq!(users, vec!["_id_", "email_1", "points_desc"]);

    let tokens = backend.list_index_names("tokens").await.unwrap();
    assert_eq!(tokens, vec!["_id_", "token_hash_1", "token_user_1"]);

    assert_eq!(report.failed_indexes().len(), 2);
    assert_eq!(
        report.index("posts", "post_feed_idx"),
        Some(&IndexOutcome::Ensured("post_feed_idx".to_string()))
    );
}

#[tokio::test]
async fn test_conflicting_existing_index_is_reported() {
    let setup = TestSetup::new(false);
    let backend = MemoryBackend::new();
    backend
        .create_index(
            "users",
            &db_bootstrap::catalog::IndexSpec::new("users", "email_1")
                .asc("email")
                .unique(),
        )
        .await
        .unwrap();

    let report = setup.run(&backend).await;

    match report.index("users", "email_1") {
        Some(IndexOutcome::Failed { diagnosis, .. }) => {
            assert_eq!(*diagnosis, Diagnosis::Conflict)
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        report.index("users", "points_desc"),
        Some(&IndexOutcome::Ensured("points_desc".to_string()))
    );
}

#[tokio::test]
async fn test_uniqueness_and_ttl_requested_as_declared() {
    let setup = TestSetup::new(false);
    let backend = MemoryBackend::new();

    setup.run(&backend).await;

    let likes = backend.index("likes", "user_post_unique").unwrap().unwrap();
    assert!(likes.unique);
    assert_eq!(
        likes.keys,
        vec![
            ("user_id".to_string(), KeyDirection::Ascending),
            ("post_id".to_string(), KeyDirection::Ascending),
        ]
    );

    let token_hash = backend.index("tokens", "token_hash_1").unwrap().unwrap();
    assert!(token_hash.unique);

    let ttl = backend.index("tokens", "ttl_by_expires").unwrap().unwrap();
    assert_eq!(ttl.expire_after_seconds, Some(0));
    assert_eq!(
        ttl.keys,
        vec![("expires_at".to_string(), KeyDirection::Ascending)]
    );
    assert!(!ttl.unique);
}

#[tokio::test]
async fn test_existing_seed_values_survive() {
    let setup = TestSetup::new(true);
    let backend = MemoryBackend::new();
    let existing = match json!({ "key": "ten_posts", "title": "Ten!", "points": 75 }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    backend
        .upsert_on_insert("achievements", "key", &existing)
        .await
        .unwrap();

    let report = setup.run(&backend).await;

    // created implicitly by the write, so no validator was applied
    assert_eq!(
        report.collection("achievements").unwrap().outcome(),
        &CollectionOutcome::AlreadyExisted
    );

    let documents = backend.documents("achievements").unwrap();
    assert_eq!(documents.len(), 4);
    let ten_posts = documents
        .iter()
        .find(|document| document["key"] == json!("ten_posts"))
        .unwrap();
    assert_eq!(ten_posts["points"], json!(75));
    assert_eq!(ten_posts["title"], json!("Ten!"));
}
