use crate::backend::Backend;
use crate::capability::{Diagnosis, SignatureClassifier};
use crate::catalog::IndexSpec;
use crate::provision::{CollectionHandle, IndexOutcome};

/// Requests `index` on the handle's collection.
///
/// Re-requesting an identical index is a no-op on the backend. A failure is
/// logged and returned as an outcome so later indexes are still attempted.
pub async fn ensure_index(
    backend: &dyn Backend,
    classifier: &SignatureClassifier,
    handle: &CollectionHandle,
    index: &IndexSpec,
) -> IndexOutcome {
    if !handle.outcome().is_usable() {
        ::log::warn!(
            "  idx {} {} skipped, collection unavailable",
            handle.name(),
            index.name()
        );
        return IndexOutcome::Skipped;
    }

    match backend.create_index(handle.name(), index).await {
        Ok(name) => {
            ::log::info!("  idx {}: {}", handle.name(), name);
            IndexOutcome::Ensured(name)
        }
        Err(err) => {
            let diagnosis = classifier.classify_error(&err);

            if diagnosis == Diagnosis::Conflict {
                ::log::warn!(
                    "  idx {} {} conflicts with an existing definition \
                     (ignored): {:#}",
                    handle.name(),
                    index.name(),
                    err
                );
            } else {
                ::log::warn!(
                    "  idx {} {} keys={:?} ERROR (ignored): {:#}",
                    handle.name(),
                    index.name(),
                    index.key_paths(),
                    err
                );
            }

            IndexOutcome::Failed {
                diagnosis,
                message: format!("{:#}", err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::provision::CollectionOutcome;

    fn handle(name: &str) -> CollectionHandle {
        CollectionHandle::new(name, CollectionOutcome::AlreadyExisted)
    }

    #[::tokio::test]
    async fn test_ensure_twice_is_a_noop() -> ::anyhow::Result<()> {
        let backend = MemoryBackend::new();
        let classifier = SignatureClassifier::mongodb()?;
        backend.create_collection("tokens", None).await?;
        let ttl = IndexSpec::new("tokens", "ttl_by_expires")
            .asc("expires_at")
            .expire_after_seconds(0);

        let first =
            ensure_index(&backend, &classifier, &handle("tokens"), &ttl).await;
        let second =
            ensure_index(&backend, &classifier, &handle("tokens"), &ttl).await;

        assert_eq!(first, IndexOutcome::Ensured("ttl_by_expires".to_string()));
        assert_eq!(first, second);
        assert_eq!(
            backend.list_index_names("tokens").await?,
            vec!["_id_", "ttl_by_expires"]
        );
        assert_eq!(
            backend
                .index("tokens", "ttl_by_expires")?
                .and_then(|index| index.expire_after_seconds),
            Some(0)
        );

        Ok(())
    }

    #[::tokio::test]
    async fn test_conflict_is_classified() -> ::anyhow::Result<()> {
        let backend = MemoryBackend::new();
        let classifier = SignatureClassifier::mongodb()?;
        backend
            .create_index("users", &IndexSpec::new("users", "email_1").asc("email"))
            .await?;

        let changed = IndexSpec::new("users", "email_1").asc("email").unique();
        let outcome =
            ensure_index(&backend, &classifier, &handle("users"), &changed).await;

        match outcome {
            IndexOutcome::Failed { diagnosis, message } => {
                assert_eq!(diagnosis, Diagnosis::Conflict);
                assert!(message.contains("email_1"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        Ok(())
    }

    #[::tokio::test]
    async fn test_failure_is_isolated() -> ::anyhow::Result<()> {
        let backend =
            MemoryBackend::new().fail_index("likes", "likes_by_post", "boom");
        let classifier = SignatureClassifier::mongodb()?;
        backend.create_collection("likes", None).await?;

        let failing = IndexSpec::new("likes", "likes_by_post").asc("post_id");
        let next = IndexSpec::new("likes", "likes_by_user").asc("user_id");

        let first =
            ensure_index(&backend, &classifier, &handle("likes"), &failing).await;
        let second =
            ensure_index(&backend, &classifier, &handle("likes"), &next).await;

        assert_eq!(
            first,
            IndexOutcome::Failed {
                diagnosis: Diagnosis::Other,
                message: "boom".to_string(),
            }
        );
        assert_eq!(second, IndexOutcome::Ensured("likes_by_user".to_string()));

        Ok(())
    }

    #[::tokio::test]
    async fn test_failed_collection_is_skipped() -> ::anyhow::Result<()> {
        let backend = MemoryBackend::new();
        let classifier = SignatureClassifier::mongodb()?;
        let failed = CollectionHandle::new(
            "likes",
            CollectionOutcome::Failed("boom".to_string()),
        );

        let outcome = ensure_index(
            &backend,
            &classifier,
            &failed,
            &IndexSpec::new("likes", "likes_by_post").asc("post_id"),
        )
        .await;

        assert_eq!(outcome, IndexOutcome::Skipped);
        assert!(backend.collection_names()?.is_empty());

        Ok(())
    }
}
