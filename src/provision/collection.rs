use ::serde_json::Value;

use crate::backend::Backend;
use crate::capability::{Diagnosis, SignatureClassifier};
use crate::catalog::CollectionSpec;
use crate::provision::{CollectionHandle, CollectionOutcome};

/// Creates `spec` unless a collection with that name exists.
///
/// A validator the backend cannot enforce is dropped after one rejection
/// and the collection is created without it. Existing collections are left
/// untouched, whatever validator they carry. Failures are logged and
/// reported in the handle's outcome, never returned.
pub async fn ensure_collection(
    backend: &dyn Backend,
    classifier: &SignatureClassifier,
    spec: &CollectionSpec,
) -> CollectionHandle {
    match backend.list_collection_names().await {
        Ok(names) if names.iter().any(|name| name == spec.name) => {
            ::log::info!("- {} exists", spec.name);
            return CollectionHandle::new(
                spec.name,
                CollectionOutcome::AlreadyExisted,
            );
        }
        Ok(_) => {}
        Err(err) => {
            ::log::warn!(
                "- listing collections failed, creating {} anyway: {:#}",
                spec.name,
                err
            );
        }
    }

    let validator = spec
        .validation
        .as_ref()
        .map(|schema| schema.to_validator());

    let outcome = create(backend, classifier, spec.name, validator).await;

    CollectionHandle::new(spec.name, outcome)
}

async fn create(
    backend: &dyn Backend,
    classifier: &SignatureClassifier,
    name: &str,
    validator: Option<Value>,
) -> CollectionOutcome {
    let err = match backend.create_collection(name, validator.as_ref()).await {
        Ok(()) if validator.is_some() => {
            ::log::info!("- created {} (with validator)", name);
            return CollectionOutcome::CreatedWithValidator;
        }
        Ok(()) => {
            ::log::info!("- created {}", name);
            return CollectionOutcome::CreatedWithoutValidator;
        }
        Err(err) => err,
    };

    match classifier.classify_error(&err) {
        Diagnosis::UnsupportedFeature if validator.is_some() => {
            ::log::warn!(
                "- {} rejected its validator ({:#}), retrying without",
                name,
                err
            );
            create_without_validator(backend, classifier, name).await
        }
        Diagnosis::Conflict => {
            ::log::info!("- {} exists (created concurrently)", name);
            CollectionOutcome::AlreadyExisted
        }
        _ => {
            ::log::error!("- create {} failed (ignored): {:#}", name, err);
            CollectionOutcome::Failed(format!("{:#}", err))
        }
    }
}

async fn create_without_validator(
    backend: &dyn Backend,
    classifier: &SignatureClassifier,
    name: &str,
) -> CollectionOutcome {
    match backend.create_collection(name, None).await {
        Ok(()) => {
            ::log::warn!(
                "- created {} (no validator, writes will not be type checked)",
                name
            );
            CollectionOutcome::CreatedWithoutValidator
        }
        Err(err) if classifier.classify_error(&err) == Diagnosis::Conflict => {
            ::log::info!("- {} exists (created concurrently)", name);
            CollectionOutcome::AlreadyExisted
        }
        Err(err) => {
            ::log::error!(
                "- create {} failed (even without validator): {:#}",
                name,
                err
            );
            CollectionOutcome::Failed(format!("{:#}", err))
        }
    }
}
