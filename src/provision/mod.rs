use crate::capability::Diagnosis;

pub mod collection;
pub mod index;

pub use collection::ensure_collection;
pub use index::ensure_index;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionOutcome {
    CreatedWithValidator,
    /// Created, but writes to it are not type checked.
    CreatedWithoutValidator,
    AlreadyExisted,
    Failed(String),
}

impl CollectionOutcome {
    pub fn is_usable(&self) -> bool {
        !matches!(self, CollectionOutcome::Failed(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Created, or already present with the same definition.
    Ensured(String),
    /// The owning collection could not be provisioned.
    Skipped,
    Failed {
        diagnosis: Diagnosis,
        message: String,
    },
}

/// A provisioned (or attempted) collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionHandle {
    name: String,
    outcome: CollectionOutcome,
}

impl CollectionHandle {
    pub fn new(name: &str, outcome: CollectionOutcome) -> Self {
        Self {
            name: name.to_string(),
            outcome,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outcome(&self) -> &CollectionOutcome {
        &self.outcome
    }
}
