//! Backend diagnostics classification.
//!
//! Managed emulations of the engine do not advertise which commands they
//! implement, so capability gaps are recognized from the text of the error
//! they return. The matching rules live here and nowhere else.

use ::regex::RegexSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Diagnosis {
    /// The backend does not implement the requested feature.
    UnsupportedFeature,
    /// The object already exists, possibly with a different definition.
    Conflict,
    Other,
}

pub const UNSUPPORTED_SIGNATURES: &[&str] = &[
    r"validator not supported",
    r"not implemented",
    r"not supported",
];

pub const CONFLICT_SIGNATURES: &[&str] = &[
    r"already exists",
    r"NamespaceExists",
    r"IndexOptionsConflict",
    r"IndexKeySpecsConflict",
];

pub struct SignatureClassifier {
    unsupported: RegexSet,
    conflict: RegexSet,
}

impl SignatureClassifier {
    pub fn new(
        unsupported: &[&str],
        conflict: &[&str],
    ) -> ::anyhow::Result<Self> {
        Ok(Self {
            unsupported: case_insensitive(unsupported)?,
            conflict: case_insensitive(conflict)?,
        })
    }

    /// Signatures for the engine and its managed emulations.
    pub fn mongodb() -> ::anyhow::Result<Self> {
        Self::new(UNSUPPORTED_SIGNATURES, CONFLICT_SIGNATURES)
    }

    /// Unsupported wins over conflict when both match.
    pub fn classify(&self, diagnostic: &str) -> Diagnosis {
        if self.unsupported.is_match(diagnostic) {
            Diagnosis::UnsupportedFeature
        } else if self.conflict.is_match(diagnostic) {
            Diagnosis::Conflict
        } else {
            Diagnosis::Other
        }
    }

    pub fn classify_error(&self, error: &::anyhow::Error) -> Diagnosis {
        self.classify(&format!("{:#}", error))
    }
}

fn case_insensitive(patterns: &[&str]) -> ::anyhow::Result<RegexSet> {
    Ok(RegexSet::new(
        patterns.iter().map(|pattern| format!("(?i){}", pattern)),
    )?)
}
