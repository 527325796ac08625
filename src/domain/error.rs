// ============================================================
// Layer 3 — Configuration Errors
// ============================================================
// Raised when the fold splitter or the hyperparameter grid is
// asked to do something that cannot produce a meaningful result.
// These are fatal for the call that raised them and never retried.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("k-fold needs at least 2 folds, got {k}")]
    InvalidFoldCount { k: usize },

    #[error("cannot split an empty instance collection")]
    EmptyCollection,

    #[error("instance {index} has no group key")]
    MissingGroupKey { index: usize },

    #[error("hyperparameter '{name}' is declared more than once")]
    DuplicateParameter { name: String },

    #[error("hyperparameter '{name}' cannot be applied: {reason}")]
    InvalidParameter { name: String, reason: String },
}
