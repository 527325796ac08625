// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these traits, so the
// search driver can be exercised with a fake trainer in tests
// and the dataset reader can be swapped for another format.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::config::TrainConfig;
use crate::domain::instance::WmtInstance;

// ─── InstanceSource ───────────────────────────────────────────────────────────
/// Any component that can produce the full, ordered instance collection.
///
/// Implementations:
///   - WmtTsvReader → reads the tab-separated WMT dataset file
pub trait InstanceSource {
    fn read_all(&self) -> Result<Vec<WmtInstance>>;
}

// ─── FoldTrainer ──────────────────────────────────────────────────────────────
/// Everything a trainer needs for one fold of one grid configuration.
pub struct FoldJob<'a> {
    pub config:     &'a TrainConfig,
    /// Human-readable name of the grid point, used in logs and metrics
    pub label:      &'a str,
    pub fold:       usize,
    pub train:      &'a [&'a WmtInstance],
    pub validation: &'a [&'a WmtInstance],
}

/// Trains one fresh model on a fold's training instances and reports
/// the validation loss that model selection should use.
///
/// Implementations:
///   - BurnFoldTrainer → the RUSE regressor trained with Burn
pub trait FoldTrainer {
    fn train_fold(&mut self, job: FoldJob<'_>) -> Result<f64>;
}

// ─── QualityScorer ────────────────────────────────────────────────────────────
/// Any component that can predict a quality score for an MT sentence.
///
/// Implementations:
///   - Inferencer → a trained RUSE checkpoint
pub trait QualityScorer {
    fn score(&self, mt: &str, reference: &str) -> Result<f64>;

    /// Score many pairs, in input order.
    fn score_many(&self, pairs: &[(&str, &str)]) -> Result<Vec<f64>> {
        pairs.iter().map(|(mt, reference)| self.score(mt, reference)).collect()
    }
}
