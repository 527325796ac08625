// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence and bookkeeping shared by several use cases:
//
//   checkpoint.rs     : Model weights (CompactRecorder) and the
//                        JSON side files of a run directory
//
//   tokenizer_store.rs: Word-level vocabulary built from the
//                        training instances, saved as tokenizer.json
//
//   metrics.rs        : Pearson/covariance helpers and the
//                        per-epoch metrics.csv logger
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod tokenizer_store;

/// Metric functions and CSV logger
pub mod metrics;
