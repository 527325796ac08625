// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From a WMT TSV file to tensor batches, plus the two pieces
// that decide what gets trained on what:
//
//   WMT .tsv file
//       │
//       ▼
//   WmtTsvReader      → one WmtInstance per line
//       │
//       ▼
//   StratifiedKFold   → k (train, validation) folds, grouped by origin
//       │
//       ▼
//   RuseSample        → token ids via the word-level tokenizer
//       │
//       ▼
//   RuseDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   RuseBatcher       → pads and stacks samples into tensors
//
// ParamGrid sits beside the pipeline: it enumerates the
// hyperparameter configurations each fold set is trained under.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads WMT instances from tab-separated files
pub mod loader;

/// Group-aware k-fold splitting
pub mod kfold;

/// Cartesian product over hyperparameter candidates
pub mod grid;

/// Encoded samples and Burn's Dataset implementation
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
