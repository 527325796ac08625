// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case coordinates the lower layers for one command:
//
//   search_use_case: grid × stratified k-fold cross-validation
//   train_use_case : one final model with checkpoints
//   score_use_case : load a run directory and predict scores
//
// No tensor code and no printing here; results are returned to
// Layer 1, which decides how to show them.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

pub mod search_use_case;

pub mod train_use_case;

pub mod score_use_case;
