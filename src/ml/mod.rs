// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model, training and inference code built on Burn.
//
//   model.rs     : RUSE regressor
//                   • Token embeddings
//                   • Stacked LSTM sentence encoder
//                   • Masked mean pooling
//                   • [u, v, u*v, |u-v|] features
//                   • Two-layer tanh MLP → one score
//
//   trainer.rs   : Per-fold training loop
//                   Adam, early stopping on validation loss,
//                   Pearson/covariance per epoch, optional
//                   checkpointing
//
//   inferencer.rs: Loads a checkpoint and scores MT/reference pairs
//
//   backend.rs   : Backend aliases and device selection
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Shimanaka et al. (2018) RUSE

/// RUSE regression model architecture
pub mod model;

/// Training loop with validation and early stopping
pub mod trainer;

/// Inference engine: loads a checkpoint and predicts scores
pub mod inferencer;

/// Backend type aliases and device selection
pub mod backend;
