// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, traits and errors that define the core
// concepts of the system:
//
//   instance.rs: one labelled MT/reference pair with its origin
//   config.rs  : TrainConfig, the hyperparameters of one run
//   error.rs   : configuration errors raised by the fold splitter
//                 and the hyperparameter grid
//   traits.rs  : seams the application layer programs against
//                 (where instances come from, how a fold is trained)
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A labelled sentence pair read from the WMT dataset
pub mod instance;

// Hyperparameters shared by every workflow
pub mod config;

// Typed configuration errors
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
