// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands:
//   search: grid search with stratified k-fold cross-validation
//   train : train one final model and checkpoint it
//   score : score MT/reference pairs with a trained run
//
// Every TrainConfig field is a --flag; `search` reuses the same
// flags as the base configuration the grid overrides.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::domain::config::{LossPolicy, TrainConfig};
use crate::ml::backend::DeviceKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cross-validate every configuration of a hyperparameter grid
    Search(SearchArgs),

    /// Train the final model on one stratified train/holdout split
    Train(TrainArgs),

    /// Predict quality scores with a trained run directory
    Score(ScoreArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// TSV file: mt \t reference \t score \t origin
    #[arg(long, default_value = "data/trg-en/combined")]
    pub dataset: String,

    /// Directory for the tokenizer, checkpoints and metrics
    #[arg(long, default_value = "runs")]
    pub run_dir: String,

    /// Number of folds; `train` holds out the first one
    #[arg(long, default_value_t = 10)]
    pub k: usize,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Shuffle each origin group (seeded) before slicing it into folds
    #[arg(long)]
    pub shuffle_folds: bool,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Upper bound; early stopping usually ends training sooner
    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Epochs without validation improvement before stopping (0 = never)
    #[arg(long, default_value_t = 10)]
    pub patience: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Maximum vocabulary size including [PAD] and [UNK]
    #[arg(long, default_value_t = 50_000)]
    pub vocab_size: usize,

    /// Sentences longer than this are truncated
    #[arg(long, default_value_t = 128)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 128)]
    pub embedding_dim: usize,

    /// LSTM hidden size
    #[arg(long, default_value_t = 64)]
    pub hidden_size: usize,

    /// Number of stacked LSTM layers
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 128)]
    pub mlp_dim: usize,

    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Validation loss a fold reports: `final` or `best`
    #[arg(long, default_value_t = LossPolicy::Final)]
    pub loss_policy: LossPolicy,

    /// Burn backend: `wgpu` or `cpu`
    #[arg(long, default_value_t = DeviceKind::Wgpu)]
    pub device: DeviceKind,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset:       a.dataset,
            run_dir:       a.run_dir,
            k:             a.k,
            seed:          a.seed,
            shuffle_folds: a.shuffle_folds,
            batch_size:    a.batch_size,
            epochs:        a.epochs,
            patience:      a.patience,
            lr:            a.lr,
            vocab_size:    a.vocab_size,
            max_seq_len:   a.max_seq_len,
            embedding_dim: a.embedding_dim,
            hidden_size:   a.hidden_size,
            num_layers:    a.num_layers,
            mlp_dim:       a.mlp_dim,
            dropout:       a.dropout,
            loss_policy:   a.loss_policy,
        }
    }
}

/// All arguments for the `search` command
#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub base: TrainArgs,

    /// JSON object mapping parameter name → array of candidates.
    /// Defaults to {"batch_size": [64, 128, 256, 512, 1024]}.
    #[arg(long)]
    pub grid: Option<String>,
}

/// All arguments for the `score` command
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Run directory written by `train`
    #[arg(long, default_value = "runs")]
    pub run_dir: String,

    /// MT sentence to score
    #[arg(long, requires = "reference", conflicts_with = "input")]
    pub mt: Option<String>,

    /// Reference translation for --mt
    #[arg(long, requires = "mt")]
    pub reference: Option<String>,

    /// TSV file to score and compare against its human scores
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, default_value_t = DeviceKind::Wgpu)]
    pub device: DeviceKind,
}
