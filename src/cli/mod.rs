// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with `clap` and hands each command to its
// Layer 2 use case. Final results are printed here; progress
// goes through `tracing`.
//
//   1. `search`: grid search, reports the best configuration
//   2. `train` : trains and checkpoints the final model
//   3. `score` : predicts quality for a pair or a whole file
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;

use crate::application::{
    score_use_case::ScoreUseCase,
    search_use_case::{default_grid, SearchUseCase},
    train_use_case::TrainUseCase,
};
use crate::data::grid::ParamGrid;
use commands::{Commands, ScoreArgs, SearchArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "ruse-cv",
    version = "0.1.0",
    about = "Train a RUSE-style MT quality regressor with stratified k-fold grid search."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Search(args) => run_search(args),
            Commands::Train(args)  => run_train(args),
            Commands::Score(args)  => run_score(args),
        }
    }
}

fn run_search(args: SearchArgs) -> Result<()> {
    let grid = match &args.grid {
        Some(path) => load_grid(path)?,
        None       => default_grid()?,
    };
    let device = args.base.device;

    tracing::info!(
        "Searching {} configuration(s) of [{}] on {}",
        grid.len(),
        grid.names().collect::<Vec<_>>().join(", "),
        args.base.dataset
    );
    let report = SearchUseCase::new(args.base.into(), grid, device).execute()?;

    for result in &report.results {
        println!("{:<40} mean loss {:.4}", result.params.to_string(), result.mean_loss);
    }
    match report.best() {
        Some(best) => println!("\nBest configuration: {} (mean loss {:.4})", best.params, best.mean_loss),
        None       => println!("\nNo configurations were evaluated; there is no best configuration."),
    }
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    let device = args.device;
    tracing::info!("Training on {} with the {} backend", args.dataset, device);

    let summary = TrainUseCase::new(args.into(), device).execute()?;
    println!(
        "Training complete: {} epoch(s), best val_loss {:.4} at epoch {} ({} train / {} holdout).",
        summary.epochs_run,
        summary.best_val_loss,
        summary.best_epoch,
        summary.train_size,
        summary.holdout_size,
    );
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<()> {
    let use_case = ScoreUseCase::new(&args.run_dir, args.device)?;

    match (&args.mt, &args.reference, &args.input) {
        (Some(mt), Some(reference), None) => {
            let score = use_case.score_pair(mt, reference)?;
            println!("{score:.6}");
        }
        (None, None, Some(input)) => {
            let summary = use_case.evaluate_file(input)?;
            println!(
                "{} pairs: pearson {:.4}, covariance {:.4}, mse {:.4}",
                summary.count, summary.pearson, summary.covariance, summary.mse
            );
        }
        _ => bail!("give either --mt with --reference, or --input"),
    }
    Ok(())
}

fn load_grid(path: &str) -> Result<ParamGrid<serde_json::Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read grid file '{path}'"))?;
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Grid file '{path}' is not valid JSON"))?;
    Ok(ParamGrid::from_json(&json)?)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_grid_keeps_declared_order() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.json");
        fs::write(&path, r#"{"lr": [0.01, 0.001], "batch_size": [64]}"#).unwrap();

        let grid = load_grid(path.to_str().unwrap()).unwrap();
        assert_eq!(grid.names().collect::<Vec<_>>(), vec!["lr", "batch_size"]);
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_load_grid_rejects_non_arrays() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.json");
        fs::write(&path, r#"{"lr": 0.01}"#).unwrap();
        assert!(load_grid(path.to_str().unwrap()).is_err());
    }
}
