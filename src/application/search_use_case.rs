// ============================================================
// Layer 2 — SearchUseCase (grid search × stratified k-fold)
// ============================================================
// Picks hyperparameters by cross-validation loss:
//
//   for each configuration in the grid:
//       split the dataset into k stratified folds (once)
//       for each fold:
//           train a fresh model on the other k − 1 folds
//           record its validation loss on this fold
//       cross-validation loss = mean of the k losses
//   best configuration = lowest cross-validation loss
//
// Training sits behind the FoldTrainer trait; tests drive the
// search with a fake trainer.

use anyhow::{ensure, Result};
use serde::Serialize;
use serde_json::Value;

use crate::domain::config::TrainConfig;
use crate::data::{
    grid::{GridPoint, ParamGrid},
    kfold::StratifiedKFold,
    loader::WmtTsvReader,
};
use crate::domain::{
    error::ConfigurationError,
    instance::{origin_of, WmtInstance},
    traits::{FoldJob, FoldTrainer, InstanceSource},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{mean, MetricsLogger},
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    backend::{CpuTrainBackend, DeviceKind, WgpuTrainBackend},
    trainer::BurnFoldTrainer,
};

/// Grid used when no grid file is given: batch size only.
pub fn default_grid() -> Result<ParamGrid<Value>, ConfigurationError> {
    ParamGrid::from_pairs([(
        "batch_size",
        [64, 128, 256, 512, 1024].into_iter().map(Value::from).collect(),
    )])
}

/// Cross-validation outcome of one grid configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResult {
    pub params:      GridPoint<Value>,
    pub fold_losses: Vec<f64>,
    pub mean_loss:   f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub results: Vec<ConfigResult>,
    /// Index into `results`; `None` when the grid was empty
    /// or no configuration produced a comparable loss.
    pub best:    Option<usize>,
}

impl SearchReport {
    pub fn best(&self) -> Option<&ConfigResult> {
        self.best.map(|i| &self.results[i])
    }
}

/// Evaluate every grid configuration with stratified k-fold CV.
pub fn run_search<T: FoldTrainer>(
    instances: &[WmtInstance],
    base:      &TrainConfig,
    grid:      &ParamGrid<Value>,
    trainer:   &mut T,
) -> Result<SearchReport> {
    tracing::info!("Grid search over {} configuration(s)", grid.len());
    if grid.is_empty() {
        tracing::warn!("A parameter has no candidates; nothing will be trained");
    }

    let mut results: Vec<ConfigResult> = Vec::new();
    let mut best: Option<(usize, f64)> = None;

    for point in grid {
        let config = base.with_overrides(point.iter())?;
        config.validate()?;
        let label = point.to_string();

        let mut splitter = StratifiedKFold::new(instances, config.k, origin_of)?;
        if config.shuffle_folds {
            splitter = splitter.with_shuffle(config.seed);
        }

        tracing::info!(
            "[{}] {}-fold cross-validation over {} origin group(s)",
            label,
            splitter.k(),
            splitter.group_count()
        );

        let mut fold_losses = Vec::with_capacity(config.k);
        for fold in &splitter {
            tracing::debug!(
                "[{}] fold {} validation per origin: {:?}",
                label,
                fold.index,
                splitter.group_counts(fold.index)
            );
            let loss = trainer.train_fold(FoldJob {
                config:     &config,
                label:      &label,
                fold:       fold.index,
                train:      &fold.train,
                validation: &fold.validation,
            })?;
            fold_losses.push(loss);
        }
        ensure!(
            fold_losses.len() == splitter.k(),
            "expected {} fold losses, got {}",
            splitter.k(),
            fold_losses.len()
        );

        let mean_loss = mean(&fold_losses);
        tracing::info!("[{}] cross-validation loss = {:.4}", label, mean_loss);

        let index = results.len();
        if mean_loss.is_nan() {
            tracing::warn!("[{}] produced an undefined loss and cannot be selected", label);
        } else if best.map_or(true, |(_, b)| mean_loss < b) {
            best = Some((index, mean_loss));
        }
        results.push(ConfigResult { params: point, fold_losses, mean_loss });
    }

    Ok(SearchReport { results, best: best.map(|(i, _)| i) })
}

// ─── SearchUseCase ────────────────────────────────────────────────────────────
pub struct SearchUseCase {
    config: TrainConfig,
    grid:   ParamGrid<Value>,
    device: DeviceKind,
}

impl SearchUseCase {
    pub fn new(config: TrainConfig, grid: ParamGrid<Value>, device: DeviceKind) -> Self {
        Self { config, grid, device }
    }

    pub fn execute(&self) -> Result<SearchReport> {
        let cfg = &self.config;

        let instances = WmtTsvReader::new(&cfg.dataset).read_all()?;

        // One vocabulary for every fold and configuration.
        let tokenizer = TokenizerStore::new(&cfg.run_dir).build_and_save(&instances, cfg.vocab_size)?;
        let metrics   = MetricsLogger::new(&cfg.run_dir)?;

        let report = match self.device {
            DeviceKind::Wgpu => {
                let mut trainer = BurnFoldTrainer::<WgpuTrainBackend>::new(
                    tokenizer, DeviceKind::wgpu_device(), Some(metrics),
                );
                run_search(&instances, cfg, &self.grid, &mut trainer)?
            }
            DeviceKind::Cpu => {
                let mut trainer = BurnFoldTrainer::<CpuTrainBackend>::new(
                    tokenizer, DeviceKind::cpu_device(), Some(metrics),
                );
                run_search(&instances, cfg, &self.grid, &mut trainer)?
            }
        };

        let path = CheckpointManager::new(&cfg.run_dir)?.save_json("search_results.json", &report)?;
        tracing::info!("Search report written to '{}'", path.display());
        Ok(report)
    }
}
