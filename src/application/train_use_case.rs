// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Trains the final model with one chosen configuration:
//
//   Step 1: Read the WMT dataset        (Layer 4 - data)
//   Step 2: Build the word vocabulary   (Layer 6 - infra)
//   Step 3: Hold out one stratified fold for early stopping
//   Step 4: Encode both sides           (Layer 4 - data)
//   Step 5: Save config for scoring     (Layer 6 - infra)
//   Step 6: Run the training loop       (Layer 5 - ml)

use anyhow::{Context, Result};

use crate::data::{
    dataset::{RuseDataset, RuseSample},
    kfold::StratifiedKFold,
    loader::WmtTsvReader,
};
use crate::domain::{
    config::TrainConfig,
    instance::origin_of,
    traits::InstanceSource,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    backend::{CpuTrainBackend, DeviceKind, WgpuTrainBackend},
    trainer::{train_model, TrainRun},
};

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
/// What the final training run achieved.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub train_size:     usize,
    pub holdout_size:   usize,
    pub epochs_run:     usize,
    pub best_epoch:     usize,
    pub best_val_loss:  f64,
    pub final_val_loss: f64,
}

pub struct TrainUseCase {
    config: TrainConfig,
    device: DeviceKind,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, device: DeviceKind) -> Self {
        Self { config, device }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Read the dataset ──────────────────────────────────────────
        let instances = WmtTsvReader::new(&cfg.dataset).read_all()?;

        // ── Step 2: Build the vocabulary from every sentence ──────────────────
        let tokenizer  = TokenizerStore::new(&cfg.run_dir).build_and_save(&instances, cfg.vocab_size)?;
        let vocab_size = tokenizer.get_vocab_size(true);

        // ── Step 3: Stratified holdout (fold 0 of k) ──────────────────────────
        let mut splitter = StratifiedKFold::new(&instances, cfg.k, origin_of)?;
        if cfg.shuffle_folds {
            splitter = splitter.with_shuffle(cfg.seed);
        }
        let holdout = splitter
            .fold(0)
            .context("splitter produced no folds")?;
        tracing::debug!("Origins: {:?}", splitter.group_keys().collect::<Vec<_>>());
        tracing::info!(
            "Holdout split: {} train, {} validation",
            holdout.train.len(),
            holdout.validation.len()
        );

        // ── Step 4: Encode ────────────────────────────────────────────────────
        let train_ds = RuseDataset::new(RuseSample::encode_all(&holdout.train, &tokenizer, cfg.max_seq_len)?);
        let val_ds   = RuseDataset::new(RuseSample::encode_all(&holdout.validation, &tokenizer, cfg.max_seq_len)?);
        let (train_size, holdout_size) = (train_ds.sample_count(), val_ds.sample_count());

        // ── Step 5: Save config so `score` can rebuild the model ──────────────
        let ckpt_manager = CheckpointManager::new(&cfg.run_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.run_dir)?;

        // ── Step 6: Train ─────────────────────────────────────────────────────
        let run = TrainRun {
            config:      cfg,
            vocab_size,
            label:       "final",
            fold:        0,
            metrics:     Some(&metrics),
            checkpoints: Some(&ckpt_manager),
        };
        let outcome = match self.device {
            DeviceKind::Wgpu => train_model::<WgpuTrainBackend>(&run, train_ds, val_ds, &DeviceKind::wgpu_device())?.summary(),
            DeviceKind::Cpu  => train_model::<CpuTrainBackend>(&run, train_ds, val_ds, &DeviceKind::cpu_device())?.summary(),
        };

        Ok(TrainSummary {
            train_size,
            holdout_size,
            epochs_run:     outcome.epochs_run,
            best_epoch:     outcome.best_epoch,
            best_val_loss:  outcome.best_val_loss,
            final_val_loss: outcome.final_val_loss,
        })
    }
}
