// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Trains one fresh RuseModel on a training set with early
// stopping on a validation set, using Burn's DataLoader and Adam.
//
// Per epoch:
//   1. forward + summed squared error on every training batch,
//      backward pass, Adam update
//   2. model.valid() → evaluate on the validation set on the
//      inner backend (no autodiff), collecting predictions
//   3. log train/val loss, Pearson r and covariance
//   4. stop once val_loss has not improved for `patience` epochs
//
// Reported losses are the summed squared error divided by the number
// of samples, so they do not depend on the batch size.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{Context, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use tokenizers::Tokenizer;

use crate::domain::config::{LossPolicy, TrainConfig};
use crate::data::{
    batcher::{RuseBatch, RuseBatcher},
    dataset::{RuseDataset, RuseSample},
};
use crate::domain::traits::{FoldJob, FoldTrainer};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{covariance, pearson, EpochMetrics, MetricsLogger},
};
use crate::ml::model::{RuseModel, RuseModelConfig};

/// Inputs that stay fixed for one training run.
pub struct TrainRun<'a> {
    pub config:      &'a TrainConfig,
    pub vocab_size:  usize,
    /// Grid point name written to the metrics CSV
    pub label:       &'a str,
    pub fold:        usize,
    pub metrics:     Option<&'a MetricsLogger>,
    /// When set, weights are saved every time val_loss improves
    pub checkpoints: Option<&'a CheckpointManager>,
}

/// Backend-independent result of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldSummary {
    pub epochs_run:     usize,
    pub best_epoch:     usize,
    pub best_val_loss:  f64,
    pub final_val_loss: f64,
}

impl FoldSummary {
    pub fn validation_loss(&self, policy: LossPolicy) -> f64 {
        match policy {
            LossPolicy::Final => self.final_val_loss,
            LossPolicy::Best  => self.best_val_loss,
        }
    }
}

/// Per-epoch history of a run plus its summary.
pub struct FoldOutcome {
    pub history: Vec<EpochMetrics>,
    summary:     FoldSummary,
}

impl FoldOutcome {
    pub fn summary(&self) -> FoldSummary {
        self.summary
    }
}

/// Tracks the best epoch and decides when to stop.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:   usize,
    best_loss:  f64,
    best_epoch: usize,
    since_best: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, best_loss: f64::INFINITY, best_epoch: 0, since_best: 0 }
    }

    /// Record an epoch's validation loss; returns true if it is a new best.
    pub fn observe(&mut self, epoch: usize, val_loss: f64) -> bool {
        if val_loss < self.best_loss {
            self.best_loss  = val_loss;
            self.best_epoch = epoch;
            self.since_best = 0;
            true
        } else {
            self.since_best += 1;
            false
        }
    }

    /// A patience of 0 disables early stopping.
    pub fn should_stop(&self) -> bool {
        self.patience > 0 && self.since_best >= self.patience
    }

    pub fn best(&self) -> (usize, f64) {
        (self.best_epoch, self.best_loss)
    }
}

pub fn train_model<B: AutodiffBackend>(
    run:           &TrainRun<'_>,
    train_dataset: RuseDataset,
    val_dataset:   RuseDataset,
    device:        &B::Device,
) -> Result<FoldOutcome> {
    let cfg = run.config;

    // Same seed per (config, fold) → same initial weights and batch order.
    let seed = cfg.seed.wrapping_add(run.fold as u64);
    B::seed(seed);

    let mut model: RuseModel<B> = RuseModelConfig::from_train_config(cfg, run.vocab_size).init(device);
    let mut optim = AdamConfig::new().init();

    tracing::info!(
        "[{}] fold {}: {} train / {} validation samples",
        run.label,
        run.fold,
        train_dataset.sample_count(),
        val_dataset.sample_count()
    );

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(RuseBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, no autodiff) ────────────
    let val_loader = DataLoaderBuilder::new(RuseBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut stopper        = EarlyStopping::new(cfg.patience);
    let mut history        = Vec::new();
    let mut final_val_loss = f64::NAN;

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_squared_error = 0.0f64;
        let mut train_samples       = 0usize;

        for batch in train_loader.iter() {
            train_samples += batch.scores.dims()[0];
            let output = model.forward_regression(batch);
            train_squared_error += output.loss.clone().into_scalar().elem::<f64>();

            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let validation = evaluate(&model.valid(), &*val_loader);

        let metrics = EpochMetrics {
            fold:       run.fold,
            epoch,
            train_loss: per_sample(train_squared_error, train_samples),
            val_loss:   validation.mean_squared_error(),
            pearson:    pearson(&validation.predictions, &validation.gold),
            covariance: covariance(&validation.predictions, &validation.gold),
        };
        final_val_loss = metrics.val_loss;

        println!(
            "[{}] fold {} epoch {:>4}/{} | train_loss={:.4} | val_loss={:.4} | pearson={:.4}",
            run.label, run.fold, epoch, cfg.epochs,
            metrics.train_loss, metrics.val_loss, metrics.pearson,
        );

        if let Some(logger) = run.metrics {
            logger.log(run.label, &metrics)?;
        }

        let improved = stopper.observe(epoch, metrics.val_loss);
        if improved {
            if let Some(ckpt) = run.checkpoints {
                ckpt.save_model(&model, epoch)?;
            }
        }
        history.push(metrics);

        if stopper.should_stop() {
            tracing::info!(
                "[{}] fold {}: no improvement for {} epochs, stopping at epoch {}",
                run.label, run.fold, cfg.patience, epoch
            );
            break;
        }
    }

    if validation_was_empty(&history) {
        tracing::warn!("[{}] fold {}: validation set is empty, loss is undefined", run.label, run.fold);
    }

    let (best_epoch, best_val_loss) = stopper.best();
    let summary = FoldSummary {
        epochs_run: history.len(),
        best_epoch,
        best_val_loss: if best_epoch == 0 { f64::NAN } else { best_val_loss },
        final_val_loss,
    };
    Ok(FoldOutcome { history, summary })
}

/// Predictions and squared error of one pass over a data loader.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub squared_error: f64,
    pub samples:       usize,
    pub predictions:   Vec<f64>,
    pub gold:          Vec<f64>,
}

impl Evaluation {
    /// NaN when the loader produced no samples.
    pub fn mean_squared_error(&self) -> f64 {
        per_sample(self.squared_error, self.samples)
    }
}

/// Run `model` over every batch of `loader` without updating it.
pub fn evaluate<B: Backend>(model: &RuseModel<B>, loader: &dyn DataLoader<RuseBatch<B>>) -> Evaluation {
    let mut eval = Evaluation::default();
    for batch in loader.iter() {
        let scores = batch.scores.clone();
        eval.samples += scores.dims()[0];

        let output = model.forward_regression(batch);
        eval.squared_error += output.loss.into_scalar().elem::<f64>();
        eval.predictions.extend(output.predictions.into_data().iter::<f64>());
        eval.gold.extend(scores.into_data().iter::<f64>());
    }
    eval
}

fn per_sample(squared_error: f64, samples: usize) -> f64 {
    if samples > 0 { squared_error / samples as f64 } else { f64::NAN }
}

fn validation_was_empty(history: &[EpochMetrics]) -> bool {
    history.last().is_some_and(|m| m.val_loss.is_nan())
}

// ─── BurnFoldTrainer ──────────────────────────────────────────────────────────
/// Trains the RUSE regressor on each fold handed out by the search driver.
pub struct BurnFoldTrainer<B: AutodiffBackend> {
    tokenizer: Tokenizer,
    device:    B::Device,
    metrics:   Option<MetricsLogger>,
}

impl<B: AutodiffBackend> BurnFoldTrainer<B> {
    pub fn new(tokenizer: Tokenizer, device: B::Device, metrics: Option<MetricsLogger>) -> Self {
        Self { tokenizer, device, metrics }
    }
}

impl<B: AutodiffBackend> FoldTrainer for BurnFoldTrainer<B> {
    fn train_fold(&mut self, job: FoldJob<'_>) -> Result<f64> {
        let cfg = job.config;
        let train = RuseSample::encode_all(job.train, &self.tokenizer, cfg.max_seq_len)
            .context("Cannot encode training fold")?;
        let val = RuseSample::encode_all(job.validation, &self.tokenizer, cfg.max_seq_len)
            .context("Cannot encode validation fold")?;

        let run = TrainRun {
            config:      cfg,
            vocab_size:  self.tokenizer.get_vocab_size(true),
            label:       job.label,
            fold:        job.fold,
            metrics:     self.metrics.as_ref(),
            checkpoints: None,
        };
        let outcome = train_model::<B>(&run, RuseDataset::new(train), RuseDataset::new(val), &self.device)?;
        Ok(outcome.summary().validation_loss(cfg.loss_policy))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::domain::instance::WmtInstance;
    use crate::infra::tokenizer_store::TokenizerStore;
    use crate::ml::backend::CpuTrainBackend;

    #[test]
    fn test_early_stopping() {
        let mut stop = EarlyStopping::new(2);
        assert!(stop.observe(1, 5.0));
        assert!(stop.observe(2, 4.0));
        assert!(!stop.observe(3, 4.5));
        assert!(!stop.should_stop());
        assert!(!stop.observe(4, 4.0));
        assert!(stop.should_stop());
        assert_eq!(stop.best(), (2, 4.0));
    }

    #[test]
    fn test_zero_patience_never_stops() {
        let mut stop = EarlyStopping::new(0);
        stop.observe(1, 1.0);
        for e in 2..20 {
            stop.observe(e, 2.0);
        }
        assert!(!stop.should_stop());
    }

    #[test]
    fn test_loss_policy_selects_loss() {
        let s = FoldSummary { epochs_run: 5, best_epoch: 2, best_val_loss: 1.0, final_val_loss: 3.0 };
        assert_eq!(s.validation_loss(LossPolicy::Best), 1.0);
        assert_eq!(s.validation_loss(LossPolicy::Final), 3.0);
    }

    fn samples(n: usize) -> Vec<RuseSample> {
        (0..n)
            .map(|i| RuseSample {
                mt_ids:      vec![2 + (i % 5) as u32, 3],
                ref_ids:     vec![2 + (i % 5) as u32],
                human_score: (i % 5) as f32 / 5.0,
            })
            .collect()
    }

    #[test]
    fn test_train_model_smoke_on_cpu() {
        let cfg = TrainConfig {
            batch_size:    4,
            epochs:        3,
            patience:      0,
            embedding_dim: 8,
            hidden_size:   4,
            num_layers:    1,
            mlp_dim:       8,
            ..TrainConfig::default()
        };
        let run = TrainRun {
            config:      &cfg,
            vocab_size:  10,
            label:       "smoke",
            fold:        0,
            metrics:     None,
            checkpoints: None,
        };

        let outcome = train_model::<CpuTrainBackend>(
            &run,
            RuseDataset::new(samples(12)),
            RuseDataset::new(samples(4)),
            &Default::default(),
        )
        .unwrap();

        let summary = outcome.summary();
        assert_eq!(summary.epochs_run, 3);
        assert_eq!(outcome.history.len(), 3);
        assert!(summary.final_val_loss.is_finite());
        assert!(summary.best_val_loss <= summary.final_val_loss);
        assert!((1..=3).contains(&summary.best_epoch));
    }

    #[test]
    fn test_validation_loss_does_not_depend_on_batch_size() {
        let device = Default::default();
        let model: RuseModel<NdArray> = RuseModelConfig::new(10)
            .with_embedding_dim(4)
            .with_hidden_size(3)
            .with_num_layers(1)
            .with_mlp_dim(4)
            .init(&device);

        let loss_at = |batch_size: usize| {
            let loader = DataLoaderBuilder::new(RuseBatcher::<NdArray>::new(device.clone()))
                .batch_size(batch_size)
                .build(RuseDataset::new(samples(16)));
            evaluate(&model, &*loader)
        };
        let small = loss_at(2);
        let large = loss_at(16);

        assert_eq!(small.samples, 16);
        assert_eq!(large.samples, 16);
        let (a, b) = (small.mean_squared_error(), large.mean_squared_error());
        assert!(a.is_finite());
        assert!((a - b).abs() <= 1e-5 * a.abs().max(1.0), "{a} vs {b}");
    }

    #[test]
    fn test_empty_evaluation_is_nan() {
        assert!(Evaluation::default().mean_squared_error().is_nan());
    }

    #[test]
    fn test_burn_fold_trainer_returns_finite_loss() {
        let dir       = tempfile::tempdir().unwrap();
        let instances: Vec<WmtInstance> = (0..10)
            .map(|i| WmtInstance::new("a small cat", "the small cat", i as f64 / 10.0, "x"))
            .collect();
        let tokenizer = TokenizerStore::new(dir.path()).build_and_save(&instances, 50).unwrap();

        let cfg = TrainConfig {
            batch_size:    4,
            epochs:        2,
            patience:      0,
            embedding_dim: 4,
            hidden_size:   3,
            num_layers:    1,
            mlp_dim:       4,
            loss_policy:   LossPolicy::Best,
            ..TrainConfig::default()
        };
        let refs: Vec<&WmtInstance> = instances.iter().collect();
        let (train, validation) = refs.split_at(7);

        let mut trainer = BurnFoldTrainer::<CpuTrainBackend>::new(tokenizer, Default::default(), None);
        let loss = trainer
            .train_fold(FoldJob { config: &cfg, label: "batch_size=4", fold: 0, train, validation })
            .unwrap();
        assert!(loss.is_finite());
        assert!(loss >= 0.0);
    }
}
