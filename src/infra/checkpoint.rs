// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Everything a run leaves on disk goes through here:
//
//   <run dir>/
//     model_epoch_3.mpk.gz   ← weights, saved when val_loss improves
//     latest_epoch.json      ← epoch of the newest weights
//     train_config.json      ← hyperparameters to rebuild the model
//     search_results.json    ← grid search report
//
// Weights use Burn's CompactRecorder (MessagePack + gzip); loading
// fails if the rebuilt architecture does not match the record.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::domain::config::TrainConfig;
use crate::ml::model::RuseModel;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing run directory without creating it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!(
                "Run directory '{}' does not exist. Have you run 'train' first?",
                dir.display()
            );
        }
        Ok(Self { dir })
    }

    /// Save weights for `epoch` and point latest_epoch.json at them.
    pub fn save_model<B: Backend>(&self, model: &RuseModel<B>, epoch: usize) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.save_json("latest_epoch.json", &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the newest weights into `model`, which must have the saved architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  RuseModel<B>,
        device: &B::Device,
    ) -> Result<RuseModel<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.save_json("train_config.json", cfg)?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.load_json("train_config.json")
            .context("Make sure you have run 'train' before 'score'")
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        self.load_json("latest_epoch.json")
            .context("No saved weights found. Have you run 'train' first?")
    }

    /// Pretty-print any serialisable value to `<dir>/<name>`.
    pub fn save_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(path)
    }

    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::ml::model::RuseModelConfig;

    #[test]
    fn test_config_round_trip_and_missing_files() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("run")).unwrap();

        assert!(ckpt.load_config().is_err());
        assert!(ckpt.latest_epoch().is_err());

        let cfg = TrainConfig { hidden_size: 12, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap(), cfg);
    }

    #[test]
    fn test_open_requires_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::open(dir.path().join("nope")).is_err());
        assert!(CheckpointManager::open(dir.path()).is_ok());
    }

    #[test]
    fn test_model_weights_round_trip() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let cfg    = TrainConfig {
            embedding_dim: 4, hidden_size: 3, num_layers: 1, mlp_dim: 5,
            ..TrainConfig::default()
        };

        let model: RuseModel<NdArray> = RuseModelConfig::from_train_config(&cfg, 8).init(&device);
        ckpt.save_model(&model, 7).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 7);

        let fresh: RuseModel<NdArray> = RuseModelConfig::from_train_config(&cfg, 8).init(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let ids  = Tensor::<NdArray, 2, Int>::from_ints([[2, 3]], &device);
        let mask = Tensor::<NdArray, 2>::from_floats([[1.0, 1.0]], &device);
        let a = model.forward(ids.clone(), mask.clone(), ids.clone(), mask.clone());
        let b = loaded.forward(ids.clone(), mask.clone(), ids, mask);
        // CompactRecorder stores half precision
        a.into_data().assert_approx_eq(&b.into_data(), 2);
    }
}
