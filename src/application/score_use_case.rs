// ============================================================
// Layer 2 — ScoreUseCase
// ============================================================
// Loads a trained run directory and either
//   - scores one MT/reference pair, or
//   - scores every row of a WMT TSV file and compares the
//     predictions with the human scores in that file.

use anyhow::{ensure, Result};
use std::path::PathBuf;

use crate::data::loader::WmtTsvReader;
use crate::domain::traits::{InstanceSource, QualityScorer};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{covariance, mean, pearson},
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    backend::{CpuInferBackend, DeviceKind, WgpuInferBackend},
    inferencer::Inferencer,
};

/// Pairs scored per forward pass when evaluating a file.
const EVAL_CHUNK: usize = 256;

/// How well a checkpoint agrees with human judgements on a file.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    pub count:      usize,
    pub pearson:    f64,
    pub covariance: f64,
    pub mse:        f64,
}

pub struct ScoreUseCase {
    scorer: Box<dyn QualityScorer>,
}

impl ScoreUseCase {
    pub fn new(run_dir: impl Into<PathBuf>, device: DeviceKind) -> Result<Self> {
        let run_dir   = run_dir.into();
        let ckpt      = CheckpointManager::open(&run_dir)?;
        let tokenizer = TokenizerStore::new(&run_dir).load()?;

        let scorer: Box<dyn QualityScorer> = match device {
            DeviceKind::Wgpu => Box::new(Inferencer::<WgpuInferBackend>::from_checkpoint(
                &ckpt, tokenizer, DeviceKind::wgpu_device(),
            )?),
            DeviceKind::Cpu => Box::new(Inferencer::<CpuInferBackend>::from_checkpoint(
                &ckpt, tokenizer, DeviceKind::cpu_device(),
            )?),
        };
        Ok(Self::with_scorer(scorer))
    }

    pub fn with_scorer(scorer: Box<dyn QualityScorer>) -> Self {
        Self { scorer }
    }

    pub fn score_pair(&self, mt: &str, reference: &str) -> Result<f64> {
        self.scorer.score(mt, reference)
    }

    pub fn evaluate_file(&self, path: impl Into<PathBuf>) -> Result<EvaluationSummary> {
        let instances = WmtTsvReader::new(path).read_all()?;
        ensure!(!instances.is_empty(), "nothing to evaluate: the file has no rows");

        let texts: Vec<(String, String)> = instances
            .iter()
            .map(|i| (i.mt_text(), i.reference_text()))
            .collect();
        let gold: Vec<f64> = instances.iter().map(|i| i.human_score).collect();

        let mut predictions = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(EVAL_CHUNK) {
            let pairs: Vec<(&str, &str)> = chunk
                .iter()
                .map(|(mt, reference)| (mt.as_str(), reference.as_str()))
                .collect();
            predictions.extend(self.scorer.score_many(&pairs)?);
        }

        let squared: Vec<f64> = predictions
            .iter()
            .zip(&gold)
            .map(|(p, g)| (p - g) * (p - g))
            .collect();

        Ok(EvaluationSummary {
            count:      predictions.len(),
            pearson:    pearson(&predictions, &gold),
            covariance: covariance(&predictions, &gold),
            mse:        mean(&squared),
        })
    }
}
