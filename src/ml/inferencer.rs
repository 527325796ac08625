// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the trained regressor from a run directory and
// predicts quality scores for new sentence pairs.
use anyhow::Result;
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use tokenizers::Tokenizer;

use crate::data::{batcher::RuseBatcher, dataset::RuseSample};
use crate::domain::{instance::WmtInstance, traits::QualityScorer};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{RuseModel, RuseModelConfig};

pub struct Inferencer<B: Backend> {
    model:       RuseModel<B>,
    tokenizer:   Tokenizer,
    max_seq_len: usize,
    batcher:     RuseBatcher<B>,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        tokenizer:    Tokenizer,
        device:       B::Device,
    ) -> Result<Self> {
        let cfg        = ckpt_manager.load_config()?;
        let vocab_size = tokenizer.get_vocab_size(true);
        let model: RuseModel<B> = RuseModelConfig::from_train_config(&cfg, vocab_size).with_dropout(0.0).init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint (vocab_size={})", vocab_size);
        Ok(Self {
            model,
            tokenizer,
            max_seq_len: cfg.max_seq_len,
            batcher:     RuseBatcher::new(device),
        })
    }

    /// Scores for many pairs in one forward pass, in input order.
    fn predict(&self, pairs: &[(&str, &str)]) -> Result<Vec<f64>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        let samples = pairs
            .iter()
            .map(|(mt, reference)| {
                RuseSample::encode(&WmtInstance::new(mt, reference, 0.0, ""), &self.tokenizer, self.max_seq_len)
            })
            .collect::<Result<Vec<_>>>()?;

        let batch       = self.batcher.batch(samples);
        let predictions = self.model.forward(batch.mt_ids, batch.mt_mask, batch.ref_ids, batch.ref_mask);
        let scores: Vec<f64> = predictions.into_data().iter::<f64>().collect();
        tracing::debug!("Scored {} pairs", scores.len());
        Ok(scores)
    }
}

impl<B: Backend> QualityScorer for Inferencer<B> {
    fn score(&self, mt: &str, reference: &str) -> Result<f64> {
        let scores = self.predict(&[(mt, reference)])?;
        scores
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("model returned no score"))
    }

    fn score_many(&self, pairs: &[(&str, &str)]) -> Result<Vec<f64>> {
        self.predict(pairs)
    }
}
