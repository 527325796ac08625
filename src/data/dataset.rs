use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::instance::WmtInstance;
use crate::infra::tokenizer_store::{encode_words, UNK_ID};

/// One encoded sentence pair. Id sequences are unpadded;
/// the batcher pads them to the longest sequence in the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuseSample {
    pub mt_ids:      Vec<u32>,
    pub ref_ids:     Vec<u32>,
    pub human_score: f32,
}

impl RuseSample {
    /// Encode an instance, truncating each sentence to `max_seq_len`.
    pub fn encode(
        instance:    &WmtInstance,
        tokenizer:   &Tokenizer,
        max_seq_len: usize,
    ) -> Result<Self> {
        Ok(Self {
            mt_ids:      encode_sentence(tokenizer, &instance.mt, max_seq_len)?,
            ref_ids:     encode_sentence(tokenizer, &instance.reference, max_seq_len)?,
            human_score: instance.human_score as f32,
        })
    }

    /// Encode a borrowed slice of instances in order.
    pub fn encode_all(
        instances:   &[&WmtInstance],
        tokenizer:   &Tokenizer,
        max_seq_len: usize,
    ) -> Result<Vec<Self>> {
        instances
            .iter()
            .map(|inst| Self::encode(inst, tokenizer, max_seq_len))
            .collect()
    }
}

// An empty sentence still needs one position for the encoder to pool over.
fn encode_sentence(tokenizer: &Tokenizer, words: &[String], max_seq_len: usize) -> Result<Vec<u32>> {
    let mut ids = encode_words(tokenizer, words)?;
    ids.truncate(max_seq_len.max(1));
    if ids.is_empty() {
        ids.push(UNK_ID);
    }
    Ok(ids)
}

pub struct RuseDataset {
    samples: Vec<RuseSample>,
}

impl RuseDataset {
    pub fn new(samples: Vec<RuseSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<RuseSample> for RuseDataset {
    fn get(&self, index: usize) -> Option<RuseSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
