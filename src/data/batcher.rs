// ============================================================
// Layer 4 — Sentence-Pair Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<RuseSample>
// into tensors for one forward pass.
//
// Sentences have different lengths, so each side (MT and
// reference) is padded to the longest sentence of that side in
// the batch, and a float mask marks the real tokens:
//
//   mt_ids  [[ 7, 12,  4],      mt_mask  [[1, 1, 1],
//            [ 9,  0,  0]]                [1, 0, 0]]
//
// Scores become a [batch, 1] column so they line up with the
// regressor's output.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::RuseSample;
use crate::infra::tokenizer_store::PAD_ID;

#[derive(Debug, Clone)]
pub struct RuseBatch<B: Backend> {
    /// MT token ids, shape: [batch_size, mt_len]
    pub mt_ids: Tensor<B, 2, Int>,

    /// 1.0 for real MT tokens, 0.0 for padding, shape: [batch_size, mt_len]
    pub mt_mask: Tensor<B, 2>,

    /// Reference token ids, shape: [batch_size, ref_len]
    pub ref_ids: Tensor<B, 2, Int>,

    /// 1.0 for real reference tokens, 0.0 for padding
    pub ref_mask: Tensor<B, 2>,

    /// Human scores, shape: [batch_size, 1]
    pub scores: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct RuseBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> RuseBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn pad_to_tensors<'a>(
        &self,
        sequences: impl Iterator<Item = &'a [u32]> + Clone,
    ) -> (Tensor<B, 2, Int>, Tensor<B, 2>) {
        let (ids, mask, rows, cols) = pad_sequences(sequences);

        let ids = Tensor::<B, 1, Int>::from_ints(ids.as_slice(), &self.device)
            .reshape([rows, cols]);
        let mask = Tensor::<B, 1>::from_floats(mask.as_slice(), &self.device)
            .reshape([rows, cols]);
        (ids, mask)
    }
}

/// Right-pad sequences with [PAD] to a common length.
/// Returns the flattened ids, the flattened mask, and the [rows, cols] shape.
pub fn pad_sequences<'a>(
    sequences: impl Iterator<Item = &'a [u32]> + Clone,
) -> (Vec<i32>, Vec<f32>, usize, usize) {
    let cols = sequences.clone().map(<[u32]>::len).max().unwrap_or(0).max(1);

    let mut ids  = Vec::new();
    let mut mask = Vec::new();
    let mut rows = 0;
    for seq in sequences {
        ids.extend(seq.iter().map(|&id| id as i32));
        mask.extend(std::iter::repeat(1.0f32).take(seq.len()));

        let pad = cols - seq.len();
        ids.extend(std::iter::repeat(PAD_ID as i32).take(pad));
        mask.extend(std::iter::repeat(0.0f32).take(pad));
        rows += 1;
    }
    (ids, mask, rows, cols)
}

impl<B: Backend> Batcher<RuseSample, RuseBatch<B>> for RuseBatcher<B> {
    fn batch(&self, items: Vec<RuseSample>) -> RuseBatch<B> {
        let batch_size = items.len();

        let (mt_ids, mt_mask)   = self.pad_to_tensors(items.iter().map(|s| s.mt_ids.as_slice()));
        let (ref_ids, ref_mask) = self.pad_to_tensors(items.iter().map(|s| s.ref_ids.as_slice()));

        let scores: Vec<f32> = items.iter().map(|s| s.human_score).collect();
        let scores = Tensor::<B, 1>::from_floats(scores.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        RuseBatch { mt_ids, mt_mask, ref_ids, ref_mask, scores }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_pad_sequences() {
        let seqs: Vec<Vec<u32>> = vec![vec![7, 12, 4], vec![9]];
        let (ids, mask, rows, cols) = pad_sequences(seqs.iter().map(|s| s.as_slice()));
        assert_eq!((rows, cols), (2, 3));
        assert_eq!(ids,  vec![7, 12, 4, 9, 0, 0]);
        assert_eq!(mask, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = RuseBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(vec![
            RuseSample { mt_ids: vec![2, 3],    ref_ids: vec![4],       human_score: 0.5 },
            RuseSample { mt_ids: vec![5],       ref_ids: vec![6, 7, 8], human_score: -0.5 },
            RuseSample { mt_ids: vec![2, 3, 4], ref_ids: vec![9],       human_score: 0.0 },
        ]);

        assert_eq!(batch.mt_ids.dims(),   [3, 3]);
        assert_eq!(batch.mt_mask.dims(),  [3, 3]);
        assert_eq!(batch.ref_ids.dims(),  [3, 3]);
        assert_eq!(batch.ref_mask.dims(), [3, 3]);
        assert_eq!(batch.scores.dims(),   [3, 1]);

        let real_tokens: f32 = batch.mt_mask.sum().into_scalar();
        assert_eq!(real_tokens, 6.0);
    }
}
