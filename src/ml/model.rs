// ============================================================
// Layer 5 — RUSE Regressor
// ============================================================
// Predicts a translation-quality score from an MT sentence and
// its reference:
//
//   mt ids  ──embed──▶ LSTM stack ──masked mean──▶ u ┐
//   ref ids ──embed──▶ LSTM stack ──masked mean──▶ v ┤
//                                                     ▼
//                           [u, v, u ⊙ v, |u − v|]   (4h)
//                                    │
//                     Linear(4h→m) → tanh → Linear(m→m) → tanh
//                                    │
//                               Linear(m→1) → score
//
// Both sentences share the same embedding and encoder weights.
// Loss is the sum of squared errors over the batch.
//
// Reference: Shimanaka et al. (2018) RUSE
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    tensor::activation::tanh,
};

use crate::data::batcher::RuseBatch;
use crate::domain::config::TrainConfig;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct RuseModelConfig {
    pub vocab_size:    usize,
    #[config(default = 128)]
    pub embedding_dim: usize,
    #[config(default = 64)]
    pub hidden_size:   usize,
    #[config(default = 2)]
    pub num_layers:    usize,
    #[config(default = 128)]
    pub mlp_dim:       usize,
    #[config(default = 0.0)]
    pub dropout:       f64,
}

impl RuseModelConfig {
    /// Architecture described by a training config.
    pub fn from_train_config(cfg: &TrainConfig, vocab_size: usize) -> Self {
        Self::new(vocab_size)
            .with_embedding_dim(cfg.embedding_dim)
            .with_hidden_size(cfg.hidden_size)
            .with_num_layers(cfg.num_layers)
            .with_mlp_dim(cfg.mlp_dim)
            .with_dropout(cfg.dropout)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> RuseModel<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device);
        let encoder: Vec<Lstm<B>> = (0..self.num_layers.max(1))
            .map(|layer| {
                let d_input = if layer == 0 { self.embedding_dim } else { self.hidden_size };
                LstmConfig::new(d_input, self.hidden_size, true).init(device)
            })
            .collect();
        let mlp_in     = LinearConfig::new(self.hidden_size * 4, self.mlp_dim).init(device);
        let mlp_hidden = LinearConfig::new(self.mlp_dim, self.mlp_dim).init(device);
        let mlp_out    = LinearConfig::new(self.mlp_dim, 1).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        RuseModel { embedding, encoder, mlp_in, mlp_hidden, mlp_out, dropout }
    }
}

#[derive(Module, Debug)]
pub struct RuseModel<B: Backend> {
    pub embedding:  Embedding<B>,
    pub encoder:    Vec<Lstm<B>>,
    pub mlp_in:     Linear<B>,
    pub mlp_hidden: Linear<B>,
    pub mlp_out:    Linear<B>,
    pub dropout:    Dropout,
}

pub struct RegressionOutput<B: Backend> {
    /// Predicted scores, shape: [batch, 1]
    pub predictions: Tensor<B, 2>,
    /// Sum of squared errors, shape: [1]
    pub loss:        Tensor<B, 1>,
}

impl<B: Backend> RuseModel<B> {
    /// ids, mask: [batch, seq_len] → sentence vectors [batch, hidden]
    pub fn encode(&self, ids: Tensor<B, 2, Int>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = self.dropout.forward(self.embedding.forward(ids));
        for lstm in &self.encoder {
            let (output, _state) = lstm.forward(x, None);
            x = output;
        }
        let [batch, seq_len, hidden] = x.dims();

        // Average the encoder states over real tokens only.
        let summed = (x * mask.clone().reshape([batch, seq_len, 1]).expand([batch, seq_len, hidden]))
            .sum_dim(1)
            .reshape([batch, hidden]);
        let lengths = mask.sum_dim(1).clamp_min(1.0).expand([batch, hidden]);
        summed / lengths
    }

    /// Predict scores: [batch, 1]
    pub fn forward(
        &self,
        mt_ids:   Tensor<B, 2, Int>,
        mt_mask:  Tensor<B, 2>,
        ref_ids:  Tensor<B, 2, Int>,
        ref_mask: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let u = self.encode(mt_ids, mt_mask);
        let v = self.encode(ref_ids, ref_mask);

        let features = Tensor::cat(
            vec![u.clone(), v.clone(), u.clone() * v.clone(), (u - v).abs()],
            1,
        );
        let h = tanh(self.mlp_in.forward(self.dropout.forward(features)));
        let h = tanh(self.mlp_hidden.forward(h));
        self.mlp_out.forward(h)
    }

    pub fn forward_regression(&self, batch: RuseBatch<B>) -> RegressionOutput<B> {
        let predictions = self.forward(batch.mt_ids, batch.mt_mask, batch.ref_ids, batch.ref_mask);
        let delta       = predictions.clone() - batch.scores;
        let loss        = (delta.clone() * delta).sum();
        RegressionOutput { predictions, loss }
    }
}
