// ============================================================
// Layer 3 — Training Configuration
// ============================================================
// Every hyperparameter a run needs, shared by the search, train
// and score workflows and saved as train_config.json next to the
// checkpoints. Grid points override fields of TrainConfig by
// name, so field names double as grid parameter names.
//
// Reference: serde documentation (container attribute `default`)

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::error::ConfigurationError;

/// Fields read once per run (dataset, output directory, vocabulary)
/// rather than once per grid configuration.
pub const RUN_LEVEL_FIELDS: &[&str] = &["dataset", "run_dir", "vocab_size"];

// ─── LossPolicy ───────────────────────────────────────────────────────────────
/// Which validation loss a fold reports once training stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossPolicy {
    /// Loss of the last epoch that ran
    #[default]
    Final,
    /// Lowest loss seen in any epoch
    Best,
}

impl FromStr for LossPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "final" => Ok(Self::Final),
            "best"  => Ok(Self::Best),
            other   => Err(format!("unknown loss policy '{other}' (expected 'final' or 'best')")),
        }
    }
}

impl fmt::Display for LossPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Final => write!(f, "final"),
            Self::Best  => write!(f, "best"),
        }
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Every hyperparameter a run needs. Grid points override fields of
// this struct by name, so field names double as grid parameter names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub dataset:       String,
    pub run_dir:       String,
    pub k:             usize,
    pub seed:          u64,
    pub shuffle_folds: bool,
    pub batch_size:    usize,
    pub epochs:        usize,
    pub patience:      usize,
    pub lr:            f64,
    pub vocab_size:    usize,
    pub max_seq_len:   usize,
    pub embedding_dim: usize,
    pub hidden_size:   usize,
    pub num_layers:    usize,
    pub mlp_dim:       usize,
    pub dropout:       f64,
    pub loss_policy:   LossPolicy,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset:       "data/trg-en/combined".to_string(),
            run_dir:       "runs".to_string(),
            k:             10,
            seed:          1,
            shuffle_folds: false,
            batch_size:    64,
            epochs:        1000,
            patience:      10,
            lr:            1e-3,
            vocab_size:    50_000,
            max_seq_len:   128,
            embedding_dim: 128,
            hidden_size:   64,
            num_layers:    2,
            mlp_dim:       128,
            dropout:       0.0,
            loss_policy:   LossPolicy::Final,
        }
    }
}

impl TrainConfig {
    /// Copy of this config with every `(name, value)` override applied by field name.
    ///
    /// Run-level fields (`RUN_LEVEL_FIELDS`) are fixed for a whole search
    /// and cannot be overridden per configuration.
    pub fn with_overrides<'a>(
        &self,
        overrides: impl IntoIterator<Item = (&'a str, &'a serde_json::Value)>,
    ) -> Result<Self, ConfigurationError> {
        let invalid = |name: &str, reason: String| ConfigurationError::InvalidParameter {
            name: name.to_string(),
            reason,
        };

        let mut value = serde_json::to_value(self)
            .map_err(|e| invalid("<config>", e.to_string()))?;

        for (name, candidate) in overrides {
            if RUN_LEVEL_FIELDS.contains(&name) {
                return Err(invalid(name, "fixed for the whole run, cannot vary per configuration".to_string()));
            }
            let fields = value
                .as_object_mut()
                .ok_or_else(|| invalid("<config>", "config is not an object".to_string()))?;
            if !fields.contains_key(name) {
                return Err(invalid(name, "unknown hyperparameter".to_string()));
            }
            fields.insert(name.to_string(), candidate.clone());

            // Check each value on its own so the error names the culprit.
            serde_json::from_value::<TrainConfig>(value.clone())
                .map_err(|e| invalid(name, e.to_string()))?;
        }

        serde_json::from_value(value).map_err(|e| invalid("<config>", e.to_string()))
    }

    /// Range checks the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let check = |ok: bool, name: &str, reason: &str| {
            if ok {
                Ok(())
            } else {
                Err(ConfigurationError::InvalidParameter {
                    name:   name.to_string(),
                    reason: reason.to_string(),
                })
            }
        };
        check(self.batch_size > 0,                       "batch_size",    "must be positive")?;
        check(self.epochs > 0,                           "epochs",        "must be positive")?;
        check(self.lr.is_finite() && self.lr > 0.0,      "lr",            "must be a positive number")?;
        check(self.vocab_size > 2,                       "vocab_size",    "must leave room for [PAD] and [UNK]")?;
        check(self.max_seq_len > 0,                      "max_seq_len",   "must be positive")?;
        check(self.embedding_dim > 0,                    "embedding_dim", "must be positive")?;
        check(self.hidden_size > 0,                      "hidden_size",   "must be positive")?;
        check(self.num_layers > 0,                       "num_layers",    "must be positive")?;
        check(self.mlp_dim > 0,                          "mlp_dim",       "must be positive")?;
        check((0.0..1.0).contains(&self.dropout),        "dropout",       "must be in [0, 1)")?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn apply(base: &TrainConfig, overrides: &[(&str, Value)]) -> Result<TrainConfig, ConfigurationError> {
        base.with_overrides(overrides.iter().map(|(n, v)| (*n, v)))
    }

    #[test]
    fn test_overrides_apply_by_name() {
        let base = TrainConfig::default();
        let cfg  = apply(&base, &[
            ("batch_size", json!(256)),
            ("lr", json!(0.01)),
            ("loss_policy", json!("best")),
        ])
        .unwrap();
        assert_eq!(cfg.batch_size, 256);
        assert_eq!(cfg.lr, 0.01);
        assert_eq!(cfg.loss_policy, LossPolicy::Best);
        // Everything else untouched
        assert_eq!(cfg.hidden_size, base.hidden_size);
        assert_eq!(cfg.dataset, base.dataset);
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        let err = apply(&TrainConfig::default(), &[("momentum", json!(0.9))]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidParameter { ref name, .. } if name == "momentum"));
    }

    #[test]
    fn test_ill_typed_parameter_is_rejected() {
        let err = apply(&TrainConfig::default(), &[("batch_size", json!("big"))]).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidParameter { ref name, .. } if name == "batch_size"));
    }

    #[test]
    fn test_run_level_fields_cannot_vary() {
        let base = TrainConfig::default();
        for (name, value) in [
            ("vocab_size", json!(100)),
            ("dataset", json!("other.tsv")),
            ("run_dir", json!("elsewhere")),
        ] {
            let err = apply(&base, &[(name, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigurationError::InvalidParameter { name: ref n, .. } if n == name),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_ranges() {
        assert!(TrainConfig::default().validate().is_ok());

        let cfg = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = TrainConfig { dropout: 1.0, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());

        let cfg = TrainConfig { lr: f64::NAN, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: TrainConfig = serde_json::from_value(json!({"hidden_size": 32})).unwrap();
        assert_eq!(cfg.hidden_size, 32);
        assert_eq!(cfg.k, 10);
    }

    #[test]
    fn test_loss_policy_parse() {
        assert_eq!("BEST".parse::<LossPolicy>(), Ok(LossPolicy::Best));
        assert!("median".parse::<LossPolicy>().is_err());
        assert_eq!(LossPolicy::Final.to_string(), "final");
    }
}
