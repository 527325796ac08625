// ============================================================
// Layer 3 — WmtInstance Domain Type
// ============================================================
// One labelled example from the WMT metrics data:
//   - the machine-translated sentence (already split into words)
//   - the human reference translation (already split into words)
//   - the human-judged quality score for the MT output
//   - the origin: which source dataset the row came from
//     (e.g. "newstest2015", "newstest2016", ...)
//
// The origin is what the k-fold splitter stratifies on, so every
// fold gets a proportional share of each source.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// An immutable labelled sentence pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmtInstance {
    /// Machine-translated sentence, one entry per whitespace token
    pub mt: Vec<String>,

    /// Reference translation, one entry per whitespace token
    pub reference: Vec<String>,

    /// Human-judged quality score for `mt`
    pub human_score: f64,

    /// Source dataset label, used as the stratification key
    pub origin: String,
}

impl WmtInstance {
    /// Build an instance from raw sentence text.
    /// Sentences are tokenised by splitting on whitespace.
    pub fn new(
        mt_text:     &str,
        ref_text:    &str,
        human_score: f64,
        origin:      impl Into<String>,
    ) -> Self {
        Self {
            mt:          mt_text.split_whitespace().map(str::to_owned).collect(),
            reference:   ref_text.split_whitespace().map(str::to_owned).collect(),
            human_score,
            origin:      origin.into(),
        }
    }

    /// The origin label, or `None` if the row carries no origin.
    pub fn origin(&self) -> Option<&str> {
        let origin = self.origin.trim();
        if origin.is_empty() { None } else { Some(origin) }
    }

    /// MT sentence re-joined with single spaces
    pub fn mt_text(&self) -> String {
        self.mt.join(" ")
    }

    /// Reference sentence re-joined with single spaces
    pub fn reference_text(&self) -> String {
        self.reference.join(" ")
    }
}

/// Grouping function used for stratified splitting: an instance's origin.
pub fn origin_of(instance: &WmtInstance) -> Option<String> {
    instance.origin().map(str::to_owned)
}
