// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds the word vocabulary from the dataset and persists it as
// a HuggingFace tokenizer.json, so training and scoring always map
// words to the same embedding rows.
//
// The vocabulary is word-level over whitespace tokens, the same
// tokenisation the dataset reader applies. Case is preserved.
// Ids 0 and 1 are reserved for [PAD] and [UNK]; every other word
// gets the next id in order of descending frequency (ties broken
// alphabetically so the file is reproducible).
//
// tokenizer.json is written by hand rather than through a
// tokenizers trainer.

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::Tokenizer;

use crate::domain::instance::WmtInstance;

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    pub fn build_and_save(
        &self,
        instances:  &[WmtInstance],
        vocab_size: usize,
    ) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let words = build_vocabulary(instances, vocab_size);

        let mut vocab = serde_json::json!({
            "[PAD]": PAD_ID,
            "[UNK]": UNK_ID,
        });
        for (i, word) in words.iter().enumerate() {
            vocab[word.as_str()] = serde_json::json!(i as u32 + 2);
        }

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": PAD_ID, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": UNK_ID, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": {
                "type": "WhitespaceSplit"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.path();
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} words, saved to '{}'",
            words.len() + 2,
            tok_path.display()
        );

        self.load()
    }
}

/// Words of every MT and reference sentence, most frequent first,
/// capped so that the two special tokens still fit in `vocab_size`.
pub fn build_vocabulary(instances: &[WmtInstance], vocab_size: usize) -> Vec<String> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for inst in instances {
        for word in inst.mt.iter().chain(&inst.reference) {
            *freq.entry(word.as_str()).or_insert(0) += 1;
        }
    }
    freq.remove("[PAD]");
    freq.remove("[UNK]");

    let mut words: Vec<(&str, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    words.truncate(vocab_size.saturating_sub(2));
    words.into_iter().map(|(w, _)| w.to_string()).collect()
}

/// Token ids for a whitespace-tokenised sentence.
pub fn encode_words(tokenizer: &Tokenizer, words: &[String]) -> Result<Vec<u32>> {
    if words.is_empty() {
        return Ok(Vec::new());
    }
    let enc = tokenizer
        .encode(words.join(" "), false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    Ok(enc.get_ids().to_vec())
}
