//! BERT tokenization for the ONNX backend
//!
//! Wraps a Hugging Face `tokenizer.json` (normalizer, pre-tokenizer,
//! WordPiece model and `[CLS] ... [SEP]` post-processor) and frames its
//! output to the fixed `[1, max_len]` shape the exported model takes.

use crate::error::BackendError;
use std::path::Path;
use tokenizers::Tokenizer;

const PAD_TOKEN: &str = "[PAD]";
const SEP_TOKEN: &str = "[SEP]";

/// Model-ready token ids for one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl Encoding {
    /// Number of non-padding positions
    pub fn len(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct BertTokenizer {
    inner: Tokenizer,
    pad_id: i64,
    sep_id: i64,
}

impl BertTokenizer {
    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let inner = Tokenizer::from_file(path).map_err(|e| {
            BackendError::Load(format!(
                "failed to load tokenizer {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_tokenizer(inner)
    }

    pub fn from_tokenizer(inner: Tokenizer) -> Result<Self, BackendError> {
        let special = |token: &str| {
            inner.token_to_id(token).map(i64::from).ok_or_else(|| {
                BackendError::Load(format!("tokenizer is missing special token {token}"))
            })
        };

        Ok(Self {
            pad_id: special(PAD_TOKEN)?,
            sep_id: special(SEP_TOKEN)?,
            inner,
        })
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    /// Split text into WordPiece tokens (without special tokens)
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>, BackendError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| BackendError::Inference(format!("tokenization failed: {e}")))?;
        Ok(encoding.get_tokens().to_vec())
    }

    /// Encode with special tokens, truncated or padded to exactly `max_len`
    ///
    /// Truncation keeps the trailing `[SEP]`.
    pub fn encode(&self, text: &str, max_len: usize) -> Result<Encoding, BackendError> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| BackendError::Inference(format!("tokenization failed: {e}")))?;

        let mut input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mut attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();

        if input_ids.len() > max_len {
            let keep = max_len.saturating_sub(1);
            input_ids.truncate(keep);
            attention_mask.truncate(keep);
            input_ids.push(self.sep_id);
            attention_mask.push(1);
        }
        input_ids.resize(max_len, self.pad_id);
        attention_mask.resize(max_len, 0);

        Ok(Encoding {
            input_ids,
            attention_mask,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    const VOCAB: &[&str] = &[
        "[PAD]", "[UNK]", "[CLS]", "[SEP]", "i", "love", "this", "product", "!", "un", "##believ",
        "##able", "cafe", "it", "'", "s", "«", "»", "¡", "¿", "great", "wow", "·",
    ];

    /// Write an uncased BERT `tokenizer.json` over `vocab` into `dir`
    pub(crate) fn write_tokenizer_json(dir: &Path, vocab: &[&str]) -> std::path::PathBuf {
        let ids: Map<String, Value> = vocab
            .iter()
            .enumerate()
            .map(|(id, token)| (token.to_string(), json!(id)))
            .collect();
        let index = |token: &str| vocab.iter().position(|t| *t == token).unwrap();

        let config = json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "BertPreTokenizer" },
            "post_processor": {
                "type": "BertProcessing",
                "sep": ["[SEP]", index("[SEP]")],
                "cls": ["[CLS]", index("[CLS]")]
            },
            "decoder": null,
            "model": {
                "type": "WordPiece",
                "unk_token": "[UNK]",
                "continuing_subword_prefix": "##",
                "max_input_chars_per_word": 100,
                "vocab": ids
            }
        });

        let path = dir.join("tokenizer.json");
        std::fs::write(&path, config.to_string()).unwrap();
        path
    }

    fn tokenizer() -> (tempfile::TempDir, BertTokenizer) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tokenizer_json(dir.path(), VOCAB);
        let tok = BertTokenizer::from_file(&path).unwrap();
        (dir, tok)
    }

    #[test]
    fn test_lowercases_and_splits_ascii_punctuation() {
        let (_dir, tok) = tokenizer();
        assert_eq!(
            tok.tokenize("I love this product!").unwrap(),
            vec!["i", "love", "this", "product", "!"]
        );
    }

    #[test]
    fn test_splits_unicode_punctuation() {
        let (_dir, tok) = tokenizer();
        assert_eq!(
            tok.tokenize("«great» ¡wow!").unwrap(),
            vec!["«", "great", "»", "¡", "wow", "!"]
        );
        assert_eq!(tok.tokenize("¿wow·great").unwrap(), vec!["¿", "wow", "·", "great"]);
    }

    #[test]
    fn test_wordpiece_continuations_and_unknown() {
        let (_dir, tok) = tokenizer();
        assert_eq!(
            tok.tokenize("Unbelievable zzz").unwrap(),
            vec!["un", "##believ", "##able", "[UNK]"]
        );
    }

    #[test]
    fn test_strips_accents() {
        let (_dir, tok) = tokenizer();
        assert_eq!(tok.tokenize("Café").unwrap(), vec!["cafe"]);
    }

    #[test]
    fn test_encode_frames_and_pads() {
        let (_dir, tok) = tokenizer();
        let encoding = tok.encode("I love this", 8).unwrap();

        assert_eq!(encoding.input_ids, vec![2, 4, 5, 6, 3, 0, 0, 0]);
        assert_eq!(encoding.attention_mask, vec![1, 1, 1, 1, 1, 0, 0, 0]);
        assert_eq!(encoding.len(), 5);
    }

    #[test]
    fn test_encode_truncation_keeps_sep() {
        let (_dir, tok) = tokenizer();
        let encoding = tok.encode("I love this product!", 4).unwrap();

        assert_eq!(encoding.input_ids, vec![2, 4, 5, 3]);
        assert_eq!(encoding.attention_mask, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_missing_special_token_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tokenizer_json(dir.path(), &["[UNK]", "[CLS]", "[SEP]", "hello"]);

        let err = BertTokenizer::from_file(&path).err().unwrap();
        assert!(matches!(err, BackendError::Load(msg) if msg.contains("[PAD]")));
    }

    #[test]
    fn test_unreadable_tokenizer_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, "not json").unwrap();

        let err = BertTokenizer::from_file(&path).err().unwrap();
        assert!(matches!(err, BackendError::Load(_)));
    }
}
