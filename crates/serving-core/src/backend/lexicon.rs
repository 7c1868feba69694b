//! Lexicon-based sentiment classifier
//!
//! Used when no ONNX model is deployed (local development, smoke tests).
//! Scores are a sum of word polarities; a negator flips the next
//! sentiment-bearing word. Deterministic for a given input.

use super::{BackendLoader, Classification, Classifier};
use crate::error::BackendError;
use std::collections::HashMap;

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "awesome", "best", "brilliant", "delightful", "enjoy", "enjoyed", "excellent",
    "fantastic", "favorite", "fine", "good", "great", "happy", "like", "love", "loved", "nice",
    "okay", "perfect", "pleasant", "recommend", "superb", "wonderful", "works",
];

const NEGATIVE_WORDS: &[&str] = &[
    "awful", "bad", "boring", "broken", "disappointed", "disappointing", "hate", "hated",
    "horrible", "poor", "sad", "terrible", "ugly", "useless", "waste", "worse", "worst", "wrong",
];

const NEGATORS: &[&str] = &["not", "never", "no", "isn't", "wasn't", "don't", "didn't", "can't"];

/// Weight applied to the raw score before the logistic squash
const SCORE_SCALE: f64 = 1.5;

#[derive(Debug, Clone, Default)]
pub struct LexiconLoader;

impl LexiconLoader {
    pub fn new() -> Self {
        Self
    }
}

impl BackendLoader for LexiconLoader {
    fn load(&self) -> Result<Box<dyn Classifier>, BackendError> {
        let mut polarity = HashMap::new();
        polarity.extend(POSITIVE_WORDS.iter().map(|w| (*w, 1.0_f64)));
        polarity.extend(NEGATIVE_WORDS.iter().map(|w| (*w, -1.0_f64)));
        Ok(Box::new(LexiconClassifier { polarity }))
    }

    fn describe(&self) -> String {
        "lexicon".to_string()
    }
}

struct LexiconClassifier {
    polarity: HashMap<&'static str, f64>,
}

impl LexiconClassifier {
    fn score(&self, text: &str) -> f64 {
        let mut score = 0.0;
        let mut negate = false;

        let lowered = text.to_lowercase();
        let words = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty());

        for word in words {
            if NEGATORS.contains(&word) {
                negate = true;
                continue;
            }
            if let Some(&value) = self.polarity.get(word) {
                score += if negate { -value } else { value };
                negate = false;
            }
        }
        score
    }
}

impl Classifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Result<Classification, BackendError> {
        let score = self.score(text);
        let positive = 1.0 / (1.0 + (-SCORE_SCALE * score).exp());

        // Neutral text resolves to POSITIVE
        Ok(if positive >= 0.5 {
            Classification::new("POSITIVE", positive)
        } else {
            Classification::new("NEGATIVE", 1.0 - positive)
        })
    }
}
