//! Lexicon-based sentiment scoring
//!
//! Bag-of-words: counts whole-word hits from fixed positive and negative
//! lists and returns `(pos - neg) / (pos + neg)`, or 0 with no hits.

use aho_corasick::{AhoCorasick, MatchKind};
use anchorline_core::types::clamp_signed_unit;
use anchorline_core::{Error, Result};

const POSITIVE: &[&str] = &[
    "good",
    "great",
    "happy",
    "love",
    "wonderful",
    "excited",
    "grateful",
    "glad",
    "hopeful",
    "calm",
    "better",
    "amazing",
    "fantastic",
    "joy",
    "thankful",
    "proud",
    "relieved",
    "excellent",
    "peaceful",
    "optimistic",
];

const NEGATIVE: &[&str] = &[
    "sad",
    "bad",
    "terrible",
    "awful",
    "hate",
    "angry",
    "depressed",
    "hopeless",
    "worthless",
    "lonely",
    "anxious",
    "scared",
    "afraid",
    "miserable",
    "hurt",
    "pain",
    "cry",
    "crying",
    "upset",
    "die",
    "kill",
    "dead",
    "exhausted",
    "worst",
    "horrible",
    "empty",
    "alone",
    "broken",
    "numb",
    "desperate",
];

pub struct SentimentLexicon {
    positive: AhoCorasick,
    negative: AhoCorasick,
}

impl SentimentLexicon {
    pub fn new() -> Result<Self> {
        Ok(Self {
            positive: build(POSITIVE, "positive")?,
            negative: build(NEGATIVE, "negative")?,
        })
    }

    /// Sentiment in [-1, 1]
    pub fn score(&self, text: &str) -> f32 {
        let positive = count_words(&self.positive, text) as f32;
        let negative = count_words(&self.negative, text) as f32;
        let total = positive + negative;

        if total == 0.0 {
            return 0.0;
        }

        clamp_signed_unit((positive - negative) / total)
    }
}

fn build(words: &[&str], kind: &str) -> Result<AhoCorasick> {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(words)
        .map_err(|e| Error::classifier(format!("Failed to build {kind} sentiment matcher: {e}")))
}

// Hits embedded in a longer word ("sad" in "crusade") are skipped.
fn count_words(matcher: &AhoCorasick, text: &str) -> usize {
    let bytes = text.as_bytes();
    matcher
        .find_iter(text)
        .filter(|m| {
            let before = m.start() == 0 || !bytes[m.start() - 1].is_ascii_alphanumeric();
            let after = m.end() == bytes.len() || !bytes[m.end()].is_ascii_alphanumeric();
            before && after
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_without_hits() {
        let lexicon = SentimentLexicon::new().unwrap();
        assert_eq!(lexicon.score("The meeting is at noon."), 0.0);
    }

    #[test]
    fn test_polarity() {
        let lexicon = SentimentLexicon::new().unwrap();
        assert_eq!(lexicon.score("I feel great and happy"), 1.0);
        assert_eq!(lexicon.score("I feel sad and hopeless"), -1.0);

        let mixed = lexicon.score("good day, bad night, awful morning");
        assert!(mixed < 0.0 && mixed > -1.0);
    }

    #[test]
    fn test_embedded_words_ignored() {
        let lexicon = SentimentLexicon::new().unwrap();
        assert_eq!(lexicon.score("The crusade was on a diet"), 0.0);
    }
}
