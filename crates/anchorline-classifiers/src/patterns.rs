//! Named, case-insensitive pattern groups
//!
//! Each group compiles its alternatives into a single word-bounded regex.
//! Groups are independent: a text can match any number of them.

use anchorline_core::{Error, Result};
use regex::Regex;

/// A labelled set of regex alternatives
#[derive(Debug, Clone)]
pub struct PatternGroup<L> {
    label: L,
    regex: Regex,
}

impl<L: Copy> PatternGroup<L> {
    /// Build a group from regex fragments.
    ///
    /// Fragments are joined with `|` and wrapped in `\b(?:...)\b`,
    /// matched case-insensitively.
    pub fn new(label: L, fragments: &[&str]) -> Result<Self> {
        let source = format!(r"(?i)\b(?:{})\b", fragments.join("|"));
        let regex = Regex::new(&source)
            .map_err(|e| Error::classifier(format!("Failed to build pattern group: {e}")))?;

        Ok(Self { label, regex })
    }

    pub fn label(&self) -> L {
        self.label
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Number of non-overlapping matches
    pub fn count(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }
}

/// Build one group per `(label, fragments)` entry
pub fn build_groups<L: Copy>(table: &[(L, &[&str])]) -> Result<Vec<PatternGroup<L>>> {
    table
        .iter()
        .map(|(label, fragments)| PatternGroup::new(*label, fragments))
        .collect()
}

/// Labels of every group matching `text`, in table order
pub fn matching_labels<L: Copy>(groups: &[PatternGroup<L>], text: &str) -> Vec<L> {
    groups
        .iter()
        .filter(|g| g.is_match(text))
        .map(|g| g.label())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundaries() {
        let group = PatternGroup::new("tech", &["ai", "big tech"]).unwrap();
        assert!(group.is_match("What will AI do next?"));
        assert!(group.is_match("Regulating Big Tech"));
        assert!(!group.is_match("She said hello"));
    }

    #[test]
    fn test_count() {
        let group = PatternGroup::new((), &["tax(?:es)?"]).unwrap();
        assert_eq!(group.count("Taxes, taxes and more tax."), 3);
        assert_eq!(group.count("nothing here"), 0);
    }

    #[test]
    fn test_invalid_fragment() {
        let result = PatternGroup::new((), &["(unclosed"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_matching_labels() {
        let groups = build_groups(&[(1, &["alpha"][..]), (2, &["beta"][..]), (3, &["gamma"][..])])
            .unwrap();
        assert_eq!(matching_labels(&groups, "alpha and gamma"), vec![1, 3]);
    }
}
