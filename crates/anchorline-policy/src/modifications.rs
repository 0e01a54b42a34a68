//! Text injections applied to processed model output
//!
//! Cadence framing, tallies and counter-perspectives are all expressed as
//! `TextModification`s and applied in one pass.

use serde::{Deserialize, Serialize};

/// Where injected content goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InjectPosition {
    Before,
    #[default]
    After,
}

/// A single injection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextModification {
    /// Content to inject
    pub content: String,

    /// Where to inject it
    #[serde(default)]
    pub position: InjectPosition,
}

impl TextModification {
    pub fn new(content: impl Into<String>, position: InjectPosition) -> Self {
        Self {
            content: content.into(),
            position,
        }
    }
}

/// Apply modifications in order.
///
/// `Before` injections are prepended so the first one listed ends up
/// outermost; `After` injections are appended in list order.
pub fn apply_modifications(text: &str, modifications: &[TextModification]) -> String {
    let mut prefix = String::new();
    let mut suffix = String::new();

    for modification in modifications {
        match modification.position {
            InjectPosition::Before => prefix.push_str(&modification.content),
            InjectPosition::After => suffix.push_str(&modification.content),
        }
    }

    let mut result = String::with_capacity(prefix.len() + text.len() + suffix.len());
    result.push_str(&prefix);
    result.push_str(text);
    result.push_str(&suffix);
    result
}
