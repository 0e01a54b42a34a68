//! Collaborator traits for output-side processing
//!
//! Claim labelling and counterpoint generation are async because a full
//! integration may hand them to a generative model. The heuristic
//! implementations in this crate never suspend.

use anchorline_core::config::{AnchorConfig, BadgeGranularity, FallbackMode};
use anchorline_core::{LabeledOutput, OpposingGlance, Result, StanceAnalysis};
use async_trait::async_trait;

/// Labels the sentences of a model response
#[async_trait]
pub trait ClaimLabeler: Send + Sync {
    /// Label `text` and produce badge-annotated output
    async fn label(&self, text: &str, options: &LabelingOptions) -> Result<LabeledOutput>;

    /// Get the labeler name
    fn name(&self) -> &str;
}

/// Produces an opposing-view artifact for a stance analysis
#[async_trait]
pub trait CounterpointGenerator: Send + Sync {
    async fn opposing_glance(&self, analysis: &StanceAnalysis) -> Result<OpposingGlance>;

    /// Get the generator name
    fn name(&self) -> &str;
}

/// Per-call labelling options derived from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelingOptions {
    /// Where badges go; `Off` leaves the text untouched
    pub granularity: BadgeGranularity,

    /// Factual claims without a source are labelled unverified
    pub require_resolvable: bool,

    pub fallback_mode: FallbackMode,
}

impl LabelingOptions {
    pub fn from_config(config: &AnchorConfig) -> Self {
        let granularity = if config.badges.enabled {
            config.badges.granularity
        } else {
            BadgeGranularity::Off
        };

        Self {
            granularity,
            require_resolvable: config.cite_gate.require_resolvable,
            fallback_mode: config.cite_gate.fallback_mode,
        }
    }
}

impl Default for LabelingOptions {
    fn default() -> Self {
        Self::from_config(&AnchorConfig::default())
    }
}
