//! Anchorline Core
//!
//! Core types shared across Anchorline components.
//!
//! This crate provides:
//! - Tagged records exchanged between classifiers, policy and orchestrator
//! - Error types and result handling
//! - Configuration as plain data with per-section partial merging
//! - A bounded ring buffer for every rolling history
//! - The per-conversation `Session` record

pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod types;

pub use config::{AnchorConfig, AnchorConfigPatch, BadgeGranularity, FallbackMode};
pub use error::{Error, Result};
pub use history::BoundedHistory;
pub use session::{InterventionRecord, Session};
pub use types::{
    ClaimKind, ClaimLabel, ContactKind, EmotionPattern, EmotionalAnalysis, EscalationLevel,
    FeedbackContext, FeedbackEntry, HumanOption, InterventionPolicy, LabeledOutput,
    OpposingGlance, Rating, RiskFactor, StanceAnalysis, StanceDirection, Topic, TrustDeltaModel,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AnchorConfig, AnchorConfigPatch};
    pub use crate::error::{Error, Result};
    pub use crate::history::BoundedHistory;
    pub use crate::session::Session;
    pub use crate::types::{
        EmotionalAnalysis, InterventionPolicy, LabeledOutput, StanceAnalysis, TrustDeltaModel,
    };
}
