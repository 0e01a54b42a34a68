//! Anchorline Policy
//!
//! Deterministic decision layer between the classifiers and the session:
//! - Cadence: periodic "red reply" interruptions, prompt tally, break reminder
//! - Feedback store: the trust-delta model tuned by passive and explicit signals
//! - Engine: combines leaf verdicts into a per-turn `InterventionPolicy`
//! - Modifications: text injections that realise a decision on model output

pub mod cadence;
pub mod engine;
pub mod feedback;
pub mod modifications;

pub use cadence::{
    render_tally, should_apply_red_reply, should_show_break_reminder, suggest_interval,
    CadenceVerdict,
};
pub use engine::{decide, transition, DecisionRules, TurnSignals};
pub use feedback::FeedbackStore;
pub use modifications::{apply_modifications, InjectPosition, TextModification};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cadence::CadenceVerdict;
    pub use crate::engine::{transition, DecisionRules, TurnSignals};
    pub use crate::feedback::FeedbackStore;
    pub use crate::modifications::{apply_modifications, TextModification};
}
