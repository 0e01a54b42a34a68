//! Anchorline Session
//!
//! The session orchestrator: one per conversation, owning the session
//! record, the emotion and stance leaves, the feedback store and telemetry.
//! Escalations and other notifications go out on an `EventBus`.

pub mod events;
pub mod orchestrator;

pub use events::{AnchorEvent, EventBus};
pub use orchestrator::Orchestrator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::events::{AnchorEvent, EventBus};
    pub use crate::orchestrator::Orchestrator;
    pub use anchorline_core::prelude::*;
    pub use anchorline_core::{FeedbackContext, Rating};
}
