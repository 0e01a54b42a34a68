//! Event bus for escalations and other session notifications
//!
//! Subscription is registered here, not in configuration, so `AnchorConfig`
//! stays plain data. Publishing never blocks and never fails the turn.

use anchorline_core::{
    EmotionPattern, EscalationLevel, FeedbackEntry, InterventionPolicy, RiskFactor,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default number of buffered events per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnchorEvent {
    /// The emotion leaf asked for a human hand-off
    Escalation {
        session_id: String,
        level: EscalationLevel,
        patterns: Vec<EmotionPattern>,
        risk_factors: Vec<RiskFactor>,
        sentiment: f32,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// At least one intervention fired this turn
    InterventionApplied {
        session_id: String,
        prompt_count: u64,
        policy: InterventionPolicy,
        timestamp: DateTime<Utc>,
    },

    FeedbackRecorded {
        session_id: String,
        entry: FeedbackEntry,
    },
}

impl AnchorEvent {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Escalation { session_id, .. }
            | Self::InterventionApplied { session_id, .. }
            | Self::FeedbackRecorded { session_id, .. } => session_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Escalation { .. } => "escalation",
            Self::InterventionApplied { .. } => "intervention_applied",
            Self::FeedbackRecorded { .. } => "feedback_recorded",
        }
    }
}

/// Broadcasts session events to any number of subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AnchorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<AnchorEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: AnchorEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
