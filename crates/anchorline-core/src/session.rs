//! Per-conversation session record
//!
//! A `Session` is owned by exactly one orchestrator. Transitions consume the
//! session and return the next one, so there is never a second live handle
//! to mutate.

use crate::history::BoundedHistory;
use crate::types::{clamp_stance, EmotionalAnalysis, InterventionPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum entries kept in the intervention log
pub const INTERVENTION_LOG_CAPACITY: usize = 100;

/// Log entry for one processed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionRecord {
    /// Prompt count at decision time
    pub prompt_count: u64,

    /// Whether any intervention fired
    pub applied: bool,

    /// Serialized policy
    pub policy: String,

    pub timestamp: DateTime<Utc>,
}

impl InterventionRecord {
    pub fn from_policy(
        policy: &InterventionPolicy,
        prompt_count: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            prompt_count,
            applied: policy.any(),
            policy: serde_json::to_string(policy).unwrap_or_default(),
            timestamp,
        }
    }
}

/// Mutable state of one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,

    /// Monotonic; only reset by replacing the session
    pub prompt_count: u64,

    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,

    /// Stance score of the most recent analysed message
    pub current_stance: f32,

    pub latest_emotion: Option<EmotionalAnalysis>,

    pub interventions: BoundedHistory<InterventionRecord>,

    /// User-supplied overrides, interpreted by the caller
    pub preferences: BTreeMap<String, String>,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            prompt_count: 0,
            created_at: now,
            last_activity: now,
            current_stance: 0.0,
            latest_emotion: None,
            interventions: BoundedHistory::new(INTERVENTION_LOG_CAPACITY),
            preferences: BTreeMap::new(),
        }
    }

    /// Advance the prompt counter
    pub fn counted(mut self, now: DateTime<Utc>) -> Self {
        self.prompt_count = self.prompt_count.saturating_add(1);
        self.last_activity = now;
        self
    }

    /// Refresh the activity timestamp
    pub fn touched(mut self, now: DateTime<Utc>) -> Self {
        self.last_activity = now;
        self
    }

    /// Store this turn's analyses and log the decision
    pub fn with_turn(
        mut self,
        stance_score: f32,
        emotion: Option<EmotionalAnalysis>,
        policy: &InterventionPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        self.current_stance = clamp_stance(stance_score);
        if emotion.is_some() {
            self.latest_emotion = emotion;
        }
        self.interventions
            .push(InterventionRecord::from_policy(policy, self.prompt_count, now));
        self.last_activity = now;
        self
    }

    /// Share of logged turns on which an intervention fired.
    ///
    /// Measured over the intervention log, so it covers the most recent
    /// decided turns only. A prompt that has been counted but not yet
    /// decided does not dilute it.
    pub fn intervention_density(&self) -> f32 {
        if self.interventions.is_empty() {
            return 0.0;
        }
        let applied = self.interventions.iter().filter(|r| r.applied).count();
        applied as f32 / self.interventions.len() as f32
    }

    pub fn duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
