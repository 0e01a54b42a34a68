//! Per-turn intervention decision
//!
//! The decision is a state transition: `(Session, TurnSignals) -> (Session', InterventionPolicy)`.
//! Leaf verdicts (opposing view, escalation) arrive already decided in the
//! signals; this module only combines them with the cadence and reflection
//! rules and logs the result on the session.

use crate::cadence::should_apply_red_reply;
use anchorline_core::{AnchorConfig, EmotionalAnalysis, InterventionPolicy, Session, StanceAnalysis};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Everything the leaves observed about one incoming message
#[derive(Debug, Clone)]
pub struct TurnSignals {
    /// Length of the message in characters
    pub message_chars: usize,

    /// `None` when emotion analysis is disabled
    pub emotion: Option<EmotionalAnalysis>,

    /// `None` when stance analysis is disabled
    pub stance: Option<StanceAnalysis>,

    /// Stance leaf verdict
    pub show_opposing_view: bool,

    /// Emotion leaf verdict
    pub escalate_to_human: bool,

    pub now: DateTime<Utc>,
}

impl TurnSignals {
    pub fn new(message: &str, now: DateTime<Utc>) -> Self {
        Self {
            message_chars: message.chars().count(),
            emotion: None,
            stance: None,
            show_opposing_view: false,
            escalate_to_human: false,
            now,
        }
    }
}

/// The configuration slice the decision depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionRules {
    pub cadence_interval: u32,
    pub stance_enabled: bool,
    pub emotion_enabled: bool,
    pub reflection_enabled: bool,
    pub reflection_length_threshold: usize,
    pub reflection_prompt_interval: u64,
}

impl DecisionRules {
    pub fn from_config(config: &AnchorConfig) -> Self {
        Self {
            cadence_interval: config.cadence.interval,
            stance_enabled: config.stance.enabled,
            emotion_enabled: config.emotion.enabled,
            reflection_enabled: config.reflection.enabled,
            reflection_length_threshold: config.reflection.length_threshold,
            reflection_prompt_interval: config.reflection.prompt_interval,
        }
    }

    /// Reflection fires on an elevated emotional state, a long message, or
    /// every `reflection_prompt_interval` prompts
    pub fn reflection_due(&self, prompt_count: u64, signals: &TurnSignals) -> bool {
        if !self.reflection_enabled {
            return false;
        }

        let elevated = signals
            .emotion
            .as_ref()
            .is_some_and(|e| e.escalation_level.is_elevated());
        let long_message = signals.message_chars > self.reflection_length_threshold;
        let periodic = self.reflection_prompt_interval > 0
            && prompt_count > 0
            && prompt_count % self.reflection_prompt_interval == 0;

        elevated || long_message || periodic
    }
}

impl Default for DecisionRules {
    fn default() -> Self {
        Self::from_config(&AnchorConfig::default())
    }
}

/// Combine the leaf verdicts into this turn's policy
pub fn decide(prompt_count: u64, signals: &TurnSignals, rules: &DecisionRules) -> InterventionPolicy {
    let stance_score = signals.stance.as_ref().map_or(0.0, |s| s.score);

    InterventionPolicy {
        apply_red_reply: should_apply_red_reply(prompt_count, rules.cadence_interval),
        show_opposing_view: rules.stance_enabled && signals.show_opposing_view,
        trigger_reflection: rules.reflection_due(prompt_count, signals),
        escalate_to_human: rules.emotion_enabled && signals.escalate_to_human,
        stance_score,
    }
}

/// Decide the turn and fold it into the session.
///
/// A disabled stance leaf leaves the session's current stance untouched.
pub fn transition(
    session: Session,
    signals: TurnSignals,
    rules: &DecisionRules,
) -> (Session, InterventionPolicy) {
    let policy = decide(session.prompt_count, &signals, rules);
    let stance_score = signals
        .stance
        .as_ref()
        .map_or(session.current_stance, |s| s.score);

    debug!(
        session_id = %session.id,
        prompt_count = session.prompt_count,
        red_reply = policy.apply_red_reply,
        opposing_view = policy.show_opposing_view,
        reflection = policy.trigger_reflection,
        escalate = policy.escalate_to_human,
        stance_score,
        "Intervention policy decided"
    );

    let session = session.with_turn(stance_score, signals.emotion, &policy, signals.now);
    (session, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorline_core::EscalationLevel;

    fn session_at(count: u64) -> Session {
        let now = Utc::now();
        (0..count).fold(Session::new(now), |s, _| s.counted(now))
    }

    fn emotion(level: EscalationLevel) -> EmotionalAnalysis {
        EmotionalAnalysis {
            escalation_level: level,
            ..EmotionalAnalysis::neutral(Utc::now())
        }
    }

    #[test]
    fn test_red_reply_follows_interval() {
        let rules = DecisionRules::default();
        let signals = TurnSignals::new("hello", Utc::now());

        let fired: Vec<u64> = (1..=10)
            .filter(|n| decide(*n, &signals, &rules).apply_red_reply)
            .collect();
        assert_eq!(fired, vec![5, 10]);
    }

    #[test]
    fn test_reflection_triggers() {
        let rules = DecisionRules::default();
        let now = Utc::now();

        let quiet = TurnSignals::new("hello", now);
        assert!(!rules.reflection_due(3, &quiet));
        assert!(rules.reflection_due(10, &quiet));

        let long = TurnSignals::new(&"a".repeat(501), now);
        assert!(rules.reflection_due(3, &long));

        let mut upset = TurnSignals::new("hello", now);
        upset.emotion = Some(emotion(EscalationLevel::Medium));
        assert!(rules.reflection_due(3, &upset));

        let off = DecisionRules {
            reflection_enabled: false,
            ..rules
        };
        assert!(!off.reflection_due(10, &long));
    }

    #[test]
    fn test_zero_reflection_interval_never_fires_periodically() {
        let rules = DecisionRules {
            reflection_prompt_interval: 0,
            ..Default::default()
        };
        let signals = TurnSignals::new("hello", Utc::now());
        assert!(!rules.reflection_due(10, &signals));
    }

    #[test]
    fn test_disabled_leaves_suppress_verdicts() {
        let rules = DecisionRules {
            stance_enabled: false,
            emotion_enabled: false,
            ..Default::default()
        };
        let mut signals = TurnSignals::new("hello", Utc::now());
        signals.show_opposing_view = true;
        signals.escalate_to_human = true;

        let policy = decide(1, &signals, &rules);
        assert!(!policy.show_opposing_view);
        assert!(!policy.escalate_to_human);
    }

    #[test]
    fn test_transition_logs_and_stores() {
        let now = Utc::now();
        let mut signals = TurnSignals::new("hello", now);
        signals.stance = Some(StanceAnalysis {
            score: 2.5,
            ..StanceAnalysis::neutral(now)
        });
        signals.emotion = Some(emotion(EscalationLevel::High));
        signals.escalate_to_human = true;

        let (session, policy) = transition(session_at(5), signals, &DecisionRules::default());

        assert!(policy.apply_red_reply);
        assert!(policy.escalate_to_human);
        assert!(policy.trigger_reflection);
        assert_eq!(policy.stance_score, 2.5);

        assert_eq!(session.current_stance, 2.5);
        assert_eq!(
            session.latest_emotion.as_ref().map(|e| e.escalation_level),
            Some(EscalationLevel::High)
        );
        assert_eq!(session.interventions.len(), 1);
        let record = session.interventions.latest().unwrap();
        assert!(record.applied);
        assert_eq!(record.prompt_count, 5);
    }

    #[test]
    fn test_transition_without_stance_keeps_previous() {
        let mut session = session_at(1);
        session.current_stance = -1.5;

        let signals = TurnSignals::new("hello", Utc::now());
        let (session, policy) = transition(session, signals, &DecisionRules::default());

        assert_eq!(session.current_stance, -1.5);
        assert_eq!(policy.stance_score, 0.0);
        assert!(!session.interventions.latest().unwrap().applied);
    }
}
