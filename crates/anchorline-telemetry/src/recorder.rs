//! Opt-in session telemetry
//!
//! Nothing is recorded unless `telemetry.opt_in` is set. With `anonymized`
//! the session id is hashed and message text is dropped before it reaches
//! the audit trail.

use crate::audit::{anonymize_session_id, AuditEvent, AuditEventKind, AuditSeverity, AuditTrail};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use anchorline_core::config::TelemetryConfig;
use anchorline_core::{EmotionalAnalysis, EscalationLevel, FeedbackEntry, InterventionPolicy, Session};
use serde_json::json;
use tracing::debug;

#[derive(Clone, Default)]
pub struct TelemetryRecorder {
    config: TelemetryConfig,
    trail: AuditTrail,
    metrics: MetricsCollector,
}

impl TelemetryRecorder {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            trail: AuditTrail::new(),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.opt_in
    }

    /// Takes effect for subsequent events; already-recorded events are kept
    pub fn set_config(&mut self, config: TelemetryConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn record_prompt(&self) {
        if self.enabled() {
            self.metrics.record_prompt();
        }
    }

    pub fn record_decision(&mut self, session: &Session, policy: &InterventionPolicy) {
        if !self.enabled() {
            return;
        }
        self.metrics.record_decision(policy);

        let event = self
            .event(AuditEventKind::Decision, session)
            .with_data(policy)
            .at(session.last_activity);
        self.trail.add_event(event);
    }

    pub fn record_escalation(&mut self, session: &Session, analysis: &EmotionalAnalysis, message: &str) {
        if !self.enabled() {
            return;
        }
        self.metrics.record_escalation(analysis.escalation_level);

        let severity = match analysis.escalation_level {
            EscalationLevel::High => AuditSeverity::Critical,
            EscalationLevel::Medium => AuditSeverity::High,
            EscalationLevel::Low => AuditSeverity::Warning,
        };
        let mut event = self
            .event(AuditEventKind::Escalation, session)
            .with_severity(severity)
            .with_data(json!({
                "level": analysis.escalation_level,
                "patterns": analysis.patterns,
                "risk_factors": analysis.risk_factors,
                "sentiment": analysis.sentiment,
            }))
            .at(analysis.timestamp);
        if !self.config.anonymized {
            event = event.with_message(message);
        }
        self.trail.add_event(event);
    }

    pub fn record_feedback(&mut self, session: &Session, entry: &FeedbackEntry) {
        if !self.enabled() {
            return;
        }
        self.metrics.record_feedback(entry.rating);

        let mut data = json!({
            "rating": entry.rating,
            "context": entry.context,
        });
        if !self.config.anonymized {
            data["reason"] = json!(entry.reason);
        }
        let event = self
            .event(AuditEventKind::Feedback, session)
            .with_data(data)
            .at(entry.timestamp);
        self.trail.add_event(event);
    }

    /// Mark the boundary between two sessions in the trail
    pub fn record_reset(&mut self, previous: &Session) {
        if !self.enabled() {
            return;
        }
        let event = self
            .event(AuditEventKind::SessionReset, previous)
            .with_data(json!({ "prompt_count": previous.prompt_count }));
        self.trail.add_event(event);
    }

    pub fn record_config_update(&mut self, session: &Session) {
        if !self.enabled() {
            return;
        }
        let event = self.event(AuditEventKind::ConfigUpdated, session);
        self.trail.add_event(event);
    }

    pub fn trail(&self) -> &AuditTrail {
        &self.trail
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn event(&self, kind: AuditEventKind, session: &Session) -> AuditEvent {
        let session_ref = if self.config.anonymized {
            anonymize_session_id(&session.id)
        } else {
            session.id.clone()
        };
        debug!(kind = kind.as_str(), prompt_count = session.prompt_count, "Telemetry event");
        AuditEvent::new(kind, session_ref, session.prompt_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::DEFAULT_AUDIT_CAPACITY;
    use anchorline_core::{FeedbackContext, Rating};
    use chrono::Utc;

    fn crisis() -> EmotionalAnalysis {
        EmotionalAnalysis {
            sentiment: -0.9,
            escalation_level: EscalationLevel::High,
            ..EmotionalAnalysis::neutral(Utc::now())
        }
    }

    fn opted_in(anonymized: bool) -> TelemetryRecorder {
        TelemetryRecorder::new(TelemetryConfig {
            anonymized,
            opt_in: true,
        })
    }

    #[test]
    fn test_nothing_recorded_without_opt_in() {
        let mut recorder = TelemetryRecorder::default();
        let session = Session::default();

        recorder.record_prompt();
        recorder.record_decision(&session, &InterventionPolicy::default());
        recorder.record_escalation(&session, &crisis(), "help");

        assert!(recorder.trail().is_empty());
        assert_eq!(recorder.metrics().prompts, 0);
        assert_eq!(recorder.metrics().decisions, 0);
    }

    #[test]
    fn test_anonymized_drops_identity_and_text() {
        let mut recorder = opted_in(true);
        let session = Session::default();

        recorder.record_escalation(&session, &crisis(), "I feel terrible");

        let event = &recorder.trail().events()[0];
        assert_ne!(event.session_ref, session.id);
        assert!(event.message.is_none());
        assert_eq!(event.severity, AuditSeverity::Critical);
        assert!(recorder.trail().verify());
    }

    #[test]
    fn test_identified_keeps_session_and_text() {
        let mut recorder = opted_in(false);
        let session = Session::default();

        recorder.record_escalation(&session, &crisis(), "I feel terrible");
        recorder.record_feedback(
            &session,
            &FeedbackEntry {
                rating: Rating::Down,
                reason: "too often".to_string(),
                context: FeedbackContext::Cadence,
                prompt_count: 0,
                timestamp: Utc::now(),
            },
        );

        let events = recorder.trail().events();
        assert_eq!(events[0].session_ref, session.id);
        assert_eq!(events[0].message.as_deref(), Some("I feel terrible"));
        assert!(events[1].data.as_deref().unwrap().contains("too often"));
        assert_eq!(recorder.metrics().feedback_down, 1);
    }

    #[test]
    fn test_long_session_trail_is_bounded() {
        let mut recorder = opted_in(true);
        let session = Session::default();

        for _ in 0..DEFAULT_AUDIT_CAPACITY + 250 {
            recorder.record_decision(&session, &InterventionPolicy::default());
        }

        assert_eq!(recorder.trail().len(), DEFAULT_AUDIT_CAPACITY);
        assert!(recorder.trail().verify());
        assert_eq!(recorder.metrics().decisions, (DEFAULT_AUDIT_CAPACITY + 250) as u64);
    }

    #[test]
    fn test_decisions_chain() {
        let mut recorder = opted_in(true);
        let session = Session::default();
        let policy = InterventionPolicy {
            apply_red_reply: true,
            ..Default::default()
        };

        recorder.record_decision(&session, &policy);
        recorder.record_decision(&session, &InterventionPolicy::default());
        recorder.record_reset(&session);

        assert_eq!(recorder.trail().len(), 3);
        assert!(recorder.trail().verify());
        assert_eq!(recorder.metrics().red_replies, 1);
    }
}
