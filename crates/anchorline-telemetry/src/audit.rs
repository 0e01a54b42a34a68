//! Hash-chained intervention audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

/// Events kept before the oldest is evicted
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// Audit trail with hash-chained events for tamper detection.
///
/// Bounded: past capacity the oldest event is dropped and its hash becomes
/// the anchor the retained chain is verified from.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    events: VecDeque<AuditEvent>,
    capacity: usize,
    anchor: Option<String>,
    chain_hash: Option<String>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_AUDIT_CAPACITY)),
            capacity,
            anchor: None,
            chain_hash: None,
        }
    }

    /// Chain and append an event, evicting the oldest when full
    pub fn add_event(&mut self, event: AuditEvent) {
        let mut event = event;
        event.previous_hash = self.chain_hash.clone();

        let hash = compute_hash(&event);
        event.hash = Some(hash.clone());

        if self.events.len() >= self.capacity {
            if let Some(evicted) = self.events.pop_front() {
                self.anchor = evicted.hash;
            }
        }

        self.chain_hash = Some(hash);
        self.events.push_back(event);
    }

    /// Verify the integrity of the retained trail
    pub fn verify(&self) -> bool {
        let mut prev_hash: Option<String> = self.anchor.clone();

        for event in &self.events {
            if event.previous_hash != prev_hash {
                return false;
            }

            if event.hash.as_deref() != Some(compute_hash(event).as_str()) {
                return false;
            }

            prev_hash = event.hash.clone();
        }

        true
    }

    /// Retained events, oldest first
    pub fn events(&self) -> &VecDeque<AuditEvent> {
        &self.events
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hash of the last evicted event, if any
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Export as JSON lines
    pub fn to_json_lines(&self) -> anchorline_core::Result<String> {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.anchor = None;
        self.chain_hash = None;
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

// Everything except `hash` itself
fn compute_hash(event: &AuditEvent) -> String {
    let mut hasher = Sha256::new();

    hasher.update(event.kind.as_str().as_bytes());
    hasher.update(event.session_ref.as_bytes());
    hasher.update(event.prompt_count.to_le_bytes());
    if let Some(ref data) = event.data {
        hasher.update(data.as_bytes());
    }
    if let Some(ref message) = event.message {
        hasher.update(message.as_bytes());
    }
    hasher.update(event.timestamp.to_rfc3339().as_bytes());
    hasher.update(event.severity.as_str().as_bytes());
    if let Some(ref prev) = event.previous_hash {
        hasher.update(prev.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// SHA-256 of a session id, shortened to 16 hex chars
pub fn anonymize_session_id(session_id: &str) -> String {
    let digest = Sha256::digest(session_id.as_bytes());
    format!("{:x}", digest)[..16].to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    Decision,
    Escalation,
    Feedback,
    SessionReset,
    ConfigUpdated,
}

impl AuditEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Escalation => "escalation",
            Self::Feedback => "feedback",
            Self::SessionReset => "session_reset",
            Self::ConfigUpdated => "config_updated",
        }
    }
}

/// A single audit event in the trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub kind: AuditEventKind,

    /// Session id, or its hash when anonymized
    pub session_ref: String,

    pub prompt_count: u64,

    /// Event data (JSON serialized)
    pub data: Option<String>,

    /// Raw user message; never set when anonymized
    pub message: Option<String>,

    pub timestamp: DateTime<Utc>,

    pub hash: Option<String>,

    /// Hash of previous event (for chaining)
    pub previous_hash: Option<String>,

    pub severity: AuditSeverity,
}

impl AuditEvent {
    pub fn new(kind: AuditEventKind, session_ref: impl Into<String>, prompt_count: u64) -> Self {
        Self {
            kind,
            session_ref: session_ref.into(),
            prompt_count,
            data: None,
            message: None,
            timestamp: Utc::now(),
            hash: None,
            previous_hash: None,
            severity: AuditSeverity::Info,
        }
    }

    /// Set event data
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_string(&data).ok();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    High,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_trail() {
        let mut trail = AuditTrail::new();

        trail.add_event(AuditEvent::new(AuditEventKind::Decision, "s1", 1));
        trail.add_event(AuditEvent::new(AuditEventKind::Feedback, "s1", 1));

        assert!(trail.verify());
        assert_eq!(trail.len(), 2);
        assert_eq!(
            trail.events()[1].previous_hash,
            trail.events()[0].hash
        );
    }

    #[test]
    fn test_tamper_detection() {
        let mut trail = AuditTrail::new();

        trail.add_event(AuditEvent::new(AuditEventKind::Decision, "s1", 1));
        trail.add_event(AuditEvent::new(AuditEventKind::Decision, "s1", 2));

        trail.events[0].prompt_count = 7;
        assert!(!trail.verify());
    }

    #[test]
    fn test_tampered_message_is_detected() {
        let mut trail = AuditTrail::new();
        trail.add_event(
            AuditEvent::new(AuditEventKind::Escalation, "s1", 3).with_message("original"),
        );

        trail.events[0].message = Some("edited".to_string());
        assert!(!trail.verify());
    }

    #[test]
    fn test_trail_is_capped_and_still_verifies() {
        let mut trail = AuditTrail::with_capacity(5);
        for count in 1..=12 {
            trail.add_event(AuditEvent::new(AuditEventKind::Decision, "s1", count));
        }

        assert_eq!(trail.len(), 5);
        assert_eq!(trail.events()[0].prompt_count, 8);
        assert_eq!(trail.anchor(), trail.events()[0].previous_hash.as_deref());
        assert!(trail.verify());

        trail.events[0].previous_hash = None;
        assert!(!trail.verify());
    }

    #[test]
    fn test_anonymized_id_is_stable_and_opaque() {
        let a = anonymize_session_id("session-123");
        assert_eq!(a, anonymize_session_id("session-123"));
        assert_eq!(a.len(), 16);
        assert!(!a.contains("session"));
        assert_ne!(a, anonymize_session_id("session-124"));
    }

    #[test]
    fn test_json_lines_export() {
        let mut trail = AuditTrail::new();
        trail.add_event(AuditEvent::new(AuditEventKind::Decision, "s1", 1).with_data(42));
        trail.add_event(AuditEvent::new(AuditEventKind::SessionReset, "s1", 0));

        let exported = trail.to_json_lines().unwrap();
        let lines: Vec<&str> = exported.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.kind, AuditEventKind::Decision);
        assert_eq!(first.data.as_deref(), Some("42"));
    }

    #[test]
    fn test_clear_restarts_chain() {
        let mut trail = AuditTrail::new();
        trail.add_event(AuditEvent::new(AuditEventKind::Decision, "s1", 1));
        trail.clear();
        trail.add_event(AuditEvent::new(AuditEventKind::Decision, "s2", 1));

        assert!(trail.verify());
        assert!(trail.events()[0].previous_hash.is_none());
        assert!(trail.anchor().is_none());
    }
}
