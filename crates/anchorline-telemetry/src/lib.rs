//! Anchorline Telemetry
//!
//! Opt-in telemetry for Anchorline sessions.
//!
//! Provides:
//! - A SHA-256 hash-chained audit trail of decisions, escalations and feedback
//! - Session counters mirrored to the `metrics` facade
//! - Anonymization of session identifiers

pub mod audit;
pub mod metrics;
pub mod recorder;

pub use audit::{
    anonymize_session_id, AuditEvent, AuditEventKind, AuditSeverity, AuditTrail,
    DEFAULT_AUDIT_CAPACITY,
};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use recorder::TelemetryRecorder;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditEvent, AuditTrail};
    pub use crate::metrics::MetricsCollector;
    pub use crate::recorder::TelemetryRecorder;
}
