//! Session counters
//!
//! Kept in-process for snapshots and mirrored to the `metrics` facade so an
//! embedding application can install any recorder.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anchorline_core::{EscalationLevel, InterventionPolicy, Rating};

/// Metrics collector for Anchorline sessions
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    prompts: AtomicU64,
    decisions: AtomicU64,
    red_replies: AtomicU64,
    opposing_views: AtomicU64,
    reflections: AtomicU64,
    escalations: AtomicU64,
    feedback_up: AtomicU64,
    feedback_down: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_prompt(&self) {
        self.inner.prompts.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("anchorline_prompts_total").increment(1);
    }

    /// Record one decision and every intervention it carries
    pub fn record_decision(&self, policy: &InterventionPolicy) {
        self.inner.decisions.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("anchorline_decisions_total").increment(1);

        let fired = [
            (policy.apply_red_reply, &self.inner.red_replies, "red_reply"),
            (policy.show_opposing_view, &self.inner.opposing_views, "opposing_view"),
            (policy.trigger_reflection, &self.inner.reflections, "reflection"),
        ];
        for (on, counter, kind) in fired {
            if on {
                counter.fetch_add(1, Ordering::Relaxed);
                ::metrics::counter!("anchorline_interventions_total", "kind" => kind).increment(1);
            }
        }
    }

    pub fn record_escalation(&self, level: EscalationLevel) {
        self.inner.escalations.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("anchorline_escalations_total", "level" => level.as_str()).increment(1);
    }

    pub fn record_feedback(&self, rating: Rating) {
        let (counter, label) = match rating {
            Rating::Up => (&self.inner.feedback_up, "up"),
            Rating::Down => (&self.inner.feedback_down, "down"),
        };
        counter.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("anchorline_feedback_total", "rating" => label).increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            prompts: self.inner.prompts.load(Ordering::Relaxed),
            decisions: self.inner.decisions.load(Ordering::Relaxed),
            red_replies: self.inner.red_replies.load(Ordering::Relaxed),
            opposing_views: self.inner.opposing_views.load(Ordering::Relaxed),
            reflections: self.inner.reflections.load(Ordering::Relaxed),
            escalations: self.inner.escalations.load(Ordering::Relaxed),
            feedback_up: self.inner.feedback_up.load(Ordering::Relaxed),
            feedback_down: self.inner.feedback_down.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub prompts: u64,
    pub decisions: u64,
    pub red_replies: u64,
    pub opposing_views: u64,
    pub reflections: u64,
    pub escalations: u64,
    pub feedback_up: u64,
    pub feedback_down: u64,
}

impl MetricsSnapshot {
    pub fn interventions(&self) -> u64 {
        self.red_replies + self.opposing_views + self.reflections + self.escalations
    }

    /// Interventions per decision
    pub fn intervention_rate(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.interventions() as f64 / self.decisions as f64
        }
    }

    /// Share of thumbs-up among all feedback
    pub fn approval_rate(&self) -> f64 {
        let total = self.feedback_up + self.feedback_down;
        if total == 0 {
            0.0
        } else {
            self.feedback_up as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let metrics = MetricsCollector::new();

        metrics.record_prompt();
        metrics.record_prompt();
        metrics.record_decision(&InterventionPolicy {
            apply_red_reply: true,
            trigger_reflection: true,
            ..Default::default()
        });
        metrics.record_decision(&InterventionPolicy::default());
        metrics.record_escalation(EscalationLevel::High);
        metrics.record_feedback(Rating::Up);
        metrics.record_feedback(Rating::Down);
        metrics.record_feedback(Rating::Up);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.prompts, 2);
        assert_eq!(snapshot.decisions, 2);
        assert_eq!(snapshot.red_replies, 1);
        assert_eq!(snapshot.reflections, 1);
        assert_eq!(snapshot.interventions(), 3);
        assert_eq!(snapshot.intervention_rate(), 1.5);
        assert!((snapshot.approval_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = MetricsCollector::new();
        let clone = metrics.clone();
        clone.record_prompt();
        assert_eq!(metrics.snapshot().prompts, 1);
    }

    #[test]
    fn test_empty_rates() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.intervention_rate(), 0.0);
        assert_eq!(snapshot.approval_rate(), 0.0);
    }
}
