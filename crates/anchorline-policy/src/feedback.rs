//! Feedback store and trust-delta model
//!
//! Two inputs move the sensitivities:
//! - passive: session length and intervention density on every prompt
//!   (cadence only, step 0.05)
//! - explicit: thumbs up/down tagged with a context (step 0.1)
//!
//! Higher sensitivity damps the intervention. All scalars stay in [0, 1].
//!
//! Each cadence/stance entry remembers the sensitivity it was recorded
//! against. Any run of recent entries ending now with more downs than ups
//! puts a floor of that starting value plus one step under the scalar, so
//! the order of ups and downs inside a window cannot undo a net-negative
//! verdict.

use anchorline_core::types::clamp_unit;
use anchorline_core::{
    BoundedHistory, FeedbackContext, FeedbackEntry, Rating, Session, TrustDeltaModel,
};
use chrono::Utc;
use tracing::{debug, info};

pub const FEEDBACK_HISTORY_CAPACITY: usize = 50;

/// Entries considered when re-deriving a sensitivity
pub const FEEDBACK_WINDOW: usize = 10;

const PASSIVE_STEP: f32 = 0.05;
const FEEDBACK_STEP: f32 = 0.1;
const CONFIDENCE_STEP: f32 = 0.1;

const LONG_SESSION_PROMPTS: u64 = 20;
const SHORT_SESSION_PROMPTS: u64 = 5;
const LOW_INTERVENTION_DENSITY: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct FeedbackStore {
    history: BoundedHistory<FeedbackEntry>,
    // Sensitivity of the entry's own context before it was recorded, in
    // lockstep with `history`; None for contexts without a sensitivity
    priors: BoundedHistory<Option<f32>>,
    model: TrustDeltaModel,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self {
            history: BoundedHistory::new(FEEDBACK_HISTORY_CAPACITY),
            priors: BoundedHistory::new(FEEDBACK_HISTORY_CAPACITY),
            model: TrustDeltaModel::new(Utc::now()),
        }
    }

    /// Passive adjustment from session shape
    pub fn record_prompt(&mut self, session: &Session) {
        let before = self.model.cadence_sensitivity;

        if session.prompt_count > LONG_SESSION_PROMPTS
            && session.intervention_density() < LOW_INTERVENTION_DENSITY
        {
            self.model.cadence_sensitivity =
                clamp_unit(self.model.cadence_sensitivity + PASSIVE_STEP);
        } else if session.prompt_count < SHORT_SESSION_PROMPTS {
            self.model.cadence_sensitivity =
                clamp_unit(self.model.cadence_sensitivity - PASSIVE_STEP);
        }

        if self.model.cadence_sensitivity != before {
            self.model.last_updated = session.last_activity;
            debug!(
                session_id = %session.id,
                prompt_count = session.prompt_count,
                cadence_sensitivity = self.model.cadence_sensitivity,
                "Passive cadence adjustment"
            );
        }
    }

    /// Record explicit feedback.
    ///
    /// Confidence moves 0.1 with the rating. A cadence- or stance-tagged entry
    /// re-derives that sensitivity from the window in the direction of its
    /// own rating, then lifts it to the window's net-negative floor. A
    /// thumbs-down never lowers a sensitivity.
    pub fn record_feedback(&mut self, entry: FeedbackEntry) {
        let rating = entry.rating;
        let context = entry.context;
        let timestamp = entry.timestamp;
        self.priors.push(self.sensitivity(context));
        self.history.push(entry);

        self.model.confidence = clamp_unit(match rating {
            Rating::Up => self.model.confidence + CONFIDENCE_STEP,
            Rating::Down => self.model.confidence - CONFIDENCE_STEP,
        });

        match context {
            FeedbackContext::Cadence => {
                let derived = self.calculate_optimal_cadence_sensitivity();
                let floor = self.net_negative_floor(context);
                self.model.cadence_sensitivity =
                    gated(self.model.cadence_sensitivity, derived, rating, floor);
            }
            FeedbackContext::Stance => {
                let derived = self.calculate_optimal_stance_sensitivity();
                let floor = self.net_negative_floor(context);
                self.model.stance_sensitivity =
                    gated(self.model.stance_sensitivity, derived, rating, floor);
            }
            _ => {}
        }

        self.model.last_updated = timestamp;

        info!(
            rating = ?rating,
            context = context.label(),
            cadence_sensitivity = self.model.cadence_sensitivity,
            stance_sensitivity = self.model.stance_sensitivity,
            confidence = self.model.confidence,
            "Feedback recorded"
        );
    }

    pub fn calculate_optimal_cadence_sensitivity(&self) -> f32 {
        self.optimal(FeedbackContext::Cadence, self.model.cadence_sensitivity)
    }

    pub fn calculate_optimal_stance_sensitivity(&self) -> f32 {
        self.optimal(FeedbackContext::Stance, self.model.stance_sensitivity)
    }

    // Net-negative steps toward fewer interventions, net-positive toward more.
    fn optimal(&self, context: FeedbackContext, current: f32) -> f32 {
        let (mut up, mut down) = (0usize, 0usize);
        for entry in self.history.last_n(FEEDBACK_WINDOW) {
            if entry.context != context {
                continue;
            }
            match entry.rating {
                Rating::Up => up += 1,
                Rating::Down => down += 1,
            }
        }

        if down > up {
            clamp_unit(current + FEEDBACK_STEP)
        } else if up > down {
            clamp_unit(current - FEEDBACK_STEP)
        } else {
            current
        }
    }

    // Highest `prior + step` over the window's suffixes with more downs
    // than ups in `context`
    fn net_negative_floor(&self, context: FeedbackContext) -> Option<f32> {
        let window = self
            .history
            .last_n(FEEDBACK_WINDOW)
            .zip(self.priors.last_n(FEEDBACK_WINDOW))
            .collect::<Vec<_>>();

        let (mut up, mut down) = (0usize, 0usize);
        let mut floor: Option<f32> = None;
        for (entry, prior) in window.into_iter().rev() {
            if entry.context != context {
                continue;
            }
            match entry.rating {
                Rating::Up => up += 1,
                Rating::Down => down += 1,
            }
            if let (true, &Some(prior)) = (down > up, prior) {
                let candidate = clamp_unit(prior + FEEDBACK_STEP);
                floor = Some(floor.map_or(candidate, |f| f.max(candidate)));
            }
        }
        floor
    }

    fn sensitivity(&self, context: FeedbackContext) -> Option<f32> {
        match context {
            FeedbackContext::Cadence => Some(self.model.cadence_sensitivity),
            FeedbackContext::Stance => Some(self.model.stance_sensitivity),
            _ => None,
        }
    }

    pub fn model(&self) -> &TrustDeltaModel {
        &self.model
    }

    pub fn history(&self) -> &BoundedHistory<FeedbackEntry> {
        &self.history
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

fn gated(current: f32, derived: f32, rating: Rating, floor: Option<f32>) -> f32 {
    let next = match rating {
        Rating::Down => current.max(derived),
        Rating::Up => current.min(derived),
    };
    clamp_unit(floor.map_or(next, |floor| next.max(floor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorline_core::InterventionPolicy;
    use proptest::prelude::*;

    fn entry(rating: Rating, context: FeedbackContext) -> FeedbackEntry {
        FeedbackEntry {
            rating,
            reason: "test".to_string(),
            context,
            prompt_count: 1,
            timestamp: Utc::now(),
        }
    }

    fn session_with(prompts: u64, applied: u64) -> Session {
        let now = Utc::now();
        let loud = InterventionPolicy {
            apply_red_reply: true,
            ..Default::default()
        };
        let quiet = InterventionPolicy::default();

        let mut session = Session::new(now);
        for i in 0..prompts {
            session = session.counted(now);
            let policy = if i < applied { &loud } else { &quiet };
            session = session.with_turn(0.0, None, policy, now);
        }
        session
    }

    #[test]
    fn test_defaults() {
        let store = FeedbackStore::new();
        assert_eq!(store.model().cadence_sensitivity, 0.5);
        assert_eq!(store.model().stance_sensitivity, 0.5);
        assert_eq!(store.calculate_optimal_cadence_sensitivity(), 0.5);
    }

    #[test]
    fn test_short_session_lowers_cadence() {
        let mut store = FeedbackStore::new();
        store.record_prompt(&session_with(2, 0));
        assert!((store.model().cadence_sensitivity - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_long_quiet_session_raises_cadence() {
        let mut store = FeedbackStore::new();
        store.record_prompt(&session_with(25, 1));
        assert!((store.model().cadence_sensitivity - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_long_busy_session_is_unchanged() {
        let mut store = FeedbackStore::new();
        store.record_prompt(&session_with(25, 10));
        assert_eq!(store.model().cadence_sensitivity, 0.5);
    }

    #[test]
    fn test_confidence_moves_with_rating() {
        let mut store = FeedbackStore::new();
        store.record_feedback(entry(Rating::Up, FeedbackContext::General));
        assert!((store.model().confidence - 0.6).abs() < 1e-6);

        for _ in 0..20 {
            store.record_feedback(entry(Rating::Down, FeedbackContext::General));
        }
        assert_eq!(store.model().confidence, 0.0);
        assert_eq!(store.model().cadence_sensitivity, 0.5);
    }

    #[test]
    fn test_stance_feedback() {
        let mut store = FeedbackStore::new();
        store.record_feedback(entry(Rating::Down, FeedbackContext::Stance));
        assert!((store.model().stance_sensitivity - 0.6).abs() < 1e-6);
        assert_eq!(store.model().cadence_sensitivity, 0.5);

        store.record_feedback(entry(Rating::Up, FeedbackContext::Stance));
        // tie: unchanged
        assert!((store.model().stance_sensitivity - 0.6).abs() < 1e-6);

        store.record_feedback(entry(Rating::Up, FeedbackContext::Stance));
        assert!((store.model().stance_sensitivity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_long_busy_session_past_log_capacity_is_unchanged() {
        let mut store = FeedbackStore::new();
        store.record_prompt(&session_with(1200, 1200));
        assert_eq!(store.model().cadence_sensitivity, 0.5);
    }

    #[test]
    fn test_leading_ups_cannot_outweigh_down_majority() {
        let mut store = FeedbackStore::new();
        for rating in [Rating::Up, Rating::Up, Rating::Down, Rating::Down, Rating::Down] {
            store.record_feedback(entry(rating, FeedbackContext::Stance));
        }
        assert!(store.model().stance_sensitivity >= 0.5);
        assert_eq!(store.model().cadence_sensitivity, 0.5);
    }

    #[test]
    fn test_history_is_capped() {
        let mut store = FeedbackStore::new();
        for _ in 0..80 {
            store.record_feedback(entry(Rating::Up, FeedbackContext::Claims));
        }
        assert_eq!(store.history().len(), FEEDBACK_HISTORY_CAPACITY);
    }

    fn context_strategy() -> impl Strategy<Value = FeedbackContext> {
        prop_oneof![Just(FeedbackContext::Cadence), Just(FeedbackContext::Stance)]
    }

    fn any_context() -> impl Strategy<Value = FeedbackContext> {
        prop_oneof![
            Just(FeedbackContext::Cadence),
            Just(FeedbackContext::Stance),
            Just(FeedbackContext::Claims),
            Just(FeedbackContext::Emotion),
            Just(FeedbackContext::General),
        ]
    }

    // At most one window of ratings, more downs than ups, in any order
    fn down_majority_batch() -> impl Strategy<Value = Vec<Rating>> {
        (1usize..=FEEDBACK_WINDOW).prop_flat_map(|downs| {
            let max_ups = (downs - 1).min(FEEDBACK_WINDOW - downs);
            (0..=max_ups).prop_flat_map(move |ups| {
                let mut ratings = vec![Rating::Down; downs];
                ratings.extend(std::iter::repeat(Rating::Up).take(ups));
                Just(ratings).prop_shuffle()
            })
        })
    }

    fn sensitivity_of(store: &FeedbackStore, context: FeedbackContext) -> f32 {
        match context {
            FeedbackContext::Cadence => store.model().cadence_sensitivity,
            _ => store.model().stance_sensitivity,
        }
    }

    proptest! {
        #[test]
        fn prop_down_never_lowers(
            context in context_strategy(),
            history in prop::collection::vec(any::<bool>(), 0..40),
        ) {
            let mut store = FeedbackStore::new();
            for up in history {
                let rating = if up { Rating::Up } else { Rating::Down };
                store.record_feedback(entry(rating, context));
            }

            let prior = match context {
                FeedbackContext::Cadence => store.model().cadence_sensitivity,
                _ => store.model().stance_sensitivity,
            };
            store.record_feedback(entry(Rating::Down, context));
            let after = match context {
                FeedbackContext::Cadence => store.model().cadence_sensitivity,
                _ => store.model().stance_sensitivity,
            };

            prop_assert!(after >= prior);
            prop_assert!((0.0..=1.0).contains(&after));
        }

        #[test]
        fn prop_down_majority_batch_never_lowers(
            context in context_strategy(),
            earlier in prop::collection::vec((any::<bool>(), any_context()), 0..60),
            batch in down_majority_batch(),
        ) {
            let mut store = FeedbackStore::new();
            for (up, ctx) in earlier {
                let rating = if up { Rating::Up } else { Rating::Down };
                store.record_feedback(entry(rating, ctx));
            }

            let prior = sensitivity_of(&store, context);
            for rating in batch {
                store.record_feedback(entry(rating, context));
                let now = sensitivity_of(&store, context);
                prop_assert!((0.0..=1.0).contains(&now));
            }

            prop_assert!(sensitivity_of(&store, context) >= prior);
        }
    }
}
