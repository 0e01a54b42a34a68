//! Session orchestrator
//!
//! Owns one `Session` plus its leaf analyzers, feedback store and telemetry.
//! Each pipeline step is a separate call because the caller sits a model
//! request between message-side analysis and output-side labelling:
//!
//! ```text
//! count_prompt -> get_interventions -> (model call) -> label_claims
//!              -> counter_balance_if_needed -> apply_cadence_styles
//! ```
//!
//! One orchestrator per conversation. It is `Send` but holds no locks, so
//! turns on the same conversation must be serialized by the caller.

use std::sync::Arc;

use anchorline_classifiers::stance::clamp_threshold;
use anchorline_classifiers::{
    generate_human_options, ClaimClassifier, ClaimLabeler, CounterpointGenerator, EmotionAnalyzer,
    LabelingOptions, StanceAnalyzer, TemplateCounterpoints,
};
use anchorline_core::{
    AnchorConfig, AnchorConfigPatch, EmotionalAnalysis, FeedbackContext, FeedbackEntry,
    HumanOption, InterventionPolicy, LabeledOutput, Rating, Result, Session, StanceAnalysis,
    TrustDeltaModel,
};
use anchorline_policy::{
    apply_modifications, suggest_interval, transition, CadenceVerdict, DecisionRules,
    FeedbackStore, TurnSignals,
};
use anchorline_telemetry::{MetricsSnapshot, TelemetryRecorder};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::events::{AnchorEvent, EventBus};

pub struct Orchestrator {
    config: AnchorConfig,
    session: Session,
    emotion: EmotionAnalyzer,
    stance: StanceAnalyzer,
    feedback: FeedbackStore,
    labeler: Arc<dyn ClaimLabeler>,
    counterpoints: Arc<dyn CounterpointGenerator>,
    events: EventBus,
    telemetry: TelemetryRecorder,
}

impl Orchestrator {
    /// Build an orchestrator with the heuristic collaborators
    pub fn new(config: AnchorConfig) -> Result<Self> {
        let emotion = EmotionAnalyzer::with_threshold(config.emotion.escalation_threshold)?;
        let stance = StanceAnalyzer::with_window(config.stance.window_minutes)?;
        let labeler: Arc<dyn ClaimLabeler> = Arc::new(ClaimClassifier::new()?);
        let telemetry = TelemetryRecorder::new(config.telemetry.clone());
        let session = Session::new(Utc::now());

        info!(
            session_id = %session.id,
            cadence_interval = config.cadence.interval,
            stance_threshold = config.stance.threshold,
            telemetry = config.telemetry.opt_in,
            "Session started"
        );

        Ok(Self {
            config,
            session,
            emotion,
            stance,
            feedback: FeedbackStore::new(),
            labeler,
            counterpoints: Arc::new(TemplateCounterpoints),
            events: EventBus::default(),
            telemetry,
        })
    }

    /// Replace the output-side collaborators
    pub fn with_collaborators(
        mut self,
        labeler: Arc<dyn ClaimLabeler>,
        counterpoints: Arc<dyn CounterpointGenerator>,
    ) -> Self {
        debug!(
            labeler = labeler.name(),
            counterpoints = counterpoints.name(),
            "Collaborators replaced"
        );
        self.labeler = labeler;
        self.counterpoints = counterpoints;
        self
    }

    /// Use a dedicated event bus, e.g. one shared with a transport layer
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn count_prompt(&mut self) {
        self.count_prompt_at(Utc::now());
    }

    pub fn count_prompt_at(&mut self, now: DateTime<Utc>) {
        self.advance(|session| session.counted(now));
        self.feedback.record_prompt(&self.session);
        self.telemetry.record_prompt();

        debug!(
            session_id = %self.session.id,
            prompt_count = self.session.prompt_count,
            "Prompt counted"
        );
    }

    /// Analyse an incoming message and decide this turn's interventions
    pub fn get_interventions(&mut self, message: &str) -> InterventionPolicy {
        self.get_interventions_at(message, Utc::now())
    }

    pub fn get_interventions_at(&mut self, message: &str, now: DateTime<Utc>) -> InterventionPolicy {
        let mut signals = TurnSignals::new(message, now);

        if self.config.emotion.enabled {
            let analysis = self.emotion.analyze_at(message, now);
            signals.escalate_to_human = self.emotion.should_escalate_to_human(&analysis);
            signals.emotion = Some(analysis);
        }

        if self.config.stance.enabled {
            let analysis = self.stance.analyze_at(message, now);
            signals.show_opposing_view = self
                .stance
                .should_show_opposing_glance(&analysis, self.effective_stance_threshold());
            signals.stance = Some(analysis);
        }

        let escalated = if signals.escalate_to_human {
            signals.emotion.clone()
        } else {
            None
        };

        let rules = DecisionRules::from_config(&self.config);
        let session = std::mem::take(&mut self.session);
        let (session, policy) = transition(session, signals, &rules);
        self.session = session;

        self.telemetry.record_decision(&self.session, &policy);

        if let Some(analysis) = escalated.filter(|_| policy.escalate_to_human) {
            self.escalate(&analysis, message);
        }

        if policy.any() {
            self.events.publish(AnchorEvent::InterventionApplied {
                session_id: self.session.id.clone(),
                prompt_count: self.session.prompt_count,
                policy,
                timestamp: now,
            });
        }

        policy
    }

    /// Label the claims in a model response.
    ///
    /// Labeller errors are returned unmodified.
    pub async fn label_claims(&mut self, text: &str) -> Result<LabeledOutput> {
        let options = LabelingOptions::from_config(&self.config);
        let output = self.labeler.label(text, &options).await?;

        let now = Utc::now();
        self.advance(|session| session.touched(now));

        debug!(
            session_id = %self.session.id,
            labeler = self.labeler.name(),
            claims = output.claims.len(),
            "Claims labelled"
        );

        Ok(output)
    }

    /// Append an opposing view when the session's stance is at or past the
    /// effective threshold; pass through otherwise.
    pub async fn counter_balance_if_needed(&self, output: LabeledOutput) -> Result<LabeledOutput> {
        if !self.config.stance.enabled || output.opposing_glance.is_some() {
            return Ok(output);
        }

        let threshold = self.effective_stance_threshold();
        if self.session.current_stance.abs() < threshold {
            return Ok(output);
        }

        let analysis = self.current_stance_analysis();
        let glance = self.counterpoints.opposing_glance(&analysis).await?;

        debug!(
            session_id = %self.session.id,
            stance = analysis.score,
            target = glance.target_score,
            threshold,
            "Opposing glance added"
        );

        let mut output = output;
        output.annotated.push_str(&glance.render());
        output.opposing_glance = Some(glance);
        Ok(output)
    }

    /// Frame the output for the current prompt count
    pub fn apply_cadence_styles(&self, output: LabeledOutput) -> LabeledOutput {
        self.apply_cadence_styles_at(output, Utc::now())
    }

    pub fn apply_cadence_styles_at(&self, output: LabeledOutput, now: DateTime<Utc>) -> LabeledOutput {
        let verdict = CadenceVerdict::evaluate(
            self.session.prompt_count,
            self.config.cadence.interval,
            self.config.cadence.show_tally,
            self.session.duration(now),
        );

        let mut output = output;
        output.annotated = apply_modifications(&output.annotated, &verdict.modifications());
        output
    }

    pub fn submit_feedback(&mut self, rating: Rating, reason: impl Into<String>, context: FeedbackContext) {
        let entry = FeedbackEntry {
            rating,
            reason: reason.into(),
            context,
            prompt_count: self.session.prompt_count,
            timestamp: Utc::now(),
        };

        self.feedback.record_feedback(entry.clone());
        self.telemetry.record_feedback(&self.session, &entry);
        self.events.publish(AnchorEvent::FeedbackRecorded {
            session_id: self.session.id.clone(),
            entry,
        });
    }

    /// Shallow-merge a partial configuration, section by section
    pub fn update_config(&mut self, patch: AnchorConfigPatch) {
        self.config.merge(patch);

        self.stance.set_window(self.config.stance.window_minutes);
        self.emotion
            .set_escalation_threshold(self.config.emotion.escalation_threshold);
        self.telemetry.set_config(self.config.telemetry.clone());
        self.telemetry.record_config_update(&self.session);

        info!(
            session_id = %self.session.id,
            cadence_interval = self.config.cadence.interval,
            stance_enabled = self.config.stance.enabled,
            stance_threshold = self.config.stance.threshold,
            emotion_enabled = self.config.emotion.enabled,
            "Configuration updated"
        );
    }

    /// Start a fresh session. Configuration and the learned trust-delta
    /// model are kept.
    pub fn reset_session(&mut self) {
        self.telemetry.record_reset(&self.session);

        let previous = std::mem::replace(&mut self.session, Session::new(Utc::now()));
        self.emotion.reset();
        self.stance.reset();

        info!(
            previous_session = %previous.id,
            session_id = %self.session.id,
            prompts = previous.prompt_count,
            "Session reset"
        );
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnchorEvent> {
        self.events.subscribe()
    }

    /// Whether the latest message warrants a human hand-off
    pub fn should_escalate_to_human(&self) -> bool {
        self.session
            .latest_emotion
            .as_ref()
            .is_some_and(|analysis| self.emotion.should_escalate_to_human(analysis))
    }

    /// Contacts for the latest emotional state
    pub fn human_options(&self) -> Vec<HumanOption> {
        match &self.session.latest_emotion {
            Some(analysis) => generate_human_options(analysis),
            None => generate_human_options(&EmotionalAnalysis::neutral(self.session.last_activity)),
        }
    }

    /// Configured interval nudged by cadence feedback
    pub fn recommended_cadence_interval(&self) -> u32 {
        suggest_interval(self.config.cadence.interval, self.feedback.history().iter())
    }

    /// Configured threshold shifted by stance sensitivity, within 1-3.
    ///
    /// Sensitivity 0.5 leaves the threshold unchanged; each 0.1 above moves it
    /// up by 0.2.
    pub fn effective_stance_threshold(&self) -> f32 {
        let sensitivity = self.feedback.model().stance_sensitivity;
        clamp_threshold(self.config.stance.threshold + (sensitivity - 0.5) * 2.0)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn trust_delta(&self) -> &TrustDeltaModel {
        self.feedback.model()
    }

    pub fn emotion_analyzer(&self) -> &EmotionAnalyzer {
        &self.emotion
    }

    pub fn stance_analyzer(&self) -> &StanceAnalyzer {
        &self.stance
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.telemetry.metrics()
    }

    fn advance(&mut self, step: impl FnOnce(Session) -> Session) {
        let session = std::mem::take(&mut self.session);
        self.session = step(session);
    }

    fn escalate(&mut self, analysis: &EmotionalAnalysis, message: &str) {
        warn!(
            session_id = %self.session.id,
            prompt_count = self.session.prompt_count,
            level = %analysis.escalation_level,
            sentiment = analysis.sentiment,
            risks = analysis.risk_factors.len(),
            "Escalating to human support"
        );

        self.telemetry.record_escalation(&self.session, analysis, message);
        self.events.publish(AnchorEvent::Escalation {
            session_id: self.session.id.clone(),
            level: analysis.escalation_level,
            patterns: analysis.patterns.iter().copied().collect(),
            risk_factors: analysis.risk_factors.iter().copied().collect(),
            sentiment: analysis.sentiment,
            message: message.to_string(),
            timestamp: analysis.timestamp,
        });
    }

    // The latest in-window analysis, re-scored with the session's stance
    fn current_stance_analysis(&self) -> StanceAnalysis {
        let score = self.session.current_stance;
        match self.stance.history().latest() {
            Some(latest) => StanceAnalysis {
                score,
                ..latest.clone()
            },
            None => StanceAnalysis {
                score,
                ..StanceAnalysis::neutral(self.session.last_activity)
            },
        }
    }
}
