//! Core records shared across Anchorline components
//!
//! Every value that crosses a component boundary (classifier to policy,
//! stance leaf to claim output, policy to caller) has a fixed shape here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stance scores live on this symmetric scale
pub const STANCE_LIMIT: f32 = 3.0;

/// Clamp a value to [0, 1]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamp a value to [-1, 1]
pub fn clamp_signed_unit(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-1.0, 1.0)
}

/// Clamp a stance score to [-3, 3]
pub fn clamp_stance(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-STANCE_LIMIT, STANCE_LIMIT)
}

/// Severity of detected emotional risk
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EscalationLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl EscalationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Medium or high
    pub fn is_elevated(&self) -> bool {
        *self >= Self::Medium
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emotional pattern tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionPattern {
    Anxiety,
    Depression,
    Anger,
    Loneliness,
    Fear,
    Grief,
    Crisis,
}

impl EmotionPattern {
    pub const ALL: [EmotionPattern; 7] = [
        Self::Anxiety,
        Self::Depression,
        Self::Anger,
        Self::Loneliness,
        Self::Fear,
        Self::Grief,
        Self::Crisis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Anxiety => "anxiety",
            Self::Depression => "depression",
            Self::Anger => "anger",
            Self::Loneliness => "loneliness",
            Self::Fear => "fear",
            Self::Grief => "grief",
            Self::Crisis => "crisis",
        }
    }
}

/// Risk factors used for escalation and contact routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    SelfHarm,
    Suicide,
    Crisis,
    SubstanceAbuse,
    RelationshipViolence,
    EatingDisorder,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 6] = [
        Self::SelfHarm,
        Self::Suicide,
        Self::Crisis,
        Self::SubstanceAbuse,
        Self::RelationshipViolence,
        Self::EatingDisorder,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::SelfHarm => "self_harm",
            Self::Suicide => "suicide",
            Self::Crisis => "crisis",
            Self::SubstanceAbuse => "substance_abuse",
            Self::RelationshipViolence => "relationship_violence",
            Self::EatingDisorder => "eating_disorder",
        }
    }
}

/// Result of emotion analysis on one message.
///
/// Immutable once produced; the emotion leaf keeps the last few in a
/// bounded history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalAnalysis {
    /// Sentiment in [-1, 1]
    pub sentiment: f32,

    /// Detected emotional patterns
    pub patterns: BTreeSet<EmotionPattern>,

    /// Escalation level derived from sentiment and patterns
    pub escalation_level: EscalationLevel,

    /// Independently matched risk factors
    pub risk_factors: BTreeSet<RiskFactor>,

    pub timestamp: DateTime<Utc>,
}

impl EmotionalAnalysis {
    /// A neutral analysis: no sentiment, no patterns, level low
    pub fn neutral(timestamp: DateTime<Utc>) -> Self {
        Self {
            sentiment: 0.0,
            patterns: BTreeSet::new(),
            escalation_level: EscalationLevel::Low,
            risk_factors: BTreeSet::new(),
            timestamp,
        }
    }

    pub fn has_pattern(&self, pattern: EmotionPattern) -> bool {
        self.patterns.contains(&pattern)
    }

    pub fn has_risk(&self, risk: RiskFactor) -> bool {
        self.risk_factors.contains(&risk)
    }
}

/// Ideological topic tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Politics,
    Economics,
    Social,
    Technology,
    Health,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Self::Politics,
        Self::Economics,
        Self::Social,
        Self::Technology,
        Self::Health,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Politics => "politics",
            Self::Economics => "economics",
            Self::Social => "social",
            Self::Technology => "technology",
            Self::Health => "health",
        }
    }
}

/// Result of stance analysis on one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StanceAnalysis {
    /// Skew in [-3, 3]; negative leans left, positive leans right
    pub score: f32,

    /// Confidence in [0, 1]
    pub confidence: f32,

    /// Topics detected in the text (not mutually exclusive)
    pub topics: BTreeSet<Topic>,

    pub timestamp: DateTime<Utc>,
}

impl StanceAnalysis {
    pub fn neutral(timestamp: DateTime<Utc>) -> Self {
        Self {
            score: 0.0,
            confidence: 0.0,
            topics: BTreeSet::new(),
            timestamp,
        }
    }

    /// The first detected topic in declaration order
    pub fn primary_topic(&self) -> Option<Topic> {
        self.topics.iter().next().copied()
    }
}

/// Direction on the stance scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StanceDirection {
    Left,
    Neutral,
    Right,
}

impl StanceDirection {
    pub fn of(score: f32) -> Self {
        if score < 0.0 {
            Self::Left
        } else if score > 0.0 {
            Self::Right
        } else {
            Self::Neutral
        }
    }
}

/// A templated counter-perspective shown when stance drifts past threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpposingGlance {
    /// Stance score of the analysed message
    pub original_score: f32,

    /// Score the counter-perspective aims for
    pub target_score: f32,

    /// Topic the template was chosen for
    pub topic: Option<Topic>,

    /// Direction of the counter-perspective
    pub direction: StanceDirection,

    /// Counter-statement text
    pub content: String,

    /// Placeholder citations attached to the statement
    pub citations: Vec<String>,

    pub timestamp: DateTime<Utc>,
}

impl OpposingGlance {
    /// Render as a block suitable for appending to model output
    pub fn render(&self) -> String {
        let mut block = format!("\n\n> Another perspective: {}", self.content);
        if !self.citations.is_empty() {
            block.push_str("\n> Sources: ");
            block.push_str(&self.citations.join("; "));
        }
        block
    }
}

/// Evidentiary classification of a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimKind {
    Cited,
    Inference,
    Unverified,
}

impl ClaimKind {
    pub const ALL: [ClaimKind; 3] = [Self::Cited, Self::Inference, Self::Unverified];

    /// Visual badge inserted ahead of a labelled sentence
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Cited => "[cited]",
            Self::Inference => "[inference]",
            Self::Unverified => "[unverified]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cited => "cited",
            Self::Inference => "inference",
            Self::Unverified => "unverified",
        }
    }
}

/// Label attached to one sentence of model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimLabel {
    pub kind: ClaimKind,

    /// Confidence in [0, 1]
    pub confidence: f32,

    /// Extracted source for cited claims
    pub source: Option<String>,

    /// The sentence the label applies to
    pub sentence: String,

    /// Byte offset of the sentence in the original text
    pub position: usize,
}

/// Model output after claim labelling and post-processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledOutput {
    /// Text as produced by the model
    pub original: String,

    /// Labels in position order
    pub claims: Vec<ClaimLabel>,

    /// Badge-annotated and post-processed text
    pub annotated: String,

    /// Counter-perspective appended by counter-balancing, if any
    pub opposing_glance: Option<OpposingGlance>,
}

impl LabeledOutput {
    /// Output with no claims and the text passed through unchanged
    pub fn unlabeled(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            annotated: text.clone(),
            original: text,
            claims: Vec::new(),
            opposing_glance: None,
        }
    }

    pub fn count(&self, kind: ClaimKind) -> usize {
        self.claims.iter().filter(|c| c.kind == kind).count()
    }
}

/// The per-turn intervention decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InterventionPolicy {
    /// Insert a periodic cadence interruption
    pub apply_red_reply: bool,

    /// Show an opposing-view glance
    pub show_opposing_view: bool,

    /// Prompt the user to reflect
    pub trigger_reflection: bool,

    /// Offer a hand-off to a human
    pub escalate_to_human: bool,

    /// Stance score of this turn's message
    pub stance_score: f32,
}

impl InterventionPolicy {
    /// Whether any intervention fires this turn
    pub fn any(&self) -> bool {
        self.apply_red_reply
            || self.show_opposing_view
            || self.trigger_reflection
            || self.escalate_to_human
    }
}

/// Thumbs up or down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Up,
    Down,
}

/// What a piece of feedback is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackContext {
    Cadence,
    Stance,
    Claims,
    Emotion,
    General,
}

impl FeedbackContext {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cadence => "cadence",
            Self::Stance => "stance",
            Self::Claims => "claims",
            Self::Emotion => "emotion",
            Self::General => "general",
        }
    }
}

/// One user rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub rating: Rating,
    pub reason: String,
    pub context: FeedbackContext,
    pub prompt_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// Adaptive sensitivity scalars tuned from feedback.
///
/// Higher sensitivity means the corresponding intervention is damped
/// (shown less often).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustDeltaModel {
    /// Cadence sensitivity in [0, 1]
    pub cadence_sensitivity: f32,

    /// Stance sensitivity in [0, 1]
    pub stance_sensitivity: f32,

    /// Confidence in the current tuning, in [0, 1]
    pub confidence: f32,

    pub last_updated: DateTime<Utc>,
}

impl TrustDeltaModel {
    /// Neutral starting point for both sensitivities
    pub const DEFAULT_SENSITIVITY: f32 = 0.5;

    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            cadence_sensitivity: Self::DEFAULT_SENSITIVITY,
            stance_sensitivity: Self::DEFAULT_SENSITIVITY,
            confidence: 0.5,
            last_updated: now,
        }
    }
}

impl Default for TrustDeltaModel {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// How a human contact is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Phone,
    Text,
    Web,
}

/// A contact or resource offered on escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanOption {
    pub kind: ContactKind,
    pub label: String,
    /// Number, short code or URL
    pub value: String,
    pub description: String,
}

impl HumanOption {
    pub fn new(
        kind: ContactKind,
        label: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            value: value.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_signed_unit(-4.0), -1.0);
        assert_eq!(clamp_stance(9.0), 3.0);
        assert_eq!(clamp_stance(f32::NAN), 0.0);
    }

    #[test]
    fn test_escalation_ordering() {
        assert!(EscalationLevel::High > EscalationLevel::Medium);
        assert!(EscalationLevel::Medium.is_elevated());
        assert!(!EscalationLevel::Low.is_elevated());
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&RiskFactor::SelfHarm).unwrap();
        assert_eq!(json, "\"self_harm\"");

        let level: EscalationLevel = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(level, EscalationLevel::High);
    }

    #[test]
    fn test_policy_any() {
        let mut policy = InterventionPolicy::default();
        assert!(!policy.any());
        policy.trigger_reflection = true;
        assert!(policy.any());
    }

    #[test]
    fn test_glance_render() {
        let glance = OpposingGlance {
            original_score: 2.5,
            target_score: -3.0,
            topic: Some(Topic::Economics),
            direction: StanceDirection::Left,
            content: "Consider the other side.".to_string(),
            citations: vec!["A".to_string(), "B".to_string()],
            timestamp: Utc::now(),
        };
        let rendered = glance.render();
        assert!(rendered.contains("Another perspective: Consider the other side."));
        assert!(rendered.contains("Sources: A; B"));
    }
}
