//! Emotional risk classifier
//!
//! Scores sentiment with a fixed lexicon, tags emotional patterns and risk
//! factors with independent pattern groups, and derives an escalation level.
//! The analyzer keeps the last [`EMOTION_HISTORY_CAPACITY`] analyses to
//! detect sustained distress across turns.

use crate::patterns::{build_groups, matching_labels, PatternGroup};
use crate::sentiment::SentimentLexicon;
use anchorline_core::types::clamp_signed_unit;
use anchorline_core::{
    BoundedHistory, ContactKind, EmotionPattern, EmotionalAnalysis, EscalationLevel, HumanOption,
    Result, RiskFactor,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub const EMOTION_HISTORY_CAPACITY: usize = 10;

/// Sentiment below this with two or more patterns is medium risk
const MEDIUM_SENTIMENT: f32 = -0.5;

/// Sustained-distress check: consecutive entries and their sentiment ceiling
const SUSTAINED_TURNS: usize = 3;
const SUSTAINED_SENTIMENT: f32 = -0.3;

const PATTERN_TABLE: &[(EmotionPattern, &[&str])] = &[
    (
        EmotionPattern::Anxiety,
        &[
            "anxious",
            "anxiety",
            "worried",
            "worry(?:ing)?",
            "panic(?:king)?",
            "nervous",
            "stressed",
            "overwhelmed",
            "can'?t stop thinking",
        ],
    ),
    (
        EmotionPattern::Depression,
        &[
            "depressed",
            "depression",
            "hopeless(?:ness)?",
            "worthless",
            "empty inside",
            "no point",
            "nothing matters",
            "can'?t get out of bed",
            "numb",
        ],
    ),
    (
        EmotionPattern::Anger,
        &["angry", "furious", "rage", "pissed", "hate", "so mad", "livid"],
    ),
    (
        EmotionPattern::Loneliness,
        &[
            "lonely",
            "loneliness",
            "all alone",
            "so alone",
            "isolated",
            "no one cares",
            "nobody cares",
            "no friends",
        ],
    ),
    (
        EmotionPattern::Fear,
        &["scared", "afraid", "terrified", "frightened"],
    ),
    (
        EmotionPattern::Grief,
        &[
            "grief",
            "grieving",
            "passed away",
            "lost my (?:mom|mother|dad|father|wife|husband|partner|son|daughter|friend|brother|sister)",
            "funeral",
        ],
    ),
    (
        EmotionPattern::Crisis,
        &[
            "kill myself",
            "end it all",
            "suicid(?:e|al)",
            "want to die",
            "better off dead",
            "self[- ]?harm",
            "hurt myself",
            "no reason to live",
            "end my life",
        ],
    ),
];

const RISK_TABLE: &[(RiskFactor, &[&str])] = &[
    (
        RiskFactor::SelfHarm,
        &[
            "self[- ]?harm(?:ing)?",
            "hurt(?:ing)? myself",
            "cut(?:ting)? myself",
            "end it all",
        ],
    ),
    (
        RiskFactor::Suicide,
        &[
            "kill myself",
            "suicid(?:e|al)",
            "end my life",
            "want to die",
            "better off dead",
            "take my (?:own )?life",
        ],
    ),
    (
        RiskFactor::Crisis,
        &[
            "crisis",
            "emergency",
            "can'?t go on",
            "no way out",
            "can'?t take (?:it|this) anymore",
        ],
    ),
    (
        RiskFactor::SubstanceAbuse,
        &[
            "overdos(?:e|ed|ing)",
            "relaps(?:e|ed|ing)",
            "addict(?:ed|ion)?",
            "drinking too much",
            "drunk every",
        ],
    ),
    (
        RiskFactor::RelationshipViolence,
        &[
            "hits me",
            "hit me",
            "abusive",
            "abuses me",
            "domestic violence",
            "afraid of my (?:partner|husband|wife|boyfriend|girlfriend)",
        ],
    ),
    (
        RiskFactor::EatingDisorder,
        &[
            "starv(?:e|ing) myself",
            "binge(?:ing|d)?",
            "purg(?:e|ing)",
            "anorexi(?:a|c)",
            "bulimi(?:a|c)",
            "throw up after eating",
        ],
    ),
];

/// Emotion leaf: stateless scoring plus a bounded history
pub struct EmotionAnalyzer {
    lexicon: SentimentLexicon,
    patterns: Vec<PatternGroup<EmotionPattern>>,
    risks: Vec<PatternGroup<RiskFactor>>,
    history: BoundedHistory<EmotionalAnalysis>,
    escalation_threshold: f32,
}

impl EmotionAnalyzer {
    /// Create an analyzer with the default escalation threshold (-0.7)
    pub fn new() -> Result<Self> {
        Self::with_threshold(-0.7)
    }

    pub fn with_threshold(escalation_threshold: f32) -> Result<Self> {
        Ok(Self {
            lexicon: SentimentLexicon::new()?,
            patterns: build_groups(PATTERN_TABLE)?,
            risks: build_groups(RISK_TABLE)?,
            history: BoundedHistory::new(EMOTION_HISTORY_CAPACITY),
            escalation_threshold,
        })
    }

    pub fn set_escalation_threshold(&mut self, threshold: f32) {
        self.escalation_threshold = threshold;
    }

    /// Analyse a message and append the result to history
    pub fn analyze(&mut self, text: &str) -> EmotionalAnalysis {
        self.analyze_at(text, Utc::now())
    }

    pub fn analyze_at(&mut self, text: &str, now: DateTime<Utc>) -> EmotionalAnalysis {
        let analysis = self.classify(text, now);
        self.history.push(analysis.clone());

        debug!(
            sentiment = analysis.sentiment,
            level = %analysis.escalation_level,
            patterns = analysis.patterns.len(),
            risks = analysis.risk_factors.len(),
            "Emotion analysed"
        );

        analysis
    }

    /// Score a message without touching history
    pub fn classify(&self, text: &str, now: DateTime<Utc>) -> EmotionalAnalysis {
        let sentiment = clamp_signed_unit(self.lexicon.score(text));
        let patterns: BTreeSet<_> = matching_labels(&self.patterns, text).into_iter().collect();
        let risk_factors: BTreeSet<_> = matching_labels(&self.risks, text).into_iter().collect();
        let escalation_level = self.escalation_level(sentiment, &patterns, &risk_factors);

        EmotionalAnalysis {
            sentiment,
            patterns,
            escalation_level,
            risk_factors,
            timestamp: now,
        }
    }

    // First matching rule wins.
    fn escalation_level(
        &self,
        sentiment: f32,
        patterns: &BTreeSet<EmotionPattern>,
        risks: &BTreeSet<RiskFactor>,
    ) -> EscalationLevel {
        let threshold = clamp_signed_unit(self.escalation_threshold);

        let acute = patterns.contains(&EmotionPattern::Crisis)
            || risks.contains(&RiskFactor::Suicide)
            || risks.contains(&RiskFactor::SelfHarm);
        if acute || (sentiment < threshold && patterns.contains(&EmotionPattern::Depression)) {
            return EscalationLevel::High;
        }

        let watch = [
            EmotionPattern::Depression,
            EmotionPattern::Anxiety,
            EmotionPattern::Loneliness,
        ];
        if (sentiment < MEDIUM_SENTIMENT && patterns.len() >= 2)
            || watch.iter().any(|p| patterns.contains(p))
        {
            return EscalationLevel::Medium;
        }

        EscalationLevel::Low
    }

    /// Whether this analysis warrants a human hand-off
    pub fn should_escalate_to_human(&self, analysis: &EmotionalAnalysis) -> bool {
        if analysis.escalation_level == EscalationLevel::High {
            return true;
        }

        if analysis.has_risk(RiskFactor::SelfHarm) || analysis.has_risk(RiskFactor::Crisis) {
            return true;
        }

        let sustained = self.history.len() >= SUSTAINED_TURNS
            && self.history.last_n(SUSTAINED_TURNS).all(|entry| {
                entry.sentiment < SUSTAINED_SENTIMENT && entry.escalation_level.is_elevated()
            });

        if sustained {
            warn!(turns = SUSTAINED_TURNS, "Sustained emotional distress detected");
        }

        sustained
    }

    pub fn history(&self) -> &BoundedHistory<EmotionalAnalysis> {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// Contacts and resources for an analysis, by table lookup
pub fn generate_human_options(analysis: &EmotionalAnalysis) -> Vec<HumanOption> {
    let mut options = Vec::new();

    let crisis = analysis.escalation_level == EscalationLevel::High
        || analysis.has_pattern(EmotionPattern::Crisis)
        || analysis.has_risk(RiskFactor::SelfHarm)
        || analysis.has_risk(RiskFactor::Suicide)
        || analysis.has_risk(RiskFactor::Crisis);

    if crisis {
        options.push(HumanOption::new(
            ContactKind::Phone,
            "988 Suicide & Crisis Lifeline",
            "988",
            "Free, confidential support 24/7. Call or text 988.",
        ));
        options.push(HumanOption::new(
            ContactKind::Text,
            "Crisis Text Line",
            "741741",
            "Text HOME to 741741 to reach a trained crisis counselor.",
        ));
    }

    if analysis.has_risk(RiskFactor::RelationshipViolence) {
        options.push(HumanOption::new(
            ContactKind::Phone,
            "National Domestic Violence Hotline",
            "1-800-799-7233",
            "Confidential support for anyone experiencing abuse.",
        ));
    }

    if analysis.has_risk(RiskFactor::SubstanceAbuse) {
        options.push(HumanOption::new(
            ContactKind::Phone,
            "SAMHSA National Helpline",
            "1-800-662-4357",
            "Treatment referral and information for substance use.",
        ));
    }

    if analysis.has_risk(RiskFactor::EatingDisorder) {
        options.push(HumanOption::new(
            ContactKind::Phone,
            "ANAD Eating Disorder Helpline",
            "1-888-375-7767",
            "Peer support for people affected by eating disorders.",
        ));
    }

    let talk_to_someone = analysis.escalation_level.is_elevated()
        || [
            EmotionPattern::Depression,
            EmotionPattern::Anxiety,
            EmotionPattern::Loneliness,
            EmotionPattern::Grief,
        ]
        .iter()
        .any(|p| analysis.has_pattern(*p));

    if talk_to_someone {
        options.push(HumanOption::new(
            ContactKind::Web,
            "Find a therapist",
            "https://www.psychologytoday.com/us/therapists",
            "Search licensed therapists near you.",
        ));
    }

    options.push(HumanOption::new(
        ContactKind::Web,
        "Mental health resources",
        "https://www.nami.org/help",
        "General information and support from NAMI.",
    ));

    options
}
