//! Ideological stance classifier
//!
//! Topic tags come from independent pattern groups. The score is a weighted
//! vote of polarity markers, normalised by total marker weight and scaled to
//! [-3, 3] (negative leans left, positive leans right). History is evicted by
//! age, not count: every analysis drops entries older than the window.

use crate::classifier::CounterpointGenerator;
use crate::patterns::{build_groups, matching_labels, PatternGroup};
use anchorline_core::types::{clamp_stance, clamp_unit, STANCE_LIMIT};
use anchorline_core::{
    BoundedHistory, Error, OpposingGlance, Result, StanceAnalysis, StanceDirection, Topic,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use tracing::debug;

/// Hard cap on retained analyses, independent of the time window
const STANCE_HISTORY_CAPACITY: usize = 256;

/// Entries averaged for drift detection
const DRIFT_SAMPLES: usize = 3;

/// Window bounds in minutes
const MIN_WINDOW_MINUTES: u32 = 10;
const MAX_WINDOW_MINUTES: u32 = 45;

/// Threshold bounds
const MIN_THRESHOLD: f32 = 1.0;
const MAX_THRESHOLD: f32 = 3.0;

const TOPIC_TABLE: &[(Topic, &[&str])] = &[
    (
        Topic::Politics,
        &[
            "elections?",
            "vot(?:e|es|ing|ers?)",
            "congress",
            "senate",
            "president(?:ial)?",
            "democrats?",
            "democratic party",
            "republicans?",
            "liberals?",
            "conservatives?",
            "politic(?:s|al|ians?)",
            "partisan",
            "left-wing",
            "right-wing",
            "government",
        ],
    ),
    (
        Topic::Economics,
        &[
            "tax(?:es)?",
            "econom(?:y|ic|ics)",
            "inflation",
            "wages?",
            "markets?",
            "capitalis(?:m|t)",
            "socialis(?:m|t)",
            "welfare",
            "trade",
            "tariffs?",
            "budget",
            "deficit",
        ],
    ),
    (
        Topic::Social,
        &[
            "immigra(?:tion|nts?)",
            "abortion",
            "guns?",
            "marriage",
            "equality",
            "diversity",
            "religio(?:n|us)",
            "police",
            "racism",
            "gender",
            "borders?",
        ],
    ),
    (
        Topic::Technology,
        &[
            "ai",
            "artificial intelligence",
            "big tech",
            "privacy",
            "surveillance",
            "social media",
            "algorithms?",
            "crypto(?:currency)?",
            "censorship",
        ],
    ),
    (
        Topic::Health,
        &[
            "health ?care",
            "vaccin(?:e|es|ation)",
            "medicare",
            "medicaid",
            "insurance",
            "pandemic",
            "mask mandates?",
            "public health",
            "drug prices",
        ],
    ),
];

const EXPLICIT_POLITICS: &[&str] = &[
    "democrats?",
    "republicans?",
    "liberals?",
    "conservatives?",
    "left-wing",
    "right-wing",
    "gop",
    "maga",
];

/// (direction sign, weight, markers)
const POLARITY_TABLE: &[(f32, f32, &[&str])] = &[
    (
        -1.0,
        1.0,
        &[
            "progressive",
            "social justice",
            "systemic racism",
            "universal healthcare",
            "medicare for all",
            "tax the rich",
            "wealth tax",
            "gun control",
            "climate crisis",
            "climate justice",
            "workers'? rights",
            "income inequality",
            "living wage",
            "reproductive rights",
            "pro-choice",
            "defund the police",
            "green new deal",
            "regulate big tech",
        ],
    ),
    (
        -1.0,
        1.5,
        &["far-right", "fascis(?:m|t|ts)", "late-stage capitalism"],
    ),
    (
        1.0,
        1.0,
        &[
            "free markets?",
            "tax cuts",
            "lower taxes",
            "small government",
            "deregulation",
            "border security",
            "illegal immigra(?:tion|nts?)",
            "second amendment",
            "gun rights",
            "pro-life",
            "traditional values",
            "family values",
            "law and order",
            "personal responsibility",
            "school choice",
            "big government",
            "fiscal responsibility",
            "religious liberty",
            "energy independence",
        ],
    ),
    (1.0, 1.5, &["radical left", "woke", "marxis(?:m|t|ts)"]),
];

struct PolarityGroup {
    sign: f32,
    weight: f32,
    group: PatternGroup<()>,
}

/// Stance leaf: scoring plus a time-windowed history
pub struct StanceAnalyzer {
    topics: Vec<PatternGroup<Topic>>,
    explicit: PatternGroup<()>,
    polarity: Vec<PolarityGroup>,
    history: BoundedHistory<StanceAnalysis>,
    window: Duration,
}

impl StanceAnalyzer {
    /// Create an analyzer with the default 25 minute window
    pub fn new() -> Result<Self> {
        Self::with_window(25)
    }

    pub fn with_window(window_minutes: u32) -> Result<Self> {
        let polarity = POLARITY_TABLE
            .iter()
            .map(|(sign, weight, markers)| {
                Ok(PolarityGroup {
                    sign: *sign,
                    weight: *weight,
                    group: PatternGroup::new((), markers)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            topics: build_groups(TOPIC_TABLE)?,
            explicit: PatternGroup::new((), EXPLICIT_POLITICS)?,
            polarity,
            history: BoundedHistory::new(STANCE_HISTORY_CAPACITY),
            window: window_duration(window_minutes),
        })
    }

    /// Change the drift window; out-of-range values are clamped to 10-45
    pub fn set_window(&mut self, window_minutes: u32) {
        self.window = window_duration(window_minutes);
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn analyze(&mut self, text: &str) -> StanceAnalysis {
        self.analyze_at(text, Utc::now())
    }

    /// Evict stale history, score `text`, and record the result
    pub fn analyze_at(&mut self, text: &str, now: DateTime<Utc>) -> StanceAnalysis {
        self.evict(now);

        let analysis = self.classify(text, now);
        self.history.push(analysis.clone());

        debug!(
            score = analysis.score,
            confidence = analysis.confidence,
            topics = analysis.topics.len(),
            history = self.history.len(),
            "Stance analysed"
        );

        analysis
    }

    /// Score a message without touching history
    pub fn classify(&self, text: &str, now: DateTime<Utc>) -> StanceAnalysis {
        let topics: BTreeSet<Topic> = matching_labels(&self.topics, text).into_iter().collect();

        let mut signed = 0.0f32;
        let mut total = 0.0f32;
        for polarity in &self.polarity {
            let hits = polarity.group.count(text) as f32;
            signed += polarity.sign * polarity.weight * hits;
            total += polarity.weight * hits;
        }

        let score = if total == 0.0 {
            0.0
        } else {
            clamp_stance(signed / total * STANCE_LIMIT)
        };

        let mut confidence = topics.len() as f32 * 0.2;
        if self.explicit.is_match(text) {
            confidence += 0.3;
        }
        let length = text.chars().count();
        if length > 200 {
            confidence += 0.2;
        } else if length > 50 {
            confidence += 0.1;
        }

        StanceAnalysis {
            score,
            confidence: clamp_unit(confidence),
            topics,
            timestamp: now,
        }
    }

    /// Acute or gradual drift past the threshold.
    ///
    /// True when `|score| >= threshold`, or when the average of the last three
    /// in-window analyses reaches the threshold. Threshold is clamped to 1-3.
    pub fn should_show_opposing_glance(&self, analysis: &StanceAnalysis, threshold: f32) -> bool {
        let threshold = clamp_threshold(threshold);

        if analysis.score.abs() >= threshold {
            return true;
        }

        match self.rolling_average(analysis.timestamp) {
            Some(avg) => avg.abs() >= threshold,
            None => false,
        }
    }

    /// Average of the last three in-window scores, if there are three
    pub fn rolling_average(&self, now: DateTime<Utc>) -> Option<f32> {
        let cutoff = now - self.window;
        let recent: Vec<f32> = self
            .history
            .iter()
            .filter(|entry| entry.timestamp >= cutoff)
            .map(|entry| entry.score)
            .collect();

        if recent.len() < DRIFT_SAMPLES {
            return None;
        }

        let tail = &recent[recent.len() - DRIFT_SAMPLES..];
        Some(tail.iter().sum::<f32>() / DRIFT_SAMPLES as f32)
    }

    pub fn history(&self) -> &BoundedHistory<StanceAnalysis> {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        self.history.retain(|entry| entry.timestamp >= cutoff);
    }
}

fn window_duration(minutes: u32) -> Duration {
    Duration::minutes(i64::from(minutes.clamp(MIN_WINDOW_MINUTES, MAX_WINDOW_MINUTES)))
}

pub fn clamp_threshold(threshold: f32) -> f32 {
    if threshold.is_nan() {
        return MAX_THRESHOLD;
    }
    threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

/// Build a templated counter-perspective for `analysis`.
///
/// The target pushes one unit further from zero on the opposite side,
/// capped at +/-3. A neutral score yields a neutral, topic-generic note.
pub fn generate_opposing_glance(analysis: &StanceAnalysis, now: DateTime<Utc>) -> OpposingGlance {
    let score = clamp_stance(analysis.score);
    let target_score = if score == 0.0 {
        0.0
    } else {
        clamp_stance(-score - score.signum())
    };
    let direction = StanceDirection::of(target_score);
    let topic = analysis.primary_topic();

    OpposingGlance {
        original_score: score,
        target_score,
        topic,
        direction,
        content: counter_statement(topic, direction).to_string(),
        citations: citations(topic).iter().map(|c| c.to_string()).collect(),
        timestamp: now,
    }
}

fn counter_statement(topic: Option<Topic>, direction: StanceDirection) -> &'static str {
    use StanceDirection::{Left, Neutral, Right};

    match (topic, direction) {
        (_, Neutral) => {
            "Thoughtful people disagree on this; it may help to look at how several sources frame it."
        }
        (Some(Topic::Politics), Left) => {
            "Many argue that government action is needed to protect vulnerable groups and correct structural inequities that markets leave in place."
        }
        (Some(Topic::Politics), Right) => {
            "Many argue that limited government, local control, and individual liberty produce better outcomes than centralized programs."
        }
        (Some(Topic::Economics), Left) => {
            "Some economists point out that progressive taxation and public investment can reduce inequality without harming long-run growth."
        }
        (Some(Topic::Economics), Right) => {
            "Some economists point out that lower taxes and lighter regulation can spur investment, job creation, and wage growth."
        }
        (Some(Topic::Social), Left) => {
            "Advocates emphasize expanding rights and protections so that policies account for people whose experiences differ from the majority."
        }
        (Some(Topic::Social), Right) => {
            "Advocates emphasize the role of family, community, and long-standing institutions in maintaining social stability."
        }
        (Some(Topic::Technology), Left) => {
            "Critics argue that stronger oversight of large technology companies is needed to protect privacy and competition."
        }
        (Some(Topic::Technology), Right) => {
            "Critics argue that heavy regulation of technology slows innovation and entrenches the incumbents it aims to restrain."
        }
        (Some(Topic::Health), Left) => {
            "Supporters of broader public coverage note that universal systems elsewhere achieve comparable outcomes at lower cost."
        }
        (Some(Topic::Health), Right) => {
            "Supporters of market-based care note that competition and patient choice can improve quality and reduce waiting times."
        }
        (None, Left) => {
            "Others would stress collective responsibility and the role of public institutions in addressing this issue."
        }
        (None, Right) => {
            "Others would stress individual responsibility and the limits of what public institutions can achieve here."
        }
    }
}

fn citations(topic: Option<Topic>) -> &'static [&'static str] {
    match topic {
        Some(Topic::Politics) => &["Pew Research Center", "AllSides balanced news"],
        Some(Topic::Economics) => &["Congressional Budget Office", "Tax Policy Center"],
        Some(Topic::Social) => &["Pew Research Center", "Gallup"],
        Some(Topic::Technology) => &[
            "Electronic Frontier Foundation",
            "Information Technology and Innovation Foundation",
        ],
        Some(Topic::Health) => &["Kaiser Family Foundation", "Commonwealth Fund"],
        None => &["AllSides balanced news"],
    }
}

/// Counterpoint generator backed by the template table
#[derive(Debug, Clone, Default)]
pub struct TemplateCounterpoints;

#[async_trait]
impl CounterpointGenerator for TemplateCounterpoints {
    async fn opposing_glance(&self, analysis: &StanceAnalysis) -> Result<OpposingGlance> {
        if analysis.score.is_nan() {
            return Err(Error::generation("stance score is not a number"));
        }
        Ok(generate_opposing_glance(analysis, Utc::now()))
    }

    fn name(&self) -> &str {
        "template-counterpoints"
    }
}
