//! Configuration for the anchoring layer
//!
//! `AnchorConfig` is plain data. Partial updates arrive as an
//! [`AnchorConfigPatch`] and are merged per section; nothing is validated
//! at intake. Out-of-range numbers are kept as given and clamped by the
//! scoring code that reads them.

use serde::{Deserialize, Serialize};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub cadence: CadenceConfig,
    pub stance: StanceConfig,
    pub badges: BadgeConfig,
    pub cite_gate: CiteGateConfig,
    pub reflection: ReflectionConfig,
    pub emotion: EmotionConfig,
    pub telemetry: TelemetryConfig,
}

/// Periodic interruption settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// Prompts between interruptions (3-10)
    pub interval: u32,

    /// Render the prompt tally on styled output
    pub show_tally: bool,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            interval: 5,
            show_tally: true,
        }
    }
}

/// Stance tracking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StanceConfig {
    pub enabled: bool,

    /// Drift window in minutes (10-45)
    pub window_minutes: u32,

    /// Absolute stance score that triggers an opposing view (1-3)
    pub threshold: f32,
}

impl Default for StanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_minutes: 25,
            threshold: 2.0,
        }
    }
}

/// Where claim badges are inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeGranularity {
    Off,
    #[default]
    Sentence,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeConfig {
    pub enabled: bool,
    pub granularity: BadgeGranularity,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            granularity: BadgeGranularity::Sentence,
        }
    }
}

/// Presentation of unverified claims
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    /// Label only
    #[default]
    Exploratory,
    /// Label and append a verification notice
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiteGateConfig {
    /// Factual claims without a resolvable source are labelled unverified
    pub require_resolvable: bool,
    pub fallback_mode: FallbackMode,
}

impl Default for CiteGateConfig {
    fn default() -> Self {
        Self {
            require_resolvable: true,
            fallback_mode: FallbackMode::Exploratory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    pub enabled: bool,

    /// Interpreted by the caller's UI
    pub hotkey: String,

    /// Messages longer than this many characters trigger reflection
    pub length_threshold: usize,

    /// Every Nth prompt triggers reflection
    pub prompt_interval: u64,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hotkey: "Ctrl+Shift+R".to_string(),
            length_threshold: 500,
            prompt_interval: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    pub enabled: bool,

    /// Sentiment below this, together with a depression tag, is high risk
    pub escalation_threshold: f32,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            escalation_threshold: -0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Hash identifiers and omit message text from telemetry
    pub anonymized: bool,

    /// Record telemetry at all
    pub opt_in: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            anonymized: true,
            opt_in: false,
        }
    }
}

/// Partial configuration; absent fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfigPatch {
    pub cadence: Option<CadencePatch>,
    pub stance: Option<StancePatch>,
    pub badges: Option<BadgePatch>,
    pub cite_gate: Option<CiteGatePatch>,
    pub reflection: Option<ReflectionPatch>,
    pub emotion: Option<EmotionPatch>,
    pub telemetry: Option<TelemetryPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadencePatch {
    pub interval: Option<u32>,
    pub show_tally: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StancePatch {
    pub enabled: Option<bool>,
    pub window_minutes: Option<u32>,
    pub threshold: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgePatch {
    pub enabled: Option<bool>,
    pub granularity: Option<BadgeGranularity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiteGatePatch {
    pub require_resolvable: Option<bool>,
    pub fallback_mode: Option<FallbackMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionPatch {
    pub enabled: Option<bool>,
    pub hotkey: Option<String>,
    pub length_threshold: Option<usize>,
    pub prompt_interval: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionPatch {
    pub enabled: Option<bool>,
    pub escalation_threshold: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryPatch {
    pub anonymized: Option<bool>,
    pub opt_in: Option<bool>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl AnchorConfig {
    /// Shallow-merge a patch, section by section
    pub fn merge(&mut self, patch: AnchorConfigPatch) {
        if let Some(p) = patch.cadence {
            set(&mut self.cadence.interval, p.interval);
            set(&mut self.cadence.show_tally, p.show_tally);
        }
        if let Some(p) = patch.stance {
            set(&mut self.stance.enabled, p.enabled);
            set(&mut self.stance.window_minutes, p.window_minutes);
            set(&mut self.stance.threshold, p.threshold);
        }
        if let Some(p) = patch.badges {
            set(&mut self.badges.enabled, p.enabled);
            set(&mut self.badges.granularity, p.granularity);
        }
        if let Some(p) = patch.cite_gate {
            set(&mut self.cite_gate.require_resolvable, p.require_resolvable);
            set(&mut self.cite_gate.fallback_mode, p.fallback_mode);
        }
        if let Some(p) = patch.reflection {
            set(&mut self.reflection.enabled, p.enabled);
            set(&mut self.reflection.hotkey, p.hotkey);
            set(&mut self.reflection.length_threshold, p.length_threshold);
            set(&mut self.reflection.prompt_interval, p.prompt_interval);
        }
        if let Some(p) = patch.emotion {
            set(&mut self.emotion.enabled, p.enabled);
            set(&mut self.emotion.escalation_threshold, p.escalation_threshold);
        }
        if let Some(p) = patch.telemetry {
            set(&mut self.telemetry.anonymized, p.anonymized);
            set(&mut self.telemetry.opt_in, p.opt_in);
        }
    }

    /// Builder-style merge
    pub fn merged(mut self, patch: AnchorConfigPatch) -> Self {
        self.merge(patch);
        self
    }
}
