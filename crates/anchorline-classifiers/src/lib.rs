//! Anchorline Classifiers
//!
//! Lightweight, deterministic classifiers for the anchoring layer:
//! - Claim labelling of model output (cited / inference / unverified)
//! - Emotional risk scoring of user messages with a bounded history
//! - Ideological stance scoring with a time-windowed history and
//!   templated opposing views
//!
//! All classifiers are pattern based and run in microseconds. Output-side
//! steps sit behind async traits so a generative backend can replace them.

pub mod claims;
pub mod classifier;
pub mod emotion;
pub mod patterns;
pub mod sentiment;
pub mod stance;

pub use claims::{insert_badges, split_sentences, strip_badges, ClaimClassifier, SentenceSpan};
pub use classifier::{ClaimLabeler, CounterpointGenerator, LabelingOptions};
pub use emotion::{generate_human_options, EmotionAnalyzer};
pub use sentiment::SentimentLexicon;
pub use stance::{generate_opposing_glance, StanceAnalyzer, TemplateCounterpoints};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::claims::ClaimClassifier;
    pub use crate::classifier::{ClaimLabeler, CounterpointGenerator, LabelingOptions};
    pub use crate::emotion::EmotionAnalyzer;
    pub use crate::stance::{StanceAnalyzer, TemplateCounterpoints};
}
