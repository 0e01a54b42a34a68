//! Claim classifier
//!
//! Splits text into sentences and labels each by evidentiary grounding:
//!
//! 1. explicit citation ("according to", `[3]`, `(Smith, 2020)`, URLs) -> cited
//! 2. factual-sounding claim (figures, "studies show") -> unverified when the
//!    cite-gate requires resolvable sources, otherwise inference
//! 3. hedged language -> inference
//!
//! Sentences matching none are left unlabelled. Badges are inserted from the
//! last claim to the first so earlier offsets stay valid.

use crate::classifier::{ClaimLabeler, LabelingOptions};
use anchorline_core::config::{BadgeGranularity, FallbackMode};
use anchorline_core::{ClaimKind, ClaimLabel, Error, LabeledOutput, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

/// Appended in warning mode when any claim is unverified
pub const VERIFICATION_NOTICE: &str =
    "\n\nNote: some statements above could not be matched to a source.";

const ABBREVIATIONS: &[&str] = &[
    "al", "e.g", "i.e", "dr", "mr", "mrs", "ms", "prof", "vs", "st", "no", "fig",
];

/// A sentence and its byte offset in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSpan<'a> {
    pub start: usize,
    pub text: &'a str,
}

/// Split on `.`, `!`, `?` followed by whitespace or end of text, and on newlines.
///
/// Common abbreviations ("et al.", "e.g.") do not end a sentence. Returned
/// sentences are trimmed; `start` points at the first non-space character.
pub fn split_sentences(text: &str) -> Vec<SentenceSpan<'_>> {
    let mut spans = Vec::new();
    let mut segment_start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let end = match c {
            '.' | '!' | '?' => {
                let at_boundary = match chars.peek() {
                    None => true,
                    Some((_, next)) => next.is_whitespace(),
                };
                if at_boundary && !(c == '.' && ends_with_abbreviation(&text[segment_start..i])) {
                    Some(i + c.len_utf8())
                } else {
                    None
                }
            }
            '\n' => Some(i),
            _ => None,
        };

        if let Some(end) = end {
            push_span(text, segment_start, end, &mut spans);
            segment_start = end;
        }
    }

    push_span(text, segment_start, text.len(), &mut spans);
    spans
}

fn push_span<'a>(text: &'a str, start: usize, end: usize, spans: &mut Vec<SentenceSpan<'a>>) {
    let segment = &text[start..end];
    let leading = segment.len() - segment.trim_start().len();
    let trimmed = segment.trim();

    if !trimmed.is_empty() {
        spans.push(SentenceSpan {
            start: start + leading,
            text: trimmed,
        });
    }
}

fn ends_with_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    let word = word.to_ascii_lowercase();
    ABBREVIATIONS.contains(&word.as_str())
}

/// Heuristic claim classifier
pub struct ClaimClassifier {
    name: String,
    citations: Vec<Regex>,
    factual: Vec<Regex>,
    inferential: Regex,
}

impl ClaimClassifier {
    pub fn new() -> Result<Self> {
        Self::with_name("claim-heuristics")
    }

    pub fn with_name(name: impl Into<String>) -> Result<Self> {
        // Capture group 1, when present, is the extracted source.
        let citations = compile(&[
            r"(?i)\baccording to\s+([^,.;:!?]+)",
            r"(\[\d+(?:,\s*\d+)*\])",
            r"\(([A-Z][A-Za-z'\-]+(?: et al\.?)?(?: (?:and|&) [A-Z][A-Za-z'\-]+)?,? (?:1[89]|20)\d{2}[a-z]?)\)",
            r"(https?://[^\s)\]>]+)",
        ])?;

        let factual = compile(&[
            r"\b\d+(?:\.\d+)?\s*(?:%|percent\b)",
            r"(?i)\b(?:studies|research|scientists|experts|researchers|data|statistics|surveys?|evidence)\s+(?:show|shows|suggest|suggests|found|finds|indicate|indicates|prove|proves|confirm|confirms)\b",
            r"(?i)\b\d[\d,.]*\s*(?:thousand|million|billion|trillion)\b",
            r"(?i)\b(?:in|since|by)\s+(?:1[89]|20)\d{2}\b",
            r"(?i)\b(?:it is|it's)\s+(?:a\s+)?(?:well[- ])?(?:known|established|proven)\s+(?:fact|that)\b",
            r"(?i)\bthe (?:majority|average|rate|number|percentage) of\b",
        ])?;

        let inferential = Regex::new(
            r"(?i)\b(?:might|may|could|perhaps|possibly|probably|likely|unlikely|seems?|appears?|suggests?|i think|i believe|arguably|presumably|it'?s possible)\b",
        )
        .map_err(|e| Error::classifier(format!("Failed to build inference matcher: {e}")))?;

        Ok(Self {
            name: name.into(),
            citations,
            factual,
            inferential,
        })
    }

    /// Label one sentence, or `None` when it carries no claim signal
    pub fn classify_sentence(
        &self,
        sentence: &str,
        position: usize,
        require_resolvable: bool,
    ) -> Option<ClaimLabel> {
        if let Some(source) = self.find_citation(sentence) {
            return Some(ClaimLabel {
                kind: ClaimKind::Cited,
                confidence: 0.9,
                source: Some(source),
                sentence: sentence.to_string(),
                position,
            });
        }

        if self.factual.iter().any(|re| re.is_match(sentence)) {
            let (kind, confidence) = if require_resolvable {
                (ClaimKind::Unverified, 0.7)
            } else {
                (ClaimKind::Inference, 0.5)
            };
            return Some(ClaimLabel {
                kind,
                confidence,
                source: None,
                sentence: sentence.to_string(),
                position,
            });
        }

        if self.inferential.is_match(sentence) {
            return Some(ClaimLabel {
                kind: ClaimKind::Inference,
                confidence: 0.6,
                source: None,
                sentence: sentence.to_string(),
                position,
            });
        }

        None
    }

    fn find_citation(&self, sentence: &str) -> Option<String> {
        self.citations.iter().find_map(|re| {
            re.captures(sentence).map(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str().trim().trim_end_matches('.').to_string())
                    .unwrap_or_default()
            })
        })
    }

    /// Extract claims in position order
    pub fn extract(&self, text: &str, require_resolvable: bool) -> Vec<ClaimLabel> {
        split_sentences(text)
            .into_iter()
            .filter_map(|s| self.classify_sentence(s.text, s.start, require_resolvable))
            .collect()
    }

    /// Label and annotate `text`
    pub fn label_text(&self, text: &str, options: &LabelingOptions) -> LabeledOutput {
        let claims = self.extract(text, options.require_resolvable);
        let mut annotated = insert_badges(text, &claims, options.granularity);

        let has_unverified = claims.iter().any(|c| c.kind == ClaimKind::Unverified);
        if options.fallback_mode == FallbackMode::Warning && has_unverified {
            annotated.push_str(VERIFICATION_NOTICE);
        }

        debug!(
            labeler = %self.name,
            claims = claims.len(),
            granularity = ?options.granularity,
            "Claims labelled"
        );

        LabeledOutput {
            original: text.to_string(),
            claims,
            annotated,
            opposing_glance: None,
        }
    }
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| Error::classifier(format!("Failed to build claim pattern: {e}")))
        })
        .collect()
}

#[async_trait]
impl ClaimLabeler for ClaimClassifier {
    async fn label(&self, text: &str, options: &LabelingOptions) -> Result<LabeledOutput> {
        Ok(self.label_text(text, options))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Insert a badge per claim, last claim first.
///
/// `Sentence` puts the badge at the sentence start; `Paragraph` at the start
/// of the enclosing paragraph (after the nearest preceding blank line).
pub fn insert_badges(text: &str, claims: &[ClaimLabel], granularity: BadgeGranularity) -> String {
    let mut annotated = text.to_string();
    if granularity == BadgeGranularity::Off || claims.is_empty() {
        return annotated;
    }

    let mut ordered: Vec<&ClaimLabel> = claims.iter().collect();
    ordered.sort_by(|a, b| b.position.cmp(&a.position));

    for claim in ordered {
        let at = match granularity {
            BadgeGranularity::Paragraph => paragraph_start(text, claim.position),
            BadgeGranularity::Sentence | BadgeGranularity::Off => claim.position,
        };

        if at <= annotated.len() && annotated.is_char_boundary(at) {
            annotated.insert_str(at, &format!("{} ", claim.kind.badge()));
        }
    }

    annotated
}

fn paragraph_start(text: &str, position: usize) -> usize {
    let position = position.min(text.len());
    text.get(..position)
        .and_then(|prefix| prefix.rfind("\n\n"))
        .map(|idx| idx + 2)
        .unwrap_or(0)
}

/// Remove every badge inserted by [`insert_badges`]
pub fn strip_badges(text: &str) -> String {
    ClaimKind::ALL.iter().fold(text.to_string(), |acc, kind| {
        acc.replace(&format!("{} ", kind.badge()), "")
    })
}
