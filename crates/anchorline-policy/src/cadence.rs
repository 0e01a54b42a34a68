//! Cadence policy
//!
//! Pure functions of the prompt count: whether a periodic "red reply"
//! interruption is due, the saturating prompt tally, the break reminder,
//! and a feedback-driven interval suggestion.

use crate::modifications::{InjectPosition, TextModification};
use anchorline_core::{FeedbackContext, FeedbackEntry, Rating};
use chrono::Duration;

pub const MIN_INTERVAL: u32 = 3;
pub const MAX_INTERVAL: u32 = 10;

/// Ticks shown before the tally switches to an overflow count
pub const MAX_TALLY_TICKS: u64 = 10;

/// Break reminder fires from this many prompts
pub const BREAK_PROMPTS: u64 = 30;

/// Break reminder fires after this many minutes in one session
pub const BREAK_MINUTES: i64 = 45;

pub fn clamp_interval(interval: u32) -> u32 {
    interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
}

/// Due when `prompt_count > 0` and `prompt_count` is a multiple of the interval
pub fn should_apply_red_reply(prompt_count: u64, interval: u32) -> bool {
    let interval = u64::from(clamp_interval(interval));
    prompt_count > 0 && prompt_count % interval == 0
}

/// One tick per prompt in groups of five, capped with a `+N` overflow.
///
/// `render_tally(12)` is `"||||| ||||| +2"`.
pub fn render_tally(prompt_count: u64) -> String {
    let visible = prompt_count.min(MAX_TALLY_TICKS);
    let mut tally = String::new();

    for i in 0..visible {
        if i > 0 && i % 5 == 0 {
            tally.push(' ');
        }
        tally.push('|');
    }

    if prompt_count > MAX_TALLY_TICKS {
        tally.push_str(&format!(" +{}", prompt_count - MAX_TALLY_TICKS));
    }

    tally
}

/// Independent of the cadence interval
pub fn should_show_break_reminder(prompt_count: u64, elapsed: Duration) -> bool {
    prompt_count >= BREAK_PROMPTS || elapsed >= Duration::minutes(BREAK_MINUTES)
}

/// Nudge the interval by one from cadence-tagged feedback.
///
/// More thumbs-down than up lengthens the interval (fewer interruptions),
/// the reverse shortens it. Result stays within 3-10.
pub fn suggest_interval<'a>(
    current: u32,
    feedback: impl IntoIterator<Item = &'a FeedbackEntry>,
) -> u32 {
    let (mut up, mut down) = (0i64, 0i64);
    for entry in feedback {
        if entry.context != FeedbackContext::Cadence {
            continue;
        }
        match entry.rating {
            Rating::Up => up += 1,
            Rating::Down => down += 1,
        }
    }

    let current = clamp_interval(current);
    match (down - up).signum() {
        1 => clamp_interval(current + 1),
        -1 => clamp_interval(current.saturating_sub(1)),
        _ => current,
    }
}

/// Cadence verdict for one prompt count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadenceVerdict {
    pub prompt_count: u64,
    pub red_reply: bool,
    pub tally: Option<String>,
    pub break_reminder: bool,
}

impl CadenceVerdict {
    pub fn evaluate(prompt_count: u64, interval: u32, show_tally: bool, elapsed: Duration) -> Self {
        Self {
            prompt_count,
            red_reply: should_apply_red_reply(prompt_count, interval),
            tally: (show_tally && prompt_count > 0).then(|| render_tally(prompt_count)),
            break_reminder: should_show_break_reminder(prompt_count, elapsed),
        }
    }

    /// Text injections realising this verdict
    pub fn modifications(&self) -> Vec<TextModification> {
        let mut mods = Vec::new();

        if self.red_reply {
            mods.push(TextModification::new(
                format!(
                    "[Reality check | prompt {}] You are talking with an AI model. \
                     Take a moment to consider whether this conversation is still useful to you.\n\n",
                    self.prompt_count
                ),
                InjectPosition::Before,
            ));
        }

        if let Some(tally) = &self.tally {
            mods.push(TextModification::new(
                format!("\n\n[prompts: {tally}]"),
                InjectPosition::After,
            ));
        }

        if self.break_reminder {
            mods.push(TextModification::new(
                "\n\n[You have been chatting for a while. Consider taking a short break.]",
                InjectPosition::After,
            ));
        }

        mods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn entry(rating: Rating, context: FeedbackContext) -> FeedbackEntry {
        FeedbackEntry {
            rating,
            reason: String::new(),
            context,
            prompt_count: 1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_interval_five() {
        let due: Vec<u64> = (0..=15).filter(|n| should_apply_red_reply(*n, 5)).collect();
        assert_eq!(due, vec![5, 10, 15]);
    }

    #[test]
    fn test_out_of_range_interval_is_clamped() {
        assert!(should_apply_red_reply(3, 1));
        assert!(!should_apply_red_reply(2, 1));
        assert!(should_apply_red_reply(10, 50));
        assert!(!should_apply_red_reply(20 + 5, 50));
    }

    #[test]
    fn test_render_tally() {
        assert_eq!(render_tally(0), "");
        assert_eq!(render_tally(3), "|||");
        assert_eq!(render_tally(5), "|||||");
        assert_eq!(render_tally(7), "||||| ||");
        assert_eq!(render_tally(10), "||||| |||||");
        assert_eq!(render_tally(12), "||||| ||||| +2");
    }

    #[test]
    fn test_break_reminder() {
        assert!(!should_show_break_reminder(5, Duration::minutes(10)));
        assert!(should_show_break_reminder(30, Duration::minutes(1)));
        assert!(should_show_break_reminder(2, Duration::minutes(45)));
    }

    #[test]
    fn test_suggest_interval() {
        let downs = vec![
            entry(Rating::Down, FeedbackContext::Cadence),
            entry(Rating::Down, FeedbackContext::Cadence),
            entry(Rating::Up, FeedbackContext::Cadence),
            entry(Rating::Up, FeedbackContext::Stance),
            entry(Rating::Up, FeedbackContext::Stance),
        ];
        assert_eq!(suggest_interval(5, &downs), 6);
        assert_eq!(suggest_interval(10, &downs), 10);

        let ups = vec![entry(Rating::Up, FeedbackContext::Cadence)];
        assert_eq!(suggest_interval(5, &ups), 4);
        assert_eq!(suggest_interval(3, &ups), 3);

        assert_eq!(suggest_interval(7, &Vec::<FeedbackEntry>::new()), 7);
    }

    #[test]
    fn test_verdict_modifications() {
        let verdict = CadenceVerdict::evaluate(5, 5, true, Duration::minutes(1));
        assert!(verdict.red_reply);
        assert_eq!(verdict.tally.as_deref(), Some("|||||"));
        assert!(!verdict.break_reminder);

        let mods = verdict.modifications();
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[0].position, InjectPosition::Before);
        assert!(mods[0].content.contains("prompt 5"));

        let quiet = CadenceVerdict::evaluate(4, 5, false, Duration::minutes(1));
        assert!(quiet.modifications().is_empty());
    }

    proptest! {
        #[test]
        fn prop_red_reply_periodicity(n in 0u64..10_000, interval in 3u32..=10) {
            let expected = n > 0 && n % u64::from(interval) == 0;
            prop_assert_eq!(should_apply_red_reply(n, interval), expected);
        }

        #[test]
        fn prop_suggestion_in_bounds(current in 0u32..20, ups in 0usize..8, downs in 0usize..8) {
            let mut entries = Vec::new();
            entries.extend((0..ups).map(|_| entry(Rating::Up, FeedbackContext::Cadence)));
            entries.extend((0..downs).map(|_| entry(Rating::Down, FeedbackContext::Cadence)));
            let suggested = suggest_interval(current, &entries);
            prop_assert!((MIN_INTERVAL..=MAX_INTERVAL).contains(&suggested));
        }
    }
}
