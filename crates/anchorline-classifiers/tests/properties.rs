//! Property tests for classifier bounds, badge offsets and history eviction

use anchorline_classifiers::claims::{insert_badges, split_sentences, strip_badges};
use anchorline_classifiers::{ClaimClassifier, EmotionAnalyzer, LabelingOptions, StanceAnalyzer};
use anchorline_core::config::BadgeGranularity;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

const FRAGMENTS: &[&str] = &[
    "Tax cuts help",
    "tax the rich",
    "free markets",
    "gun control matters",
    "I feel hopeless",
    "I am so happy",
    "Studies show 40% agree",
    "According to the BBC, it rained",
    "It might be fine",
    "The cat sat down",
    "woke politics",
    "far-right groups",
    "see https://example.org/x",
    "Growth slowed (Smith, 2020)",
    "I want to end it all",
    "plain words here",
];

const TERMINATORS: &[&str] = &[". ", "! ", "? ", ".\n", ".\n\n"];

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (prop::sample::select(FRAGMENTS), prop::sample::select(TERMINATORS)),
        0..12,
    )
    .prop_map(|parts| {
        parts
            .into_iter()
            .map(|(fragment, end)| format!("{fragment}{end}"))
            .collect::<String>()
    })
}

fn granularity_strategy() -> impl Strategy<Value = BadgeGranularity> {
    prop_oneof![
        Just(BadgeGranularity::Off),
        Just(BadgeGranularity::Sentence),
        Just(BadgeGranularity::Paragraph),
    ]
}

proptest! {
    #[test]
    fn prop_stance_is_bounded(text in text_strategy()) {
        let analyzer = StanceAnalyzer::new().unwrap();
        let analysis = analyzer.classify(&text, Utc::now());
        prop_assert!((-3.0..=3.0).contains(&analysis.score));
        prop_assert!((0.0..=1.0).contains(&analysis.confidence));
    }

    #[test]
    fn prop_stance_bounded_on_arbitrary_input(text in ".{0,300}") {
        let analyzer = StanceAnalyzer::new().unwrap();
        let analysis = analyzer.classify(&text, Utc::now());
        prop_assert!((-3.0..=3.0).contains(&analysis.score));
        prop_assert!((0.0..=1.0).contains(&analysis.confidence));
    }

    #[test]
    fn prop_sentiment_is_bounded(text in text_strategy()) {
        let mut analyzer = EmotionAnalyzer::new().unwrap();
        let analysis = analyzer.analyze(&text);
        prop_assert!((-1.0..=1.0).contains(&analysis.sentiment));
        prop_assert!(analyzer.history().len() <= 10);
    }

    #[test]
    fn prop_badges_round_trip(text in text_strategy(), granularity in granularity_strategy()) {
        let classifier = ClaimClassifier::new().unwrap();
        let options = LabelingOptions { granularity, ..Default::default() };
        let output = classifier.label_text(&text, &options);

        let stripped = strip_badges(&output.annotated);
        prop_assert_eq!(&stripped, &text);

        let original: Vec<_> = split_sentences(&text).into_iter().map(|s| s.text).collect();
        let reparsed: Vec<_> = split_sentences(&stripped).into_iter().map(|s| s.text).collect();
        prop_assert_eq!(original, reparsed);
    }

    #[test]
    fn prop_badges_precede_their_sentence(text in text_strategy()) {
        let classifier = ClaimClassifier::new().unwrap();
        let claims = classifier.extract(&text, true);
        let annotated = insert_badges(&text, &claims, BadgeGranularity::Sentence);

        // Re-extracting the annotated text finds the same sentences, each
        // now prefixed with its own badge.
        let relabelled = classifier.extract(&annotated, true);
        prop_assert_eq!(relabelled.len(), claims.len());
        for (before, after) in claims.iter().zip(relabelled.iter()) {
            let expected = format!("{} {}", before.kind.badge(), before.sentence);
            prop_assert_eq!(&after.sentence, &expected);
        }
    }

    #[test]
    fn prop_same_instant_never_shrinks_history(calls in 1usize..20) {
        let mut analyzer = StanceAnalyzer::new().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut previous = 0;
        for _ in 0..calls {
            analyzer.analyze_at("tax cuts", now);
            prop_assert!(analyzer.history().len() > previous);
            previous = analyzer.history().len();
        }
    }

    #[test]
    fn prop_elapsed_window_evicts(window in 10u32..=45, extra in 1i64..120) {
        let mut analyzer = StanceAnalyzer::with_window(window).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        analyzer.analyze_at("tax cuts", start);
        analyzer.analyze_at("gun control", start);

        let later = start + Duration::minutes(i64::from(window)) + Duration::seconds(extra);
        analyzer.analyze_at("hello", later);

        prop_assert_eq!(analyzer.history().len(), 1);
        prop_assert!(analyzer.history().iter().all(|e| e.timestamp == later));
    }
}
