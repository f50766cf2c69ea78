mod common;

use common::{catalog, intent, FixedClassifier};
use voxcore::config::Thresholds;
use voxcore::kernel::intent::matcher::{best_fuzzy, exact_match, token_set_ratio};
use voxcore::kernel::intent::{ConfidenceTier, IntentCatalog, IntentClassifierCascade, MatchStrategy};
use voxcore::EngineError;

fn radio_catalog() -> IntentCatalog {
    IntentCatalog::new(vec![
        intent("radio", &["pon la radio"], "Radio.", "responder_simple"),
        intent("radio_clasica", &["pon la radio clásica"], "Clásica.", "responder_simple"),
    ])
    .unwrap()
}

#[test]
fn test_longest_substring_trigger_wins() {
    let catalog = radio_catalog();
    let (trigger, intent) = exact_match(&catalog, "Neo, pon la radio clásica ahora").unwrap();
    assert_eq!(trigger, "pon la radio clásica");
    assert_eq!(intent.name, "radio_clasica");

    let (_, intent) = exact_match(&catalog, "pon la radio").unwrap();
    assert_eq!(intent.name, "radio");
}

#[test]
fn test_token_set_ratio_ignores_order() {
    assert_eq!(token_set_ratio("radio la pon", "pon la radio"), 100);
    assert_eq!(token_set_ratio("por favor pon la radio", "pon la radio"), 100);
    assert!(token_set_ratio("qué tiempo hace", "pon la radio") < 85);
    assert_eq!(token_set_ratio("", "pon la radio"), 0);
}

#[test]
fn test_best_fuzzy_reports_max_score() {
    let catalog = radio_catalog();
    let (_, _, score) = best_fuzzy(&catalog, "radio pon la").unwrap();
    assert_eq!(score, 100);
}

#[tokio::test]
async fn test_exact_match_is_high_tier() {
    let cascade = IntentClassifierCascade::new(catalog(), Thresholds::default());
    let candidate = cascade.resolve("hola, ¿qué tal?").await.unwrap();
    assert_eq!(candidate.intent.name, "saludo");
    assert_eq!(candidate.strategy, MatchStrategy::Exact);
    assert_eq!(candidate.score, 100);
    assert_eq!(candidate.tier, ConfidenceTier::High);
}

#[tokio::test]
async fn test_fuzzy_match_accepts_reordered_words() {
    let cascade = IntentClassifierCascade::new(radio_catalog(), Thresholds::default());
    let candidate = cascade.resolve("la radio pon").await.unwrap();
    assert_eq!(candidate.strategy, MatchStrategy::Fuzzy);
    assert!(candidate.score >= 85);
}

#[tokio::test]
async fn test_fuzzy_below_threshold_is_never_accepted() {
    let thresholds = Thresholds { fuzzy_accept: 85, ..Thresholds::default() };
    let cascade = IntentClassifierCascade::new(radio_catalog(), thresholds);
    assert!(cascade.resolve("qué tiempo hace mañana").await.is_none());
}

#[tokio::test]
async fn test_earlier_strategy_preempts_classifier() {
    let classifier = FixedClassifier::says("musica", 0.99);
    let cascade =
        IntentClassifierCascade::new(catalog(), Thresholds::default()).with_classifier(Box::new(classifier.clone()));

    let candidate = cascade.resolve("hola").await.unwrap();

    assert_eq!(candidate.intent.name, "saludo");
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn test_classifier_confidence_sets_tier() {
    let cascade = IntentClassifierCascade::new(catalog(), Thresholds::default())
        .with_classifier(Box::new(FixedClassifier::says("musica", 0.7)));
    let candidate = cascade.resolve("algo para relajarme").await.unwrap();
    assert_eq!(candidate.strategy, MatchStrategy::Classifier);
    assert_eq!(candidate.score, 70);
    assert_eq!(candidate.tier, ConfidenceTier::Low);

    let cascade = IntentClassifierCascade::new(catalog(), Thresholds::default())
        .with_classifier(Box::new(FixedClassifier::says("musica", 0.9)));
    let candidate = cascade.resolve("algo para relajarme").await.unwrap();
    assert_eq!(candidate.tier, ConfidenceTier::High);
}

#[tokio::test]
async fn test_classifier_floor_and_unknown_names_decline() {
    let cascade = IntentClassifierCascade::new(catalog(), Thresholds::default())
        .with_classifier(Box::new(FixedClassifier::says("musica", 0.5)));
    assert!(cascade.resolve("algo para relajarme").await.is_none());

    let cascade = IntentClassifierCascade::new(catalog(), Thresholds::default())
        .with_classifier(Box::new(FixedClassifier::says("no_existe", 0.95)));
    assert!(cascade.resolve("algo para relajarme").await.is_none());
}

#[test]
fn test_catalog_rejects_intents_without_triggers_or_responses() {
    let mut empty = intent("vacio", &["algo"], "x", "responder_simple");
    empty.triggers = vec!["   ".to_string()];
    assert!(matches!(IntentCatalog::new(vec![empty]), Err(EngineError::InvalidIntent(..))));

    let mut mute = intent("mudo", &["algo"], "x", "responder_simple");
    mute.responses.clear();
    assert!(matches!(IntentCatalog::new(vec![mute]), Err(EngineError::InvalidIntent(..))));

    let dup = vec![
        intent("a", &["uno"], "x", "responder_simple"),
        intent("a", &["dos"], "x", "responder_simple"),
    ];
    assert!(IntentCatalog::new(dup).is_err());
}

#[test]
fn test_registry_refuses_unknown_actions() {
    let mut registry = voxcore::kernel::actions::ActionRegistry::new();
    voxcore::skills::register_builtin(&mut registry);
    assert!(registry.validate(&catalog()).is_ok());

    let bad = IntentCatalog::new(vec![intent("x", &["x"], "x", "no_such_action")]).unwrap();
    assert!(matches!(
        registry.validate(&bad),
        Err(EngineError::UnknownAction { ref action, .. }) if action == "no_such_action"
    ));
}
