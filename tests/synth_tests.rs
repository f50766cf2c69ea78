mod common;

use common::FixedCommandModel;
use voxcore::config::Whitelist;
use voxcore::kernel::synth::{CommandSynthesizer, Synthesis};

fn synthesizer(model: FixedCommandModel) -> CommandSynthesizer {
    CommandSynthesizer::new(Box::new(model), Whitelist::default(), 0.6)
}

#[test]
fn test_score_buckets() {
    assert_eq!(CommandSynthesizer::bucket(-0.2), 0.98);
    assert_eq!(CommandSynthesizer::bucket(-1.5), 0.90);
    assert_eq!(CommandSynthesizer::bucket(-2.9), 0.90);
    assert_eq!(CommandSynthesizer::bucket(-3.0), 0.75);
    assert_eq!(CommandSynthesizer::bucket(-4.99), 0.75);
    assert_eq!(CommandSynthesizer::bucket(-5.0), 0.50);
    assert_eq!(CommandSynthesizer::bucket(-40.0), 0.50);
}

#[test]
fn test_courtesy_and_single_words_are_chatter() {
    assert!(CommandSynthesizer::is_chatter("Gracias"));
    assert!(CommandSynthesizer::is_chatter("  buenos días "));
    assert!(CommandSynthesizer::is_chatter("listar"));
    assert!(!CommandSynthesizer::is_chatter("lista los ficheros"));
}

#[tokio::test]
async fn test_chatter_never_reaches_the_model() {
    let model = FixedCommandModel::says("ls", -0.1);
    let synth = synthesizer(model.clone());

    assert!(synth.infer("hola").await.is_none());
    assert!(synth.infer("   ").await.is_none());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_infer_buckets_the_raw_score() {
    let synth = synthesizer(FixedCommandModel::says("  ls -la  ", -2.0));
    let (command, confidence) = synth.infer("lista los ficheros").await.unwrap();
    assert_eq!(command, "ls -la");
    assert_eq!(confidence, 0.90);
}

#[tokio::test]
async fn test_empty_translation_offers_nothing() {
    let synth = synthesizer(FixedCommandModel::says("   ", -0.1));
    assert!(synth.infer("haz algo raro").await.is_none());
}

#[test]
fn test_decide_whitelisted_runs_others_confirm() {
    let synth = synthesizer(FixedCommandModel::default());

    assert_eq!(synth.decide("ls".to_string(), 0.98), Some(Synthesis::AutoExecute("ls".to_string())));
    assert_eq!(
        synth.decide("echo hola".to_string(), 0.75),
        Some(Synthesis::AutoExecute("echo hola".to_string()))
    );
    assert_eq!(synth.decide("rm -rf /tmp/x".to_string(), 0.98), Some(Synthesis::Confirm("rm -rf /tmp/x".to_string())));
    // "lsblk" is neither exactly "ls" nor prefixed by "ls ".
    assert_eq!(synth.decide("lsblk".to_string(), 0.98), Some(Synthesis::Confirm("lsblk".to_string())));
}

#[test]
fn test_chained_commands_behind_an_allowed_prefix_need_confirmation() {
    let whitelist = Whitelist::default();
    for command in ["echo hi && rm -rf ~", "ls; reboot", "ls | sh", "echo $(id)", "echo `id`", "echo x > /etc/hosts"] {
        assert!(!whitelist.allows(command), "{} should not be allowed", command);
    }
    assert!(whitelist.allows("ls -la /tmp"));

    let synth = synthesizer(FixedCommandModel::default());
    assert_eq!(
        synth.decide("echo hi && rm -rf ~".to_string(), 0.98),
        Some(Synthesis::Confirm("echo hi && rm -rf ~".to_string()))
    );
    assert_eq!(synth.decide("ls; reboot".to_string(), 0.98), Some(Synthesis::Confirm("ls; reboot".to_string())));
}

#[test]
fn test_decide_at_or_below_floor_declines() {
    let synth = synthesizer(FixedCommandModel::default());
    assert_eq!(synth.decide("ls".to_string(), 0.6), None);
    assert_eq!(synth.decide("ls".to_string(), 0.5), None);
}
