mod common;

use std::sync::Arc;
use tokio::sync::mpsc;

use common::{at, monday_morning, HarnessBuilder};
use voxcore::kernel::event::{Event, InputEvent, SpeakerStatus};
use voxcore::kernel::presence::Presence;
use voxcore::kernel::telemetry::TelemetryEvent;
use voxcore::kernel::time::ManualClock;
use voxcore::outputs::RecordingSink;
use voxcore::Reactor;

fn reactor() -> (Reactor, RecordingSink, ManualClock, mpsc::Sender<Event>) {
    let h = HarnessBuilder::new().build();
    let clock = ManualClock::new(monday_morning());
    let (tx, rx) = mpsc::channel(16);
    let presence = Presence::new("neo", std::time::Duration::from_secs(8));
    let reactor = Reactor::new(rx, presence, h.dispatcher, Arc::new(clock.clone()));
    (reactor, h.sink, clock, tx)
}

fn input(text: &str) -> Event {
    Event::Input(InputEvent::text("test", text))
}

#[tokio::test]
async fn test_utterance_without_wake_word_is_ignored() {
    let (mut reactor, sink, _, _tx) = reactor();

    assert!(reactor.step(input("hola")).await);

    assert!(sink.spoken().is_empty());
    assert_eq!(reactor.dispatcher().telemetry().snapshot().drop_stats.no_wake_word, 1);
}

#[tokio::test]
async fn test_wake_word_utterance_is_dispatched() {
    let (mut reactor, sink, _, _tx) = reactor();

    reactor.step(input("Neo, hola")).await;

    assert_eq!(sink.spoken(), vec!["¡Hola!"]);
    assert_eq!(reactor.dispatcher().telemetry().snapshot().resolution_stats.total, 1);
}

#[tokio::test]
async fn test_speaking_drops_input_until_idle() {
    let (mut reactor, sink, _, _tx) = reactor();

    reactor.step(Event::Speaker(SpeakerStatus::Speaking)).await;
    reactor.step(input("neo hola")).await;
    assert!(sink.spoken().is_empty());
    assert_eq!(reactor.dispatcher().telemetry().snapshot().drop_stats.busy, 1);

    reactor.step(Event::Speaker(SpeakerStatus::Idle)).await;
    reactor.step(input("hola")).await;
    assert_eq!(sink.spoken(), vec!["¡Hola!"]);
}

#[tokio::test]
async fn test_bare_wake_word_only_opens_the_window() {
    let (mut reactor, sink, _, _tx) = reactor();

    reactor.step(input("neo")).await;
    assert!(sink.spoken().is_empty());
    assert_eq!(reactor.dispatcher().telemetry().snapshot().drop_stats.empty, 1);

    reactor.step(input("hola")).await;
    assert_eq!(sink.spoken(), vec!["¡Hola!"]);
}

#[tokio::test]
async fn test_listening_window_closes_with_the_clock() {
    let (mut reactor, sink, clock, _tx) = reactor();

    reactor.step(input("neo hola")).await;
    clock.advance(chrono::Duration::seconds(30));
    reactor.step(input("hola")).await;

    assert_eq!(sink.spoken(), vec!["¡Hola!"]);
}

#[tokio::test]
async fn test_proactive_tick_announces_timer() {
    let (mut reactor, sink, _, _tx) = reactor();

    reactor.step(input("neo pon un temporizador de 1 minutos")).await;
    reactor.step(Event::ProactiveTick(at(10, 1))).await;

    let spoken = sink.spoken();
    assert_eq!(spoken.last().map(String::as_str), Some("¡El tiempo del temporizador ha terminado!"));
    assert_eq!(reactor.dispatcher().telemetry().snapshot().timers_fired, 1);
}

#[tokio::test]
async fn test_shutdown_stops_the_loop() {
    let (mut reactor, _, _, _tx) = reactor();
    assert!(!reactor.step(Event::Shutdown).await);
}

#[tokio::test]
async fn test_run_drains_queue_and_summarises() {
    let (mut reactor, sink, _, tx) = reactor();

    tx.send(input("neo hola")).await.unwrap();
    tx.send(input("hola")).await.unwrap();
    tx.send(Event::Shutdown).await.unwrap();
    tx.send(input("neo hola")).await.unwrap();

    let summary = reactor.run().await;

    assert_eq!(sink.spoken(), vec!["¡Hola!", "¡Hola!"]);
    match summary {
        TelemetryEvent::SessionSummary { utterances, apologies, .. } => {
            assert_eq!(utterances, 2);
            assert_eq!(apologies, 0);
        }
        other => panic!("expected a session summary, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_ends_when_producers_are_gone() {
    let (mut reactor, _, _, tx) = reactor();
    drop(tx);
    assert!(matches!(reactor.run().await, TelemetryEvent::SessionSummary { .. }));
}

#[tokio::test]
async fn test_proactive_loop_ticks_until_cancelled() {
    use tokio_util::sync::CancellationToken;
    use voxcore::kernel::scheduler::ProactiveLoop;

    let (tx, mut rx) = mpsc::channel(4);
    let cancel = CancellationToken::new();
    let clock = ManualClock::new(at(7, 30));
    let task = tokio::spawn(
        ProactiveLoop::new(tx, Arc::new(clock), std::time::Duration::from_millis(5), cancel.clone()).run(),
    );

    match rx.recv().await {
        Some(Event::ProactiveTick(when)) => assert_eq!(when, at(7, 30)),
        other => panic!("expected a tick, got {:?}", other),
    }

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_speaker_reports_speaking_then_idle() {
    use tokio_util::sync::CancellationToken;
    use voxcore::outputs::SpeakerWorker;

    let (speech_tx, speech_rx) = mpsc::channel(4);
    let (events_tx, mut events_rx) = mpsc::channel(4);
    let worker = SpeakerWorker::new(speech_rx, events_tx, None, CancellationToken::new());

    speech_tx.send("Hola.".to_string()).await.unwrap();
    drop(speech_tx);
    worker.run().await;

    assert!(matches!(events_rx.recv().await, Some(Event::Speaker(SpeakerStatus::Speaking))));
    assert!(matches!(events_rx.recv().await, Some(Event::Speaker(SpeakerStatus::Idle))));
}

#[tokio::test]
async fn test_speaker_never_waits_on_a_full_event_queue() {
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use voxcore::outputs::SpeakerWorker;

    let (speech_tx, speech_rx) = mpsc::channel(4);
    let (events_tx, mut events_rx) = mpsc::channel(1);
    // Nobody drains the main queue while the worker plays.
    events_tx.send(Event::Shutdown).await.unwrap();
    let worker = SpeakerWorker::new(speech_rx, events_tx, None, CancellationToken::new());

    speech_tx.send("Uno.".to_string()).await.unwrap();
    speech_tx.send("Dos.".to_string()).await.unwrap();
    drop(speech_tx);

    tokio::time::timeout(Duration::from_secs(2), worker.run())
        .await
        .expect("speaker blocked on the event queue");

    assert!(matches!(events_rx.recv().await, Some(Event::Shutdown)));
    assert!(events_rx.recv().await.is_none());
}
