use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use voxcore::config::EngineConfig;
use voxcore::error::EngineError;
use voxcore::kernel::actions::ActionRegistry;
use voxcore::kernel::event::{Event, InputEvent};
use voxcore::kernel::intent::{IntentCatalog, IntentClassifierCascade};
use voxcore::kernel::presence::Presence;
use voxcore::kernel::scheduler::ProactiveLoop;
use voxcore::kernel::synth::CommandSynthesizer;
use voxcore::kernel::time::{Clock, SystemClock};
use voxcore::memory::Stores;
use voxcore::outputs::{ChannelSink, SpeakerWorker};
use voxcore::services::llm::LlmService;
use voxcore::services::nl2bash::HttpCommandModel;
use voxcore::services::nlu::HttpIntentClassifier;
use voxcore::services::shell::SystemShell;
use voxcore::{skills, Collaborators, Dispatcher, Reactor};

/// Sentences queued for the speaker before `speak` waits.
const SPEECH_QUEUE: usize = 16;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("Voxcore booting...");

    let config = match EngineConfig::locate() {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            EngineConfig::from_file(&path)?
        }
        None => EngineConfig::default(),
    };

    // Intents and actions must agree before anything listens.
    let catalog = IntentCatalog::from_file(&config.intents_path)?;
    let mut registry = ActionRegistry::new();
    skills::register_builtin(&mut registry);
    registry.validate(&catalog)?;
    tracing::info!("{} intents loaded", catalog.intents().len());

    let stores = Stores::open(&config.data_dir)?;

    // Kernel Channel
    let (tx, rx) = mpsc::channel::<Event>(100);
    let (speech_tx, speech_rx) = mpsc::channel::<String>(SPEECH_QUEUE);
    let cancel = CancellationToken::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let collaborators = Collaborators {
        chat: Arc::new(LlmService::new(&config.llm_url)),
        sink: Arc::new(ChannelSink::new(speech_tx)),
        shell: Arc::new(SystemShell::default()),
    };

    let mut cascade = IntentClassifierCascade::new(catalog, config.thresholds.clone());
    if let Some(url) = &config.nlu_url {
        cascade = cascade.with_classifier(Box::new(HttpIntentClassifier::new(url)));
    }

    let mut dispatcher = Dispatcher::new(&config, cascade, registry, stores, collaborators);
    if let Some(url) = &config.nl2bash_url {
        dispatcher = dispatcher.with_synthesizer(CommandSynthesizer::new(
            Box::new(HttpCommandModel::new(url)),
            config.synth_whitelist.clone(),
            config.thresholds.synth_auto_exec,
        ));
    }

    let presence = Presence::new(&config.wake_word, config.listening_window());
    let mut reactor = Reactor::new(rx, presence, dispatcher, Arc::clone(&clock));

    let speaker = SpeakerWorker::new(speech_rx, tx.clone(), config.tts_command.clone(), cancel.clone());
    let speaker_task = tokio::spawn(speaker.run());

    let proactive = ProactiveLoop::new(
        tx.clone(),
        Arc::clone(&clock),
        Duration::from_millis(config.proactive_interval_ms),
        cancel.clone(),
    );
    let proactive_task = tokio::spawn(proactive.run());

    tokio::spawn(read_stdin(tx.clone()));

    let shutdown_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(Event::Shutdown).await;
        }
    });
    drop(tx);

    tracing::info!("Voxcore active. Say '{}' followed by a command. Ctrl+C to stop.", config.wake_word);
    let summary = reactor.run().await;
    println!("Session summary: {:?}", summary);

    cancel.cancel();
    let _ = speaker_task.await;
    let _ = proactive_task.await;
    Ok(())
}

/// Typed input stands in for the transcriber: one line, one utterance.
async fn read_stdin(tx: mpsc::Sender<Event>) -> Result<(), EngineError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        tx.send(Event::Input(InputEvent::text("stdin", &line)))
            .await
            .map_err(|e| EngineError::Channel(e.to_string()))?;
    }
    tx.send(Event::Shutdown)
        .await
        .map_err(|e| EngineError::Channel(e.to_string()))
}
