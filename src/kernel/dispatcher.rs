use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::kernel::actions::{ActionContext, ActionOutcome, ActionRegistry};
use crate::kernel::dialogue::{DialogueOutcome, DialogueStateMachine};
use crate::kernel::event::UtteranceId;
use crate::kernel::intent::{Candidate, ConfidenceTier, IntentClassifierCascade};
use crate::kernel::router::KeywordRouter;
use crate::kernel::speech::SentenceSegmenter;
use crate::kernel::state::{PendingKind, PendingState};
use crate::kernel::synth::{CommandSynthesizer, Synthesis};
use crate::kernel::telemetry::event::ProactiveKind;
use crate::kernel::telemetry::{ResolutionPath, TelemetryEvent, TelemetryRecorder};
use crate::memory::Stores;
use crate::outputs::SpeechSink;
use crate::services::llm::{ChatModel, ChatSession};
use crate::services::shell::ShellExecutor;

pub const INTERNAL_ERROR: &str = "Ha ocurrido un error interno procesando tu comando.";
pub const RESULT_STREAM_ERROR: &str = "He hecho lo que pediste, pero me he liado al contártelo.";
pub const CHAT_STREAM_ERROR: &str = "Lo siento, me he liado.";
pub const TIMER_DONE: &str = "¡El tiempo del temporizador ha terminado!";

/// Fragments buffered between the model and the speaker.
pub const STREAM_CAPACITY: usize = 8;

/// External collaborators the dispatcher talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub chat: Arc<dyn ChatModel>,
    pub sink: Arc<dyn SpeechSink>,
    pub shell: Arc<dyn ShellExecutor>,
}

/// One decision per utterance: pending dialogue, keyword rule, alias,
/// intent cascade, command synthesizer, then open chat.
pub struct Dispatcher {
    dialogue: DialogueStateMachine,
    router: KeywordRouter,
    cascade: IntentClassifierCascade,
    synthesizer: Option<CommandSynthesizer>,
    registry: ActionRegistry,
    stores: Stores,
    session: ChatSession,
    collaborators: Collaborators,
    telemetry: TelemetryRecorder,
    rephrase_results: bool,
}

impl Dispatcher {
    pub fn new(
        config: &EngineConfig,
        cascade: IntentClassifierCascade,
        registry: ActionRegistry,
        stores: Stores,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            dialogue: DialogueStateMachine::new(config.pending_expiry()),
            router: KeywordRouter::with_system_rules(Arc::clone(&collaborators.shell)),
            cascade,
            synthesizer: None,
            registry,
            stores,
            session: ChatSession::default(),
            collaborators,
            telemetry: TelemetryRecorder::new(),
            rephrase_results: config.rephrase_results,
        }
    }

    pub fn with_router(mut self, router: KeywordRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: CommandSynthesizer) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn dialogue(&self) -> &DialogueStateMachine {
        &self.dialogue
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn stores_mut(&mut self) -> &mut Stores {
        &mut self.stores
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut TelemetryRecorder {
        &mut self.telemetry
    }

    /// Resolve one utterance. Never fails: internal faults become a
    /// spoken apology. Returns the path that answered, if any.
    pub async fn handle(&mut self, id: UtteranceId, text: &str, now: DateTime<Local>) -> Option<ResolutionPath> {
        let span = info_span!("utterance", id = %id);
        self.handle_in_span(text, now).instrument(span).await
    }

    async fn handle_in_span(&mut self, text: &str, now: DateTime<Local>) -> Option<ResolutionPath> {
        let started = Instant::now();
        match self.resolve(text, now).await {
            Ok(Some(path)) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                info!("Resolved via {:?} in {}ms", path, latency_ms);
                self.telemetry.record(TelemetryEvent::Resolved { path, latency_ms });
                Some(path)
            }
            Ok(None) => None,
            Err(e) => {
                error!("Internal fault while resolving utterance: {:#}", e);
                self.telemetry.record(TelemetryEvent::Apology);
                self.say_or_log(INTERNAL_ERROR.to_string()).await;
                None
            }
        }
    }

    async fn resolve(&mut self, text: &str, now: DateTime<Local>) -> anyhow::Result<Option<ResolutionPath>> {
        // 1. Pending dialogue
        let was_pending = self.dialogue.pending_kind();
        let outcome = self
            .dialogue
            .handle(text, now, &mut self.stores, self.collaborators.shell.as_ref())
            .await?;

        match outcome {
            DialogueOutcome::NotApplicable => {
                if let Some(kind) = was_pending {
                    self.telemetry.record(TelemetryEvent::PendingExpired { kind });
                }
            }
            DialogueOutcome::Handled(reply) => {
                self.note_resolved(was_pending);
                if let Some(kind) = self.dialogue.pending_kind() {
                    self.telemetry.record(TelemetryEvent::PendingOpened { kind });
                }
                if let Some(reply) = reply {
                    self.say(reply).await?;
                }
                return Ok(Some(ResolutionPath::Dialogue));
            }
            DialogueOutcome::Execute { candidate, original, reply } => {
                self.note_resolved(was_pending);
                self.say(reply).await?;
                self.execute(candidate, &original, now).await?;
                return Ok(Some(ResolutionPath::Intent));
            }
            DialogueOutcome::Reroute => {
                self.note_resolved(was_pending);
            }
        }

        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        // 2. Keyword rules
        if let Some(result) = self.router.process(text).await {
            info!("Keyword rule result: {}", result);
            self.present(text, result, RESULT_STREAM_ERROR).await?;
            return Ok(Some(ResolutionPath::Keyword));
        }

        // 3. Alias rewrite
        let command = match self.stores.aliases.lookup(text) {
            Some(alias) => {
                info!("Alias rewrite: '{}' -> '{}'", text, alias);
                alias
            }
            None => text.to_string(),
        };

        // 4. Intent cascade
        if let Some(candidate) = self.cascade.resolve(&command).await {
            if candidate.tier == ConfidenceTier::Low {
                let suggestion = candidate.intent.canonical_trigger().to_string();
                let pending = PendingState::SuggestionConfirm { original: command.clone(), candidate };
                self.open(pending, now);
                self.say(format!("No estoy seguro. ¿Te refieres a '{}'?", suggestion)).await?;
                return Ok(Some(ResolutionPath::Suggestion));
            }
            info!("Intent matched: '{}' ({}%)", candidate.intent.name, candidate.score);
            self.execute(candidate, &command, now).await?;
            return Ok(Some(ResolutionPath::Intent));
        }

        // 5. Command synthesis
        let synthesis = match &self.synthesizer {
            Some(synth) => match synth.infer(&command).await {
                Some((cmd, confidence)) => synth.decide(cmd, confidence),
                None => None,
            },
            None => None,
        };
        match synthesis {
            Some(Synthesis::AutoExecute(cmd)) => {
                self.say(format!("Ejecutando: {}", cmd)).await?;
                let result = match self.collaborators.shell.run_line(&cmd).await {
                    Ok(output) => output.summary(),
                    Err(e) => format!("Error: {}", e),
                };
                self.present(&command, result, RESULT_STREAM_ERROR).await?;
                return Ok(Some(ResolutionPath::CommandAuto));
            }
            Some(Synthesis::Confirm(cmd)) => {
                let prompt = format!("He generado el comando: {}. ¿Quieres que lo ejecute?", cmd);
                self.open(PendingState::CommandConfirm { command: cmd }, now);
                self.say(prompt).await?;
                return Ok(Some(ResolutionPath::CommandConfirm));
            }
            None => {}
        }

        // 6. Open chat
        self.converse(&command, None, CHAT_STREAM_ERROR).await?;
        Ok(Some(ResolutionPath::Chat))
    }

    async fn execute(&mut self, candidate: Candidate, command: &str, now: DateTime<Local>) -> anyhow::Result<()> {
        self.session.reset();

        let intent = candidate.intent;
        let handler = self.registry.get(&intent.action).ok_or_else(|| EngineError::UnknownAction {
            intent: intent.name.clone(),
            action: intent.action.clone(),
        })?;
        let response = intent.pick_response();

        let outcome = handler
            .invoke(ActionContext {
                command,
                parameters: &candidate.parameters,
                response: &response,
                now,
                stores: &mut self.stores,
            })
            .await?;

        match outcome {
            ActionOutcome::Done => {}
            ActionOutcome::Speak(text) => self.say(text).await?,
            ActionOutcome::Context(result) => {
                info!("Action result: {}", result);
                self.present(command, result, RESULT_STREAM_ERROR).await?;
            }
            ActionOutcome::Ask { prompt, pending } => {
                self.open(pending, now);
                self.say(prompt).await?;
            }
        }
        Ok(())
    }

    /// Speak an action result, re-phrased by the chat model when enabled.
    async fn present(&mut self, user_text: &str, result: String, apology: &str) -> anyhow::Result<()> {
        if self.rephrase_results {
            self.converse(user_text, Some(&result), apology).await
        } else {
            self.say(result).await
        }
    }

    /// Stream a chat reply into the sink sentence by sentence.
    async fn converse(&mut self, user_text: &str, context: Option<&str>, apology: &str) -> anyhow::Result<()> {
        let prompt = self.session.prompt(user_text, context);
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);

        let producer = self.collaborators.chat.stream(&prompt, tx);
        let consumer = speak_stream(rx, self.collaborators.sink.as_ref());
        let (produced, spoken) = tokio::join!(producer, consumer);

        let reply = spoken?;
        match produced {
            Ok(()) => {
                if !reply.trim().is_empty() {
                    self.session.record(user_text, reply.trim());
                }
            }
            Err(e) => {
                warn!("Chat stream failed: {:#}", e);
                self.say(apology.to_string()).await?;
            }
        }
        Ok(())
    }

    async fn say(&self, text: String) -> anyhow::Result<()> {
        self.collaborators.sink.speak(text).await
    }

    fn open(&mut self, pending: PendingState, now: DateTime<Local>) {
        let kind = pending.kind();
        match self.dialogue.enter(pending, now) {
            Ok(()) => {
                if let Some(kind) = kind {
                    self.telemetry.record(TelemetryEvent::PendingOpened { kind });
                }
            }
            Err(rejection) => warn!("Dialogue not opened: {:?}", rejection),
        }
    }

    fn note_resolved(&mut self, was_pending: Option<PendingKind>) {
        if let Some(kind) = was_pending {
            self.telemetry.record(TelemetryEvent::PendingResolved { kind });
        }
    }

    /// Time-based triggers: timer, alarms, pending expiry.
    pub async fn on_tick(&mut self, now: DateTime<Local>) {
        if self.stores.timer.take_expired(now) {
            info!("Timer finished");
            self.telemetry.record(TelemetryEvent::Proactive { kind: ProactiveKind::Timer });
            self.say_or_log(TIMER_DONE.to_string()).await;
        }

        match self.stores.alarms.take_due(now) {
            Ok(due) => {
                for alarm in due {
                    info!("Alarm '{}' ringing", alarm.label);
                    self.telemetry.record(TelemetryEvent::Proactive { kind: ProactiveKind::Alarm });
                    self.say_or_log(format!(
                        "Son las {}, recordatorio de alarma: {}",
                        alarm.time.format("%H:%M"),
                        alarm.label
                    ))
                    .await;
                }
            }
            Err(e) => error!("Failed to check alarms: {:#}", e),
        }

        if let Some(kind) = self.dialogue.expire(now) {
            self.telemetry.record(TelemetryEvent::PendingExpired { kind });
        }
    }

    async fn say_or_log(&self, text: String) {
        if let Err(e) = self.say(text).await {
            error!("Speech sink failed: {:#}", e);
        }
    }
}

/// Drain fragments through the segmenter into the sink. Returns the full reply.
async fn speak_stream(mut rx: mpsc::Receiver<String>, sink: &dyn SpeechSink) -> anyhow::Result<String> {
    let mut segmenter = SentenceSegmenter::new();
    let mut reply = String::new();

    while let Some(fragment) = rx.recv().await {
        reply.push_str(&fragment);
        for sentence in segmenter.push(&fragment) {
            debug!("Sentence ready: {}", sentence);
            sink.speak(sentence).await?;
        }
    }
    if let Some(rest) = segmenter.finish() {
        debug!("Trailing sentence: {}", rest);
        sink.speak(rest).await?;
    }
    Ok(reply)
}
