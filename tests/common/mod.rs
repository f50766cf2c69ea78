#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use voxcore::config::{EngineConfig, Thresholds, Whitelist};
use voxcore::kernel::actions::ActionRegistry;
use voxcore::kernel::intent::{Classification, Intent, IntentCatalog, IntentClassifier, IntentClassifierCascade};
use voxcore::kernel::synth::{CommandModel, CommandSynthesizer, Translation};
use voxcore::memory::Stores;
use voxcore::outputs::RecordingSink;
use voxcore::services::llm::ChatModel;
use voxcore::services::shell::{CommandOutput, ShellExecutor};
use voxcore::{skills, Collaborators, Dispatcher};

/// Monday 19 October 2026, 10:00 local.
pub fn monday_morning() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
}

pub fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 19, hour, minute, 0).unwrap()
}

pub fn intent(name: &str, triggers: &[&str], response: &str, action: &str) -> Intent {
    Intent {
        name: name.to_string(),
        triggers: triggers.iter().map(|t| t.to_string()).collect(),
        responses: vec![response.to_string()],
        action: action.to_string(),
        parameters: BTreeMap::new(),
    }
}

pub fn catalog() -> IntentCatalog {
    IntentCatalog::new(vec![
        intent("saludo", &["hola"], "¡Hola!", "responder_simple"),
        intent("musica", &["pon música relajante"], "Poniendo música.", "responder_simple"),
        intent("temporizador_dialogo", &["pon un temporizador"], "¿De cuántos minutos?", "iniciar_dialogo_temporizador"),
        intent("temporizador_directo", &["pon un temporizador de"], "Hecho.", "crear_temporizador_directo"),
        intent("recordatorio", &["recuérdame"], "Vale.", "crear_recordatorio_voz"),
        intent("recordatorios_hoy", &["qué tengo hoy"], "Mirando.", "consultar_recordatorios_dia"),
        intent("alarma", &["pon una alarma"], "Vale.", "crear_alarma_voz"),
        intent("consultar_dato", &["qué sabes de"], "Veamos.", "consultar_dato"),
    ])
    .unwrap()
}

/// Records every command line instead of running it.
#[derive(Clone)]
pub struct FakeShell {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub output: CommandOutput,
    pub fail: bool,
}

impl FakeShell {
    pub fn ok(stdout: &str) -> Self {
        Self {
            calls: Arc::default(),
            output: CommandOutput { success: true, stdout: stdout.to_string(), stderr: String::new() },
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::ok("") }
    }

    pub fn denied(stderr: &str) -> Self {
        Self {
            calls: Arc::default(),
            output: CommandOutput { success: false, stdout: String::new(), stderr: stderr.to_string() },
            fail: false,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShellExecutor for FakeShell {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(format!("{} {}", program, args.join(" ")));
        if self.fail {
            return Err(anyhow!("command not found"));
        }
        Ok(self.output.clone())
    }
}

/// Streams a fixed list of fragments, optionally failing after `fail_after`.
#[derive(Clone, Default)]
pub struct ScriptedChat {
    pub fragments: Vec<String>,
    pub fail_after: Option<usize>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedChat {
    pub fn replying(fragments: &[&str]) -> Self {
        Self { fragments: fragments.iter().map(|f| f.to_string()).collect(), ..Self::default() }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn stream(&self, prompt: &str, tx: mpsc::Sender<String>) -> Result<()> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        for (i, fragment) in self.fragments.iter().enumerate() {
            if self.fail_after == Some(i) {
                return Err(anyhow!("connection reset"));
            }
            if tx.send(fragment.clone()).await.is_err() {
                return Ok(());
            }
        }
        if self.fail_after == Some(self.fragments.len()) {
            return Err(anyhow!("connection reset"));
        }
        Ok(())
    }
}

/// Classifier with a canned answer that counts its calls.
#[derive(Clone, Default)]
pub struct FixedClassifier {
    pub answer: Option<Classification>,
    pub calls: Arc<AtomicUsize>,
}

impl FixedClassifier {
    pub fn says(name: &str, confidence: f32) -> Self {
        Self {
            answer: Some(Classification { name: name.to_string(), confidence, slots: BTreeMap::new() }),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<Option<Classification>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

/// Command model with a canned translation.
#[derive(Clone, Default)]
pub struct FixedCommandModel {
    pub answer: Option<Translation>,
    pub calls: Arc<AtomicUsize>,
}

impl FixedCommandModel {
    pub fn says(command: &str, score: f32) -> Self {
        Self {
            answer: Some(Translation { command: command.to_string(), score }),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandModel for FixedCommandModel {
    async fn translate(&self, _text: &str) -> Result<Option<Translation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

pub struct Harness {
    pub dispatcher: Dispatcher,
    pub sink: RecordingSink,
    pub shell: FakeShell,
    pub chat: ScriptedChat,
}

pub struct HarnessBuilder {
    pub chat: ScriptedChat,
    pub shell: FakeShell,
    pub classifier: Option<FixedClassifier>,
    pub command_model: Option<FixedCommandModel>,
    pub rephrase: bool,
    pub registry: ActionRegistry,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        let mut registry = ActionRegistry::new();
        skills::register_builtin(&mut registry);
        Self {
            chat: ScriptedChat::default(),
            shell: FakeShell::ok(""),
            classifier: None,
            command_model: None,
            rephrase: false,
            registry,
        }
    }

    pub fn chat(mut self, chat: ScriptedChat) -> Self {
        self.chat = chat;
        self
    }

    pub fn shell(mut self, shell: FakeShell) -> Self {
        self.shell = shell;
        self
    }

    pub fn classifier(mut self, classifier: FixedClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn command_model(mut self, model: FixedCommandModel) -> Self {
        self.command_model = Some(model);
        self
    }

    pub fn rephrase(mut self, rephrase: bool) -> Self {
        self.rephrase = rephrase;
        self
    }

    pub fn build_with(self, catalog: IntentCatalog) -> Harness {
        let config = EngineConfig { rephrase_results: self.rephrase, ..EngineConfig::default() };
        let sink = RecordingSink::new();

        let mut cascade = IntentClassifierCascade::new(catalog, Thresholds::default());
        if let Some(classifier) = self.classifier {
            cascade = cascade.with_classifier(Box::new(classifier));
        }

        let collaborators = Collaborators {
            chat: Arc::new(self.chat.clone()),
            sink: Arc::new(sink.clone()),
            shell: Arc::new(self.shell.clone()),
        };
        let mut dispatcher = Dispatcher::new(&config, cascade, self.registry, Stores::in_memory(), collaborators);
        if let Some(model) = self.command_model {
            dispatcher = dispatcher.with_synthesizer(CommandSynthesizer::new(
                Box::new(model),
                Whitelist::default(),
                Thresholds::default().synth_auto_exec,
            ));
        }

        Harness { dispatcher, sink, shell: self.shell, chat: self.chat }
    }

    pub fn build(self) -> Harness {
        self.build_with(catalog())
    }
}
