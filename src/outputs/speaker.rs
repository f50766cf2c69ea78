use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::kernel::event::{Event, SpeakerStatus};

/// Plays sentences one at a time and reports `Speaking`/`Idle` on the
/// main queue. `Idle` is sent once the backlog is empty.
pub struct SpeakerWorker {
    rx: mpsc::Receiver<String>,
    events: mpsc::Sender<Event>,
    tts_command: Option<String>,
    cancel: CancellationToken,
}

impl SpeakerWorker {
    pub fn new(
        rx: mpsc::Receiver<String>,
        events: mpsc::Sender<Event>,
        tts_command: Option<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self { rx, events, tts_command, cancel }
    }

    pub async fn run(mut self) {
        let mut speaking = false;
        loop {
            let sentence = tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = self.rx.recv() => match next {
                    Some(sentence) => sentence,
                    None => break,
                },
            };

            if !speaking {
                speaking = true;
                self.report(SpeakerStatus::Speaking);
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.play(&sentence) => {}
            }

            if self.rx.is_empty() {
                speaking = false;
                self.report(SpeakerStatus::Idle);
            }
        }
        info!("Speaker worker stopped");
    }

    /// Never waits on the main queue: the reactor may itself be waiting
    /// for room in the speech queue.
    fn report(&self, status: SpeakerStatus) {
        match self.events.try_send(Event::Speaker(status)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Event queue full, speaker status {:?} dropped", status),
            Err(TrySendError::Closed(_)) => {}
        }
    }

    async fn play(&self, sentence: &str) {
        let Some(program) = &self.tts_command else {
            println!("[NEO] {}", sentence);
            return;
        };

        let mut parts = program.split_whitespace();
        let Some(bin) = parts.next() else {
            println!("[NEO] {}", sentence);
            return;
        };

        match Command::new(bin).args(parts).arg(sentence).kill_on_drop(true).status().await {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("TTS exited with {}", status),
            Err(e) => {
                warn!("Failed to spawn '{}': {}", bin, e);
                println!("[NEO] {}", sentence);
            }
        }
    }
}
