//! Speech engine abstraction.
//!
//! The narration controller owns the single logical speech channel; engines
//! only know how to speak one utterance and how to cancel it. The default
//! engine shells out to whichever system TTS command is installed
//! (`espeak-ng`, `espeak`, or macOS `say`) and reports unavailability when
//! none is, so narration degrades to a silent no-op.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

use crate::narration::voice::Voice;

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("speech command failed: {0}")]
    Io(#[from] std::io::Error),
}

/// How an utterance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The utterance played to its natural end.
    Finished,
    /// The utterance was cut short by a cancel.
    Cancelled,
}

/// One request to the speech channel.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<String>,
    /// Normalized pitch, 0.5..=2.0 with 1.0 neutral.
    pub pitch: f32,
    /// Normalized rate, 0.5..=2.0 with 1.0 neutral.
    pub rate: f32,
}

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Whether this engine can produce audio at all.
    fn is_available(&self) -> bool;

    /// Voices the engine can speak with. Best effort; may be empty.
    async fn voices(&self) -> Vec<Voice>;

    /// Speak one utterance to completion or cancellation.
    ///
    /// Implementations must support at most one utterance at a time; the
    /// controller always cancels before starting a new one.
    async fn speak(&self, utterance: Utterance) -> Result<Completion, NarrationError>;

    /// Stop the in-flight utterance, if any. Idempotent.
    async fn cancel(&self);
}

/// TTS via an external command.
pub struct CommandEngine {
    program: Option<PathBuf>,
    next_id: AtomicU64,
    current: Arc<Mutex<Option<RunningUtterance>>>,
}

/// The child currently holding the speech channel, tagged so each `speak`
/// only ever reaps its own process.
struct RunningUtterance {
    id: u64,
    child: Child,
}

const CANDIDATE_PROGRAMS: &[&str] = &["espeak-ng", "espeak", "say"];

impl CommandEngine {
    /// Probe the PATH for a known TTS command.
    pub fn discover() -> Self {
        let program = std::env::var_os("PATH").and_then(|path| {
            std::env::split_paths(&path)
                .flat_map(|dir| CANDIDATE_PROGRAMS.iter().map(move |p| dir.join(p)))
                .find(|candidate| candidate.is_file())
        });
        match &program {
            Some(p) => tracing::info!(program = %p.display(), "speech engine found"),
            None => tracing::info!("no speech command on PATH; narration disabled"),
        }
        Self::with_program(program)
    }

    fn with_program(program: Option<PathBuf>) -> Self {
        Self {
            program,
            next_id: AtomicU64::new(0),
            current: Arc::new(Mutex::new(None)),
        }
    }

    fn is_say(&self) -> bool {
        self.program
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|name| name == "say")
            .unwrap_or(false)
    }

    fn build_command(&self, program: &PathBuf, utterance: &Utterance) -> Command {
        let mut cmd = Command::new(program);
        if self.is_say() {
            // say: rate in words per minute, no pitch flag.
            cmd.arg("-r")
                .arg(format!("{:.0}", 180.0 * utterance.rate));
            if let Some(voice) = &utterance.voice {
                cmd.arg("-v").arg(voice);
            }
        } else {
            // espeak family: pitch 0-99 around a 50 baseline, speed in wpm.
            cmd.arg("-p")
                .arg(format!("{:.0}", (50.0 * utterance.pitch).clamp(0.0, 99.0)))
                .arg("-s")
                .arg(format!("{:.0}", 175.0 * utterance.rate));
            if let Some(voice) = &utterance.voice {
                cmd.arg("-v").arg(voice);
            }
        }
        cmd.arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl SpeechEngine for CommandEngine {
    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    async fn voices(&self) -> Vec<Voice> {
        let Some(program) = &self.program else {
            return Vec::new();
        };
        if self.is_say() {
            // `say -v ?` lists "Name    lang    # comment" lines.
            let output = Command::new(program).args(["-v", "?"]).output().await;
            let Ok(output) = output else {
                return Vec::new();
            };
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .filter_map(|line| {
                    let mut fields = line.split_whitespace();
                    let id = fields.next()?.to_string();
                    let language = fields.next()?.to_string();
                    Some(Voice { id, language })
                })
                .collect()
        } else {
            // `espeak --voices` lists "Pty Language Age/Gender VoiceName ..."
            // with a header row.
            let output = Command::new(program).arg("--voices").output().await;
            let Ok(output) = output else {
                return Vec::new();
            };
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .skip(1)
                .filter_map(|line| {
                    let mut fields = line.split_whitespace();
                    let _priority = fields.next()?;
                    let language = fields.next()?.to_string();
                    let _age_gender = fields.next()?;
                    let id = fields.next()?.to_string();
                    Some(Voice { id, language })
                })
                .collect()
        }
    }

    async fn speak(&self, utterance: Utterance) -> Result<Completion, NarrationError> {
        let Some(program) = self.program.clone() else {
            return Ok(Completion::Cancelled);
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let child = self.build_command(&program, &utterance).spawn()?;
        {
            let mut current = self.current.lock().await;
            // An earlier utterance still in the slot raced past its cancel
            // before storing its child; kill it before taking the channel.
            if let Some(mut stale) = current.take() {
                let _ = stale.child.kill().await;
            }
            *current = Some(RunningUtterance { id, child });
        }

        // Poll for exit rather than holding the lock across the wait, so a
        // concurrent cancel() can reach the child. The id check keeps this
        // speak from reaping a child it does not own.
        loop {
            {
                let mut current = self.current.lock().await;
                match current.as_mut() {
                    Some(running) if running.id == id => {
                        if let Some(status) = running.child.try_wait()? {
                            *current = None;
                            return Ok(if status.success() {
                                Completion::Finished
                            } else {
                                Completion::Cancelled
                            });
                        }
                    }
                    // Cancelled or displaced out from under us.
                    _ => return Ok(Completion::Cancelled),
                }
            }
            sleep(Duration::from_millis(50)).await;
        }
    }

    async fn cancel(&self) {
        let mut current = self.current.lock().await;
        if let Some(mut running) = current.take() {
            if let Err(e) = running.child.kill().await {
                tracing::debug!("failed to kill speech process: {}", e);
            }
        }
    }
}
