//! Narration controller.
//!
//! Drives text-to-speech for the page the book is currently showing. The
//! controller owns the speech channel exclusively and mirrors the page-turn
//! invariant: at most one utterance is ever active, and a new one always
//! starts through a full stop-then-start sequence. Auto-advance issues one
//! forward turn after a natural completion; a sequence number makes any
//! stale advance a no-op once speech is stopped, restarted, or the user
//! navigates manually.

pub mod engine;
pub mod voice;

pub use engine::{CommandEngine, Completion, NarrationError, SpeechEngine, Utterance};
pub use voice::{Voice, VoicePolicy};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use crate::settings::NarrationSettings;

/// Delay between a natural utterance completion and the auto-advance turn.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationState {
    Silent,
    Speaking { page_index: usize },
}

/// Natural completion of the utterance identified by `seq`.
#[derive(Debug, Clone, Copy)]
pub struct UtteranceDone {
    pub seq: u64,
    pub page_index: usize,
}

pub struct NarrationController {
    engine: Arc<dyn SpeechEngine>,
    settings: NarrationSettings,
    voice: Option<String>,
    enabled: bool,
    auto_advance: bool,
    state: NarrationState,
    /// Current utterance sequence, shared with spawned speak tasks so a
    /// task superseded before it first runs can tell and bow out.
    seq: Arc<AtomicU64>,
    done_tx: mpsc::UnboundedSender<UtteranceDone>,
    done_rx: mpsc::UnboundedReceiver<UtteranceDone>,
    pending_advance: Option<Instant>,
}

impl NarrationController {
    pub fn new(engine: Arc<dyn SpeechEngine>, settings: NarrationSettings) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            settings,
            voice: None,
            enabled: false,
            auto_advance: false,
            state: NarrationState::Silent,
            seq: Arc::new(AtomicU64::new(0)),
            done_tx,
            done_rx,
            pending_advance: None,
        }
    }

    pub fn state(&self) -> NarrationState {
        self.state
    }

    /// Whether the user has narration switched on. Distinct from
    /// [`state`](Self::state): narration stays enabled between pages even
    /// while no utterance is playing.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    pub fn set_voice(&mut self, voice: Option<String>) {
        self.voice = voice;
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    /// Flip the user narration toggle. Toggling off stops speech
    /// immediately; toggling on leaves it to the caller to speak the
    /// current page.
    pub async fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.stop().await;
        }
        self.enabled
    }

    pub fn toggle_auto_advance(&mut self) -> bool {
        self.auto_advance = !self.auto_advance;
        if !self.auto_advance {
            self.pending_advance = None;
        }
        self.auto_advance
    }

    /// Speak one page, cancelling whatever was playing first.
    ///
    /// Missing speech capability or an empty page text is a silent no-op;
    /// navigation never blocks on narration.
    pub async fn speak_page(&mut self, page_index: usize, text: &str) {
        self.invalidate().await;

        if !self.engine.is_available() || text.trim().is_empty() {
            return;
        }

        let seq = self.seq.load(Ordering::SeqCst);
        let utterance = Utterance {
            text: text.to_string(),
            voice: self.voice.clone(),
            pitch: self.settings.pitch,
            rate: self.settings.rate,
        };
        self.state = NarrationState::Speaking { page_index };

        let engine = self.engine.clone();
        let done_tx = self.done_tx.clone();
        let live_seq = self.seq.clone();
        tokio::spawn(async move {
            // Superseded before this task first ran: the cancel had nothing
            // to cancel yet, so the check here is what keeps a stale
            // utterance from ever starting.
            if live_seq.load(Ordering::SeqCst) != seq {
                return;
            }
            match engine.speak(utterance).await {
                Ok(Completion::Finished) => {
                    let _ = done_tx.send(UtteranceDone { seq, page_index });
                }
                Ok(Completion::Cancelled) => {}
                Err(e) => tracing::warn!("narration failed: {}", e),
            }
        });
    }

    /// Stop speech and drop any pending auto-advance.
    pub async fn stop(&mut self) {
        self.invalidate().await;
    }

    /// Cancel the current utterance and invalidate every deferred callback
    /// tied to it. The sequence bump is what keeps a stale completion or
    /// auto-advance from acting after the fact.
    async fn invalidate(&mut self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
        self.pending_advance = None;
        self.engine.cancel().await;
        self.state = NarrationState::Silent;
    }

    /// Drain utterance completions, keeping only one for the current
    /// sequence. Arms the auto-advance delay when enabled.
    pub fn poll_finished(&mut self, now: Instant) -> Option<UtteranceDone> {
        let mut result = None;
        let current_seq = self.seq.load(Ordering::SeqCst);
        while let Ok(done) = self.done_rx.try_recv() {
            if done.seq == current_seq {
                self.state = NarrationState::Silent;
                if self.auto_advance {
                    self.pending_advance = Some(now + AUTO_ADVANCE_DELAY);
                }
                result = Some(done);
            }
            // Stale completions (superseded or stopped utterances) are
            // dropped without effect.
        }
        result
    }

    /// True exactly once when an armed auto-advance comes due. The caller
    /// issues the forward turn; the settle side effect restarts narration.
    pub fn auto_advance_due(&mut self, now: Instant) -> bool {
        match self.pending_advance {
            Some(deadline) if now >= deadline => {
                self.pending_advance = None;
                true
            }
            _ => false,
        }
    }
}
