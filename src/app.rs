use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};

use crate::book::{BookRenderer, FlipbookRenderer};
use crate::cli::Cli;
use crate::client::{GenerateError, GenerationClient};
use crate::events::{EventHandler, EventResult};
use crate::narration::{CommandEngine, NarrationController, SpeechEngine, Voice, VoicePolicy};
use crate::settings::Settings;
use crate::story::{Story, StoryFeed};
use crate::ui::{PromptForm, Ui, UiMode};

/// Listing voices shells out to the TTS command; a wedged binary must not
/// stall startup.
const VOICE_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

async fn probe_voices(engine: &dyn SpeechEngine) -> Vec<Voice> {
    match tokio::time::timeout(VOICE_PROBE_TIMEOUT, engine.voices()).await {
        Ok(voices) => voices,
        Err(_) => {
            tracing::warn!("voice listing timed out; starting without a voice");
            Vec::new()
        }
    }
}

/// Application shell: owns the story, both renderers, narration, and the
/// tick loop that drives every deferred commit.
pub struct App {
    should_quit: bool,
    ui: Ui,
    event_handler: EventHandler,
    settings: Settings,
    client: GenerationClient,
    story_feed: StoryFeed,
    book: BookRenderer,
    flipbook: FlipbookRenderer,
    engine: Arc<dyn SpeechEngine>,
    narration: NarrationController,
    /// In-flight generation request, at most one at a time.
    generation_rx: Option<oneshot::Receiver<Result<Story, GenerateError>>>,
    /// Which presentation a freshly generated story opens in.
    default_display: UiMode,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        let settings = Settings::load().unwrap_or_else(|e| {
            tracing::warn!("could not load settings, using defaults: {}", e);
            Settings::default()
        });
        let client = GenerationClient::new(cli.backend_url.clone())?;

        let story_feed = StoryFeed::new();
        let flipbook = FlipbookRenderer::new(story_feed.subscribe());

        let engine: Arc<dyn SpeechEngine> = Arc::new(CommandEngine::discover());
        let narration = NarrationController::new(engine.clone(), settings.narration);

        let ui = Ui::new(PromptForm::new(8, settings.first_visit));

        Ok(Self {
            should_quit: false,
            ui,
            event_handler: EventHandler::new(),
            settings,
            client,
            story_feed,
            book: BookRenderer::new(),
            flipbook,
            engine,
            narration,
            generation_rx: None,
            default_display: if cli.flip {
                UiMode::Flipbook
            } else {
                UiMode::Book
            },
        })
    }

    /// Resolve the narration voice and persist the first-visit flag.
    pub async fn initialize(&mut self) -> Result<()> {
        let voices = probe_voices(self.engine.as_ref()).await;
        let policy = VoicePolicy::english_default(self.settings.preferred_voice.clone());
        let voice = policy.select(&voices).map(|v| v.id.clone());
        tracing::debug!(?voice, available = voices.len(), "narration voice selected");
        self.narration.set_voice(voice);

        if self.settings.first_visit {
            self.settings.first_visit = false;
            if let Err(e) = self.settings.save() {
                tracing::warn!("could not persist settings: {}", e);
            }
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        if !io::stdout().is_tty() {
            return Err(anyhow::anyhow!(
                "fablebook requires a terminal (TTY) to run"
            ));
        }

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.run_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let tick_rate = Duration::from_millis(50);

        loop {
            self.tick(Instant::now()).await;

            terminal.draw(|f| {
                self.ui
                    .render(f, &self.book, &self.flipbook, &self.narration)
            })?;

            if self.should_quit {
                break;
            }

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => {
                        let result = self.event_handler.handle_key_event(key, &mut self.ui);
                        self.dispatch(result).await?;
                    }
                    Event::Resize(columns, _rows) => {
                        self.flipbook.resize(columns);
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// One pass of deferred work: toast expiry, generation results, turn
    /// commits, narration completions, and the auto-advance timer.
    async fn tick(&mut self, now: Instant) {
        self.ui.tick(now);
        self.poll_generation(now);

        // Commit page turns whose animation window has elapsed. The book's
        // settle carries the narration side effect; the flipbook's cursor is
        // independent and has none.
        if self.book.settle_due(now).is_some() {
            self.narrate_current_page().await;
        }
        self.flipbook.poll_feed();
        self.flipbook.settle_due(now);

        self.narration.poll_finished(now);
        if self.narration.auto_advance_due(now) {
            // Exactly one forward turn per natural completion; if the book
            // is mid-turn or at the end this is dropped, not queued.
            if self.ui.mode() == UiMode::Book {
                self.book.request_next();
            }
        }
    }

    fn poll_generation(&mut self, now: Instant) {
        let Some(rx) = self.generation_rx.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.generation_rx = None;
                self.ui.prompt_mut().set_generating(false);
                match result {
                    Ok(story) => self.present_story(Arc::new(story)),
                    Err(e) => {
                        // The prior story, if any, stays loaded and untouched.
                        self.ui.show_toast(e.to_string(), now);
                    }
                }
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.generation_rx = None;
                self.ui.prompt_mut().set_generating(false);
                self.ui.show_toast("Story generation was interrupted", now);
            }
        }
    }

    /// Hand a newly generated story to both renderers and open the book.
    fn present_story(&mut self, story: Arc<Story>) {
        self.book.load_story(story.clone());
        self.story_feed.announce(story);
        self.ui.set_mode(self.default_display);
    }

    async fn dispatch(&mut self, result: EventResult) -> Result<()> {
        // Any keypress dismisses a visible toast.
        self.ui.toasts_mut().dismiss();

        match result {
            EventResult::Continue => {}
            EventResult::Quit => self.should_quit = true,
            EventResult::CancelGeneration => {
                // Dropping the receiver abandons the request; the spawned
                // task's send fails harmlessly if the backend answers later.
                self.generation_rx = None;
                self.ui.prompt_mut().set_generating(false);
                self.ui.show_toast("Story generation cancelled", Instant::now());
            }
            EventResult::NextPage => match self.ui.mode() {
                UiMode::Flipbook => {
                    self.flipbook.request_next();
                }
                _ => {
                    self.book.request_next();
                }
            },
            EventResult::PreviousPage => match self.ui.mode() {
                UiMode::Flipbook => {
                    self.flipbook.request_previous();
                }
                _ => {
                    self.book.request_previous();
                }
            },
            EventResult::ToggleNarration => {
                if self.narration.toggle().await {
                    self.narrate_current_page().await;
                }
            }
            EventResult::ToggleAutoAdvance => {
                self.narration.toggle_auto_advance();
            }
            EventResult::SwitchDisplayMode => {
                self.ui.switch_display_mode();
            }
            EventResult::BackToPrompt => {
                // Returning to the form discards presentation state: speech
                // stops and both cursors reset. The story itself stays
                // loaded until a new one replaces it.
                self.narration.stop().await;
                self.book.reset();
                self.flipbook.reset();
                self.ui.set_mode(UiMode::Prompt);
            }
            EventResult::SubmitPrompt { prompt, max_pages } => {
                self.start_generation(prompt, max_pages);
            }
        }
        Ok(())
    }

    fn start_generation(&mut self, prompt: String, max_pages: u32) {
        if self.generation_rx.is_some() {
            return;
        }
        self.ui.prompt_mut().set_generating(true);

        let (tx, rx) = oneshot::channel();
        self.generation_rx = Some(rx);
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client.generate(&prompt, max_pages).await;
            let _ = tx.send(result);
        });
    }

    /// Speak the story page under the book cursor, or fall silent on the
    /// cover and end sheets.
    async fn narrate_current_page(&mut self) {
        if !self.narration.is_enabled() {
            return;
        }
        match self.book.current_page_index() {
            Some(page) => {
                let text = self
                    .book
                    .story()
                    .and_then(|s| s.page_text(page))
                    .unwrap_or_default()
                    .to_string();
                self.narration.speak_page(page, &text).await;
            }
            None => self.narration.stop().await,
        }
    }
}
