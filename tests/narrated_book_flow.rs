//! End-to-end flows coupling the book's page turns with narration, driven
//! the same way the app tick loop drives them, under paused tokio time.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::{advance, sleep, Duration, Instant};

use fablebook::book::{BookRenderer, PAGE_TURN_DURATION};
use fablebook::narration::{
    Completion, NarrationController, NarrationError, NarrationState, SpeechEngine, Utterance,
    Voice, AUTO_ADVANCE_DELAY,
};
use fablebook::settings::NarrationSettings;
use fablebook::story::{Story, StoryPage};

/// Speech engine that finishes an utterance after a fixed simulated time.
///
/// Channel ownership is tracked synchronously: `speak` claims it, `cancel`
/// releases it immediately. `overlap` flips if a speak ever starts while the
/// channel is still claimed, which would break the at-most-one-utterance
/// invariant.
struct TimedEngine {
    duration: Duration,
    cancel: Notify,
    current: Mutex<Option<u64>>,
    next_id: AtomicUsize,
    overlap: AtomicBool,
}

impl TimedEngine {
    fn new(duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            duration,
            cancel: Notify::new(),
            current: Mutex::new(None),
            next_id: AtomicUsize::new(0),
            overlap: AtomicBool::new(false),
        })
    }

    fn overlapped(&self) -> bool {
        self.overlap.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for TimedEngine {
    fn is_available(&self) -> bool {
        true
    }

    async fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    async fn speak(&self, _utterance: Utterance) -> Result<Completion, NarrationError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
        {
            let mut current = self.current.lock().unwrap();
            if current.is_some() {
                self.overlap.store(true, Ordering::SeqCst);
            }
            *current = Some(id);
        }
        tokio::select! {
            _ = sleep(self.duration) => {}
            _ = self.cancel.notified() => {}
        }
        let mut current = self.current.lock().unwrap();
        if *current == Some(id) {
            *current = None;
            Ok(Completion::Finished)
        } else {
            Ok(Completion::Cancelled)
        }
    }

    async fn cancel(&self) {
        self.current.lock().unwrap().take();
        self.cancel.notify_waiters();
    }
}

fn two_page_story() -> Arc<Story> {
    Arc::new(Story {
        title: "Pip the Penguin".to_string(),
        age_range: "4-8".to_string(),
        pages: vec![
            StoryPage {
                index: 0,
                text: "Pip the penguin loved to slide on the ice.".to_string(),
                image_url: "/data/illustrations/page_0.png".to_string(),
            },
            StoryPage {
                index: 1,
                text: "One day Pip found a friend to slide with.".to_string(),
                image_url: "/data/illustrations/page_1.png".to_string(),
            },
        ],
    })
}

/// What the app tick loop does for the book and narration, in one place.
async fn tick(book: &mut BookRenderer, narration: &mut NarrationController) {
    let now = Instant::now();
    if book.settle_due(now).is_some() {
        narrate_current(book, narration).await;
    }
    narration.poll_finished(now);
    if narration.auto_advance_due(now) {
        book.request_next();
    }
}

async fn narrate_current(book: &BookRenderer, narration: &mut NarrationController) {
    if !narration.is_enabled() {
        return;
    }
    match book.current_page_index() {
        Some(page) => {
            let text = book
                .story()
                .and_then(|s| s.page_text(page))
                .unwrap_or_default()
                .to_string();
            narration.speak_page(page, &text).await;
        }
        None => narration.stop().await,
    }
}

/// Advance simulated time in tick-sized steps, running the loop body each
/// step like the app's 50ms cadence.
async fn run_for(book: &mut BookRenderer, narration: &mut NarrationController, total: Duration) {
    let step = Duration::from_millis(50);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        advance(step).await;
        elapsed += step;
        tick(book, narration).await;
    }
}

async fn open_to_first_page(book: &mut BookRenderer, narration: &mut NarrationController) {
    assert!(book.request_next());
    run_for(book, narration, PAGE_TURN_DURATION).await;
    assert_eq!(book.current_page_index(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn auto_advance_turns_the_page_and_restarts_narration() {
    let speech_time = Duration::from_secs(3);
    let engine = TimedEngine::new(speech_time);
    let mut narration = NarrationController::new(engine.clone(), NarrationSettings::default());
    let mut book = BookRenderer::new();
    book.load_story(two_page_story());

    narration.toggle().await;
    narration.toggle_auto_advance();
    open_to_first_page(&mut book, &mut narration).await;
    narrate_current(&book, &mut narration).await;
    assert_eq!(narration.state(), NarrationState::Speaking { page_index: 0 });

    // Let the utterance complete naturally, then the advance delay elapse,
    // then the resulting page turn settle. Each window gets two extra ticks
    // because the utterance timer only starts on the tick after speak_page.
    let slack = Duration::from_millis(100);
    run_for(&mut book, &mut narration, speech_time + AUTO_ADVANCE_DELAY + slack).await;
    run_for(&mut book, &mut narration, PAGE_TURN_DURATION + slack).await;

    assert_eq!(book.current_page_index(), Some(1));
    assert_eq!(narration.state(), NarrationState::Speaking { page_index: 1 });
    // The speech channel never held two utterances at once.
    assert!(!engine.overlapped());
}

#[tokio::test(start_paused = true)]
async fn manual_turn_during_speech_suppresses_the_stale_advance() {
    // Short utterance: it completes naturally *during* the manual page
    // turn's animation window, the worst case for a stale auto-advance.
    let speech_time = Duration::from_millis(700);
    let engine = TimedEngine::new(speech_time);
    let mut narration = NarrationController::new(engine.clone(), NarrationSettings::default());
    let mut book = BookRenderer::new();
    book.load_story(two_page_story());

    narration.toggle().await;
    narration.toggle_auto_advance();
    open_to_first_page(&mut book, &mut narration).await;
    narrate_current(&book, &mut narration).await;

    // The user turns the page manually before speech completes. The
    // utterance finishes at 700ms, mid-transition; the settle at 600ms
    // into the turn restarts narration for page 1.
    run_for(&mut book, &mut narration, Duration::from_millis(500)).await;
    assert!(book.request_next());
    run_for(&mut book, &mut narration, PAGE_TURN_DURATION).await;
    assert_eq!(book.current_page_index(), Some(1));
    assert_eq!(narration.state(), NarrationState::Speaking { page_index: 1 });

    // The stale advance from the page-0 utterance would come due inside
    // this window; it must not produce a second turn. Only the page-1
    // utterance is still running here.
    run_for(&mut book, &mut narration, AUTO_ADVANCE_DELAY).await;
    assert_eq!(book.current_page_index(), Some(1));
    assert!(!book.is_transitioning());

    assert!(!engine.overlapped());
}

#[tokio::test(start_paused = true)]
async fn stopping_narration_never_blocks_navigation() {
    let engine = TimedEngine::new(Duration::from_secs(60));
    let mut narration = NarrationController::new(engine, NarrationSettings::default());
    let mut book = BookRenderer::new();
    book.load_story(two_page_story());

    narration.toggle().await;
    open_to_first_page(&mut book, &mut narration).await;
    narrate_current(&book, &mut narration).await;

    // Toggling narration off mid-utterance leaves the book fully navigable.
    narration.toggle().await;
    assert_eq!(narration.state(), NarrationState::Silent);

    assert!(book.request_next());
    run_for(&mut book, &mut narration, PAGE_TURN_DURATION).await;
    assert_eq!(book.current_page_index(), Some(1));
}
