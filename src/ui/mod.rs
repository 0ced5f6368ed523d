pub mod book_view;
pub mod flipbook_view;
pub mod prompt_form;
pub mod toast;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};
use tokio::time::Instant;

use crate::book::{BookRenderer, FlipbookRenderer};
use crate::narration::NarrationController;

pub use prompt_form::PromptForm;
pub use toast::{ToastManager, TOAST_DURATION};

/// Which screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// The story prompt form.
    Prompt,
    /// The manually-animated book presentation.
    Book,
    /// The alternate flipbook presentation.
    Flipbook,
}

/// Top-level UI state: active screen, the prompt form, and transient toasts.
///
/// The renderers themselves are owned by the app; the UI only reads them
/// when drawing.
pub struct Ui {
    mode: UiMode,
    prompt: PromptForm,
    toasts: ToastManager,
}

impl Ui {
    pub fn new(prompt: PromptForm) -> Self {
        Self {
            mode: UiMode::Prompt,
            prompt,
            toasts: ToastManager::new(),
        }
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: UiMode) {
        self.mode = mode;
    }

    /// Swap between the two book presentations. A no-op on the prompt form.
    pub fn switch_display_mode(&mut self) {
        self.mode = match self.mode {
            UiMode::Book => UiMode::Flipbook,
            UiMode::Flipbook => UiMode::Book,
            UiMode::Prompt => UiMode::Prompt,
        };
    }

    pub fn prompt(&self) -> &PromptForm {
        &self.prompt
    }

    pub fn prompt_mut(&mut self) -> &mut PromptForm {
        &mut self.prompt
    }

    pub fn toasts(&self) -> &ToastManager {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastManager {
        &mut self.toasts
    }

    pub fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toasts.show(message, now);
    }

    pub fn tick(&mut self, now: Instant) {
        self.toasts.tick(now);
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        book: &BookRenderer,
        flipbook: &FlipbookRenderer,
        narration: &NarrationController,
    ) {
        let area = frame.size();
        match self.mode {
            UiMode::Prompt => self.prompt.render(frame, area),
            UiMode::Book => book_view::render(frame, area, book, narration),
            UiMode::Flipbook => flipbook_view::render(frame, area, flipbook),
        }

        if self.toasts.is_visible() {
            self.toasts.render(frame, toast_area(area));
        }
    }
}

/// Toasts overlay the top-right corner.
fn toast_area(area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(46)])
        .split(vertical[0]);
    horizontal[1]
}
