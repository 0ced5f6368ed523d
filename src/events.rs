use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ui::{Ui, UiMode};

/// Result of handling a key event, dispatched by the app loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    Continue,
    Quit,
    CancelGeneration,
    NextPage,
    PreviousPage,
    ToggleNarration,
    ToggleAutoAdvance,
    SwitchDisplayMode,
    BackToPrompt,
    SubmitPrompt { prompt: String, max_pages: u32 },
}

pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&mut self, key: KeyEvent, ui: &mut Ui) -> EventResult {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return EventResult::Quit;
        }
        match ui.mode() {
            UiMode::Prompt => self.handle_prompt_keys(key, ui),
            UiMode::Book | UiMode::Flipbook => self.handle_book_keys(key),
        }
    }

    fn handle_prompt_keys(&mut self, key: KeyEvent, ui: &mut Ui) -> EventResult {
        // While a generation is running, the form only accepts cancelling
        // it; quitting with a request outstanding takes a second Esc.
        if ui.prompt().is_generating() {
            return match key.code {
                KeyCode::Esc => EventResult::CancelGeneration,
                _ => EventResult::Continue,
            };
        }
        match key.code {
            KeyCode::Enter => EventResult::SubmitPrompt {
                prompt: ui.prompt().input().to_string(),
                max_pages: ui.prompt().max_pages(),
            },
            KeyCode::Up => {
                ui.prompt_mut().adjust_pages(1);
                EventResult::Continue
            }
            KeyCode::Down => {
                ui.prompt_mut().adjust_pages(-1);
                EventResult::Continue
            }
            KeyCode::Char(c) => {
                ui.prompt_mut().push_char(c);
                EventResult::Continue
            }
            KeyCode::Backspace => {
                ui.prompt_mut().backspace();
                EventResult::Continue
            }
            KeyCode::Esc => EventResult::Quit,
            _ => EventResult::Continue,
        }
    }

    fn handle_book_keys(&mut self, key: KeyEvent) -> EventResult {
        match key.code {
            KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('n') => EventResult::NextPage,
            KeyCode::Left | KeyCode::Char('p') => EventResult::PreviousPage,
            KeyCode::Char('r') => EventResult::ToggleNarration,
            KeyCode::Char('a') => EventResult::ToggleAutoAdvance,
            KeyCode::Char('m') => EventResult::SwitchDisplayMode,
            KeyCode::Esc => EventResult::BackToPrompt,
            KeyCode::Char('q') => EventResult::Quit,
            _ => EventResult::Continue,
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::PromptForm;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn book_ui() -> Ui {
        let mut ui = Ui::new(PromptForm::new(8, false));
        ui.set_mode(UiMode::Book);
        ui
    }

    #[test]
    fn book_mode_maps_navigation_keys() {
        let mut handler = EventHandler::new();
        let mut ui = book_ui();
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Right), &mut ui),
            EventResult::NextPage
        );
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Char(' ')), &mut ui),
            EventResult::NextPage
        );
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Left), &mut ui),
            EventResult::PreviousPage
        );
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Esc), &mut ui),
            EventResult::BackToPrompt
        );
    }

    #[test]
    fn prompt_mode_collects_text_and_submits() {
        let mut handler = EventHandler::new();
        let mut ui = Ui::new(PromptForm::new(8, true));
        for c in "a dragon".chars() {
            handler.handle_key_event(key(KeyCode::Char(c)), &mut ui);
        }
        match handler.handle_key_event(key(KeyCode::Enter), &mut ui) {
            EventResult::SubmitPrompt { prompt, max_pages } => {
                assert_eq!(prompt, "a dragon");
                assert_eq!(max_pages, 8);
            }
            other => panic!("expected SubmitPrompt, got {:?}", other),
        }
    }

    #[test]
    fn input_is_locked_while_generating() {
        let mut handler = EventHandler::new();
        let mut ui = Ui::new(PromptForm::new(8, false));
        ui.prompt_mut().set_generating(true);
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Enter), &mut ui),
            EventResult::Continue
        );
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Char('x')), &mut ui),
            EventResult::Continue
        );
        assert_eq!(ui.prompt().input(), "");
    }

    #[test]
    fn plus_and_minus_are_typed_not_stepped() {
        let mut handler = EventHandler::new();
        let mut ui = Ui::new(PromptForm::new(8, false));
        for c in "2 + 2 dragons".chars() {
            handler.handle_key_event(key(KeyCode::Char(c)), &mut ui);
        }
        assert_eq!(ui.prompt().input(), "2 + 2 dragons");
        assert_eq!(ui.prompt().max_pages(), 8);
    }

    #[test]
    fn arrow_keys_step_the_page_count() {
        let mut handler = EventHandler::new();
        let mut ui = Ui::new(PromptForm::new(8, false));
        handler.handle_key_event(key(KeyCode::Up), &mut ui);
        assert_eq!(ui.prompt().max_pages(), 9);
        handler.handle_key_event(key(KeyCode::Down), &mut ui);
        handler.handle_key_event(key(KeyCode::Down), &mut ui);
        assert_eq!(ui.prompt().max_pages(), 7);
    }

    #[test]
    fn esc_during_generation_cancels_instead_of_quitting() {
        let mut handler = EventHandler::new();
        let mut ui = Ui::new(PromptForm::new(8, false));
        ui.prompt_mut().set_generating(true);
        assert_eq!(
            handler.handle_key_event(key(KeyCode::Esc), &mut ui),
            EventResult::CancelGeneration
        );
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let mut handler = EventHandler::new();
        let mut ui = book_ui();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handler.handle_key_event(ctrl_c, &mut ui), EventResult::Quit);
    }
}
