//! Story prompt form.
//!
//! Plain input glue: collect a prompt and a page count, show progress while
//! the backend generates. No invariants live here beyond "one generation at
//! a time", which the app enforces.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
    Frame,
};

use crate::client::{MAX_PAGES, MIN_PAGES};

#[derive(Debug)]
pub struct PromptForm {
    input: String,
    max_pages: u32,
    generating: bool,
    show_welcome: bool,
}

impl PromptForm {
    pub fn new(max_pages: u32, show_welcome: bool) -> Self {
        Self {
            input: String::new(),
            max_pages: max_pages.clamp(MIN_PAGES, MAX_PAGES),
            generating: false,
            show_welcome,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn set_generating(&mut self, generating: bool) {
        self.generating = generating;
    }

    /// The welcome hint shows only until the first interaction.
    pub fn dismiss_welcome(&mut self) {
        self.show_welcome = false;
    }

    pub fn push_char(&mut self, c: char) {
        self.dismiss_welcome();
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn adjust_pages(&mut self, delta: i32) {
        let next = (self.max_pages as i32 + delta).clamp(MIN_PAGES as i32, MAX_PAGES as i32);
        self.max_pages = next as u32;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(area);

        let header = Paragraph::new(Span::styled(
            "✨ fablebook — tell me a story about…",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().padding(Padding::vertical(1)));
        frame.render_widget(header, chunks[0]);

        let input_display = if self.input.is_empty() && self.show_welcome {
            Span::styled(
                "a brave little fox who learns to share",
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw(format!("{}▌", self.input))
        };
        let input_box = Paragraph::new(input_display)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Your story idea "));
        frame.render_widget(input_box, chunks[1]);

        let pages_line = Line::from(vec![
            Span::raw("Pages: "),
            Span::styled(
                self.max_pages.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled("  (↑/↓ to change)", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(pages_line).alignment(Alignment::Center), chunks[2]);

        let status = if self.generating {
            Line::from(Span::styled(
                "Writing and illustrating your story… this can take a minute",
                Style::default().fg(Color::Yellow),
            ))
        } else {
            Line::from(Span::styled(
                "Enter to generate · Esc to quit",
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(Paragraph::new(status).alignment(Alignment::Center), chunks[3]);
    }
}
