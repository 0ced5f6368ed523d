//! Ratatui view for the animated book renderer.
//!
//! Pure presentation: everything drawn here is derived from the
//! [`BookRenderer`] state, so a skipped frame can never desync the book.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
    Frame,
};

use crate::book::{BookRenderer, SheetKind};
use crate::narration::{NarrationController, NarrationState};

pub fn render(
    frame: &mut Frame,
    area: Rect,
    book: &BookRenderer,
    narration: &NarrationController,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    render_title_bar(frame, chunks[0], book, narration);
    render_sheet(frame, chunks[1], book);
    render_indicator(frame, chunks[2], book);
}

fn render_title_bar(
    frame: &mut Frame,
    area: Rect,
    book: &BookRenderer,
    narration: &NarrationController,
) {
    let title = book
        .story()
        .map(|s| s.title.clone())
        .unwrap_or_else(|| "fablebook".to_string());
    let narration_badge = match narration.state() {
        NarrationState::Speaking { .. } => " 🔊",
        NarrationState::Silent if narration.is_enabled() => " 🔈",
        NarrationState::Silent => "",
    };
    let bar = Paragraph::new(Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(narration_badge),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(bar, area);
}

fn render_sheet(frame: &mut Frame, area: Rect, book: &BookRenderer) {
    // The cosmetic stack skew leans the sheet right as pages pile up on
    // the left; recomputed from the index, so always in step.
    let skew = (book.stack_skew() as u16).min(area.width / 4);
    let sheet_area = Rect {
        x: area.x + skew,
        width: area.width.saturating_sub(skew),
        ..area
    };

    let current = book.current_index();
    let sheet = book.sheets().get(current);

    let turning = book.is_transitioning();
    let border_style = if turning {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Magenta)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .padding(Padding::uniform(1));

    let body = match sheet.map(|s| s.kind) {
        Some(SheetKind::Cover) => cover_lines(book),
        Some(SheetKind::StoryPage(page_index)) => page_lines(book, page_index),
        Some(SheetKind::End) => vec![
            Line::from(""),
            Line::from(Span::styled(
                "The End",
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            Line::from(""),
            Line::from("Press Esc for a new story").alignment(Alignment::Center),
        ],
        None => vec![Line::from("No story loaded").alignment(Alignment::Center)],
    };

    let paragraph = Paragraph::new(body).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(paragraph, sheet_area);
}

fn cover_lines(book: &BookRenderer) -> Vec<Line<'static>> {
    let Some(story) = book.story() else {
        return vec![Line::from("")];
    };
    vec![
        Line::from(""),
        Line::from(Span::styled(
            story.title.clone(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(""),
        Line::from(format!("For ages {}", story.age_range)).alignment(Alignment::Center),
        Line::from(""),
        Line::from("→ to open the book").alignment(Alignment::Center),
    ]
}

fn page_lines(book: &BookRenderer, page_index: usize) -> Vec<Line<'static>> {
    let Some(story) = book.story() else {
        return vec![Line::from("")];
    };
    let Some(page) = story.pages.get(page_index) else {
        // Sheet and story disagree; show nothing rather than panic. The
        // next full rebuild resynchronizes.
        return vec![Line::from("")];
    };
    vec![
        Line::from(Span::styled(
            format!("🖼  {}", page.image_url),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(page.text.clone()),
    ]
}

fn render_indicator(frame: &mut Frame, area: Rect, book: &BookRenderer) {
    let hint = if book.is_transitioning() {
        "turning…"
    } else {
        "←/→ turn · r narration · a auto-advance · m flip mode · Esc back"
    };
    let line = Line::from(vec![
        Span::styled(
            book.indicator().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}
