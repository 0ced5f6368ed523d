//! Ratatui view for the flipbook renderer.
//!
//! Draws one page or a two-page spread depending on the flipbook's layout
//! tier, which is itself a pure function of viewport width.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
    Frame,
};

use crate::book::{FlipbookRenderer, SpreadTier};

pub fn render(frame: &mut Frame, area: Rect, flipbook: &FlipbookRenderer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    let title = flipbook
        .story()
        .map(|s| format!("{} (flipbook)", s.title))
        .unwrap_or_else(|| "fablebook (flipbook)".to_string());
    frame.render_widget(
        Paragraph::new(Span::styled(title, Style::default().add_modifier(Modifier::BOLD)))
            .alignment(Alignment::Center),
        chunks[0],
    );

    render_spread(frame, chunks[1], flipbook);
    render_footer(frame, chunks[2], flipbook);
}

fn render_spread(frame: &mut Frame, area: Rect, flipbook: &FlipbookRenderer) {
    let visible = flipbook.visible_pages();
    if visible.is_empty() {
        render_page(frame, area, flipbook, None);
        return;
    }
    match flipbook.tier() {
        SpreadTier::Single => render_page(frame, area, flipbook, visible.first().copied()),
        SpreadTier::CompactSpread | SpreadTier::WideSpread => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);
            render_page(frame, halves[0], flipbook, visible.first().copied());
            render_page(frame, halves[1], flipbook, visible.get(1).copied());
        }
    }
}

fn render_page(frame: &mut Frame, area: Rect, flipbook: &FlipbookRenderer, page: Option<usize>) {
    let border_style = if flipbook.is_transitioning() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .padding(Padding::uniform(1));

    let body = match page.and_then(|p| flipbook.story().and_then(|s| s.pages.get(p)).cloned()) {
        Some(page) => vec![
            Line::from(Span::styled(
                format!("🖼  {}", page.image_url),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(page.text),
        ],
        None if flipbook.story().is_some() => vec![
            Line::from(""),
            Line::from(Span::styled(
                "The End",
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        ],
        None => vec![Line::from("No story loaded").alignment(Alignment::Center)],
    };

    frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: true }).block(block), area);
}

fn render_footer(frame: &mut Frame, area: Rect, flipbook: &FlipbookRenderer) {
    let indicator = match flipbook.story() {
        Some(story) => {
            let current = flipbook.current_index();
            if current < story.page_count() {
                format!("Page {} of {}", current + 1, story.page_count())
            } else {
                "The End".to_string()
            }
        }
        None => String::new(),
    };
    let line = Line::from(vec![
        Span::styled(indicator, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled(
            "←/→ flip · m book mode · Esc back",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}
