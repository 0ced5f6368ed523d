//! Transient, self-dismissing notification banner.
//!
//! Used for generation failures: the message shows for a fixed time and then
//! disappears on its own. Showing a toast never touches the story or the
//! presentation cursor.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tokio::time::{Duration, Instant};

/// How long a toast stays on screen before auto-dismissing.
pub const TOAST_DURATION: Duration = Duration::from_secs(6);

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct ToastManager {
    current: Option<Toast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Show a message, replacing any toast already visible.
    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some(Toast {
            message: message.into(),
            expires_at: now + TOAST_DURATION,
        });
    }

    /// Dismiss the toast once its time is up.
    pub fn tick(&mut self, now: Instant) {
        if let Some(toast) = &self.current {
            if now >= toast.expires_at {
                self.current = None;
            }
        }
    }

    /// Explicit user dismissal.
    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.current.as_ref().map(|t| t.message.as_str())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(toast) = &self.current else {
            return;
        };
        let banner = Paragraph::new(toast.message.as_str())
            .style(
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Oops "));
        frame.render_widget(Clear, area);
        frame.render_widget(banner, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn toast_auto_dismisses_after_timeout() {
        let mut toasts = ToastManager::new();
        toasts.show("Story generation failed: backend unreachable", Instant::now());
        assert!(toasts.is_visible());

        advance(TOAST_DURATION - Duration::from_millis(1)).await;
        toasts.tick(Instant::now());
        assert!(toasts.is_visible());

        advance(Duration::from_millis(1)).await;
        toasts.tick(Instant::now());
        assert!(!toasts.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_toast_replaces_the_old_one() {
        let mut toasts = ToastManager::new();
        toasts.show("first", Instant::now());
        advance(Duration::from_secs(3)).await;
        toasts.show("second", Instant::now());

        // The replacement restarts the clock.
        advance(Duration::from_secs(4)).await;
        toasts.tick(Instant::now());
        assert_eq!(toasts.message(), Some("second"));
    }
}
