//! Flipbook renderer: the alternate, independently-paged presentation.
//!
//! The flipbook never shares the book renderer's cursor. It learns about a
//! new story through the one-shot [`StoryFeed`](crate::story::StoryFeed)
//! notification and rebuilds its own page set from the payload, so the two
//! presentations can never race on one cursor. Which one is on screen is a
//! display-mode flag owned by the app shell.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

use crate::book::cursor::{PageCursor, SettledTurn};
use crate::story::Story;

/// The flipbook's own turn duration; independent of the book renderer's.
pub const FLIP_DURATION: Duration = Duration::from_millis(800);

/// Discrete layout tiers derived from viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadTier {
    /// Narrow viewport: one page at a time.
    Single,
    /// Two-page spread with tight margins.
    CompactSpread,
    /// Two-page spread with full margins.
    WideSpread,
}

impl SpreadTier {
    /// Pure function of viewport width in terminal columns.
    pub fn for_width(columns: u16) -> Self {
        if columns < 90 {
            SpreadTier::Single
        } else if columns < 150 {
            SpreadTier::CompactSpread
        } else {
            SpreadTier::WideSpread
        }
    }

    pub fn pages_per_spread(&self) -> usize {
        match self {
            SpreadTier::Single => 1,
            SpreadTier::CompactSpread | SpreadTier::WideSpread => 2,
        }
    }
}

#[derive(Debug)]
pub struct FlipbookRenderer {
    story: Option<Arc<Story>>,
    cursor: PageCursor,
    tier: SpreadTier,
    feed_rx: broadcast::Receiver<Arc<Story>>,
}

impl FlipbookRenderer {
    pub fn new(feed_rx: broadcast::Receiver<Arc<Story>>) -> Self {
        Self {
            story: None,
            cursor: PageCursor::new(0),
            tier: SpreadTier::Single,
            feed_rx,
        }
    }

    /// Drain the story feed, keeping only the most recent announcement.
    ///
    /// Called from the app tick loop. Returns true when a new story was
    /// picked up and the page set was rebuilt.
    pub fn poll_feed(&mut self) -> bool {
        let mut latest = None;
        loop {
            match self.feed_rx.try_recv() {
                Ok(story) => latest = Some(story),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "flipbook feed lagged; catching up");
                }
                Err(_) => break,
            }
        }
        match latest {
            Some(story) => {
                self.load_story(story);
                true
            }
            None => false,
        }
    }

    fn load_story(&mut self, story: Arc<Story>) {
        // The flipbook's bound includes its end sheet: pages.len() is a
        // valid index, one past the last story page.
        self.cursor = PageCursor::with_duration(story.page_count(), FLIP_DURATION);
        self.story = Some(story);
    }

    pub fn story(&self) -> Option<&Arc<Story>> {
        self.story.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.cursor.current_index()
    }

    pub fn total_count(&self) -> usize {
        self.cursor.total_count()
    }

    pub fn is_transitioning(&self) -> bool {
        self.cursor.is_transitioning()
    }

    pub fn tier(&self) -> SpreadTier {
        self.tier
    }

    /// Recompute the layout tier for a new viewport width.
    pub fn resize(&mut self, columns: u16) {
        self.tier = SpreadTier::for_width(columns);
    }

    pub fn request_next(&mut self) -> bool {
        self.cursor.request_next().is_some()
    }

    pub fn request_previous(&mut self) -> bool {
        self.cursor.request_previous().is_some()
    }

    pub fn settle_due(&mut self, now: Instant) -> Option<SettledTurn> {
        self.cursor.settle_due(now)
    }

    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    /// Story page indices visible in the current spread.
    pub fn visible_pages(&self) -> Vec<usize> {
        let Some(story) = &self.story else {
            return Vec::new();
        };
        let first = self.cursor.current_index();
        (first..first + self.tier.pages_per_spread())
            .filter(|&i| i < story.page_count())
            .collect()
    }
}
