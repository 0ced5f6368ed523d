//! Story data model
//!
//! A `Story` is the immutable result of one generation request: a title, an
//! age range, and an ordered list of pages. It is replaced wholesale when a
//! new story is generated; nothing in the viewer edits it incrementally.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// One page of a generated story.
///
/// The backend numbers pages starting at 1; [`Story::normalize`] rewrites
/// the indices to a dense zero-based sequence so renderers can use them as
/// positions directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoryPage {
    pub index: usize,
    pub text: String,
    pub image_url: String,
}

/// A complete generated story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Story {
    pub title: String,
    pub age_range: String,
    pub pages: Vec<StoryPage>,
}

impl Story {
    /// Rewrite page indices to a dense zero-based sequence.
    ///
    /// The generation backend is an LLM proxy and occasionally returns
    /// 1-based, duplicated, or gapped indices; position in the list is the
    /// authoritative order.
    pub fn normalize(mut self) -> Self {
        for (position, page) in self.pages.iter_mut().enumerate() {
            page.index = position;
        }
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of the page at `index`, if it exists.
    pub fn page_text(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(|p| p.text.as_str())
    }
}

/// Broadcast feed announcing each newly generated story.
///
/// Renderers that do not share the book's presentation cursor (the flipbook)
/// subscribe here and rebuild their own page set from the payload. One
/// notification is sent per generation; there is no continuous sync.
#[derive(Debug, Clone)]
pub struct StoryFeed {
    tx: broadcast::Sender<Arc<Story>>,
}

impl StoryFeed {
    pub fn new() -> Self {
        // Small buffer: consumers only care about the latest story.
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Story>> {
        self.tx.subscribe()
    }

    /// Announce a freshly generated story to all subscribers.
    pub fn announce(&self, story: Arc<Story>) {
        // Send fails only when no subscriber exists, which is fine: the
        // flipbook may not be instantiated in book display mode.
        let _ = self.tx.send(story);
    }
}

impl Default for StoryFeed {
    fn default() -> Self {
        Self::new()
    }
}
