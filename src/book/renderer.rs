//! Book renderer: the manually-animated presentation of a story.
//!
//! The renderer materializes a story into a stack of sheets (a synthesized
//! cover, one sheet per story page, and a synthesized end sheet) and keeps
//! that stack consistent with its own [`PageCursor`]. All per-sheet flags
//! are recomputed idempotently from the cursor on every settle, so a missed
//! visual update can never wedge navigation: the logical index stays
//! authoritative and the view catches up on the next refresh.

use std::sync::Arc;
use tokio::time::Instant;

use crate::book::cursor::{PageCursor, SettledTurn, TurnDirection};
use crate::story::Story;

/// Cap on the cosmetic stack skew so deep books do not lean off-screen.
const STACK_SKEW_CAP: usize = 8;
/// Skew applied per flipped sheet, in cells of horizontal offset.
const STACK_SKEW_PER_SHEET: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Cover,
    /// A story page, carrying its zero-based index into `Story::pages`.
    StoryPage(usize),
    End,
}

/// One sheet of the rendered book.
///
/// `turning`/`returning` are the transient animation markers applied while a
/// turn is in flight; `flipped` marks sheets already turned past. `hidden`
/// and `focusable` are the accessibility flags: the sheet at the cursor is
/// focusable and visible, flipped-past sheets are hidden, everything else is
/// visible but not focusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sheet {
    pub kind: SheetKind,
    pub sheet_index: usize,
    pub turning: bool,
    pub returning: bool,
    pub flipped: bool,
    pub hidden: bool,
    pub focusable: bool,
}

impl Sheet {
    fn new(kind: SheetKind, sheet_index: usize) -> Self {
        Self {
            kind,
            sheet_index,
            turning: false,
            returning: false,
            flipped: false,
            hidden: false,
            focusable: false,
        }
    }
}

/// The book presentation: sheet stack plus the cursor that owns page state.
///
/// The cursor counts turnable sheets (cover + story pages), so
/// `current_index == total_count` means everything has been turned and the
/// end sheet is showing.
#[derive(Debug)]
pub struct BookRenderer {
    story: Option<Arc<Story>>,
    sheets: Vec<Sheet>,
    cursor: PageCursor,
    indicator: String,
    stack_skew: f32,
}

impl BookRenderer {
    pub fn new() -> Self {
        let mut renderer = Self {
            story: None,
            sheets: Vec::new(),
            cursor: PageCursor::new(0),
            indicator: String::new(),
            stack_skew: 0.0,
        };
        renderer.refresh();
        renderer
    }

    /// Replace the displayed story, discarding the previous sheet stack.
    ///
    /// The cursor resets in lockstep so the new book opens on its cover.
    pub fn load_story(&mut self, story: Arc<Story>) {
        let page_count = story.page_count();
        self.sheets = Vec::with_capacity(page_count + 2);
        self.sheets.push(Sheet::new(SheetKind::Cover, 0));
        for i in 0..page_count {
            self.sheets.push(Sheet::new(SheetKind::StoryPage(i), i + 1));
        }
        self.sheets
            .push(Sheet::new(SheetKind::End, page_count + 1));

        // Turnable sheets: cover plus each story page.
        self.cursor = PageCursor::new(page_count + 1);
        self.story = Some(story);
        self.refresh();
    }

    /// Drop the story and return to the empty initial state, for when the
    /// user navigates back to the prompt form.
    pub fn clear(&mut self) {
        self.story = None;
        self.sheets.clear();
        self.cursor = PageCursor::new(0);
        self.refresh();
    }

    pub fn story(&self) -> Option<&Arc<Story>> {
        self.story.as_ref()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
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

    /// "Cover" / "Page X of Y" / "The End", kept current on every settle.
    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    /// Cosmetic lean of the flipped stack; derived, never state-bearing.
    pub fn stack_skew(&self) -> f32 {
        self.stack_skew
    }

    /// The story page currently showing, when the cursor is on one.
    pub fn current_page_index(&self) -> Option<usize> {
        let i = self.cursor.current_index();
        match self.sheets.get(i)?.kind {
            SheetKind::StoryPage(page) => Some(page),
            _ => None,
        }
    }

    /// Ask for a forward turn; applies the "turning" marker synchronously
    /// when accepted. Returns whether the request was accepted.
    pub fn request_next(&mut self) -> bool {
        let Some(turn) = self.cursor.request_next() else {
            return false;
        };
        // The marker goes on the sheet being turned away. A missing sheet is
        // non-fatal: the logical index still advances on settle and the view
        // resyncs on the next refresh.
        match self.sheets.get_mut(turn.from_index) {
            Some(sheet) => sheet.turning = true,
            None => tracing::warn!(
                sheet = turn.from_index,
                "no sheet to mark as turning; advancing index anyway"
            ),
        }
        true
    }

    /// Ask for a backward turn; applies the "returning" marker to the sheet
    /// coming back. Returns whether the request was accepted.
    pub fn request_previous(&mut self) -> bool {
        let Some(turn) = self.cursor.request_previous() else {
            return false;
        };
        match self.sheets.get_mut(turn.from_index - 1) {
            Some(sheet) => sheet.returning = true,
            None => tracing::warn!(
                sheet = turn.from_index - 1,
                "no sheet to mark as returning; decrementing index anyway"
            ),
        }
        true
    }

    /// Commit a pending turn whose animation deadline has passed.
    ///
    /// Called from the app tick loop. Returns the settled transition so the
    /// caller can run the remaining side effects (narration restart).
    pub fn settle_due(&mut self, now: Instant) -> Option<SettledTurn> {
        let settled = self.cursor.settle_due(now)?;
        self.refresh();
        Some(settled)
    }

    /// Force the book back to its cover and clear every visual marker.
    pub fn reset(&mut self) {
        self.cursor.reset();
        self.refresh();
    }

    /// Recompute all derived sheet state from the cursor.
    ///
    /// Idempotent: flags depend only on `current_index`, never on their
    /// previous values, so a dropped update cannot accumulate drift.
    fn refresh(&mut self) {
        let current = self.cursor.current_index();
        for sheet in &mut self.sheets {
            sheet.turning = false;
            sheet.returning = false;
            sheet.flipped = sheet.sheet_index < current;
            sheet.hidden = sheet.sheet_index < current;
            sheet.focusable = sheet.sheet_index == current;
        }
        self.indicator = self.indicator_text();
        self.stack_skew = current.min(STACK_SKEW_CAP) as f32 * STACK_SKEW_PER_SHEET;
    }

    fn indicator_text(&self) -> String {
        let Some(story) = &self.story else {
            return String::new();
        };
        let current = self.cursor.current_index();
        let pages = story.page_count();
        if current == 0 {
            "Cover".to_string()
        } else if current <= pages {
            format!("Page {} of {}", current, pages)
        } else {
            "The End".to_string()
        }
    }
}

impl Default for BookRenderer {
    fn default() -> Self {
        Self::new()
    }
}
