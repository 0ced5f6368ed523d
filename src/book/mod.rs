//! Book presentation: the page-turn cursor and the two renderers built on it.

pub mod cursor;
pub mod flipbook;
pub mod renderer;

pub use cursor::{PageCursor, PendingTurn, SettledTurn, TurnDirection, PAGE_TURN_DURATION};
pub use flipbook::{FlipbookRenderer, SpreadTier, FLIP_DURATION};
pub use renderer::{BookRenderer, Sheet, SheetKind};
