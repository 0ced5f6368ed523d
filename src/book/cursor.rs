//! Page-turn presentation cursor
//!
//! The cursor is the single authority for "which page is showing" in one
//! renderer instance. It serializes page-turn animations: a turn is accepted
//! only while idle, runs for a fixed duration, and commits exactly once.
//! Input arriving mid-turn is dropped, never queued, so at most one turn is
//! ever in flight.

use tokio::time::{Duration, Instant};

/// How long one page-turn animation runs before its commit applies.
pub const PAGE_TURN_DURATION: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Forward,
    Backward,
}

/// An accepted, not-yet-committed page turn.
///
/// `seq` ties the eventual settle back to the request that armed it; a
/// `reset()` in between bumps the cursor's sequence so the stale settle
/// becomes a no-op instead of mutating a fresh cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTurn {
    pub from_index: usize,
    pub direction: TurnDirection,
    pub seq: u64,
    pub deadline: Instant,
}

/// The turn that just committed, handed to the renderer for post-settle
/// side effects (visibility refresh, indicator text, narration restart).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledTurn {
    pub from_index: usize,
    pub to_index: usize,
    pub direction: TurnDirection,
}

/// Presentation cursor: current index, page-count bound, and the at-most-one
/// in-flight transition.
///
/// Invariants:
/// - `0 <= current_index <= total_count` at all times.
/// - `current_index` changes only inside [`PageCursor::settle`], and only for
///   the pending turn that is actually armed.
#[derive(Debug)]
pub struct PageCursor {
    current_index: usize,
    total_count: usize,
    turn_duration: Duration,
    pending: Option<PendingTurn>,
    seq: u64,
}

impl PageCursor {
    pub fn new(total_count: usize) -> Self {
        Self::with_duration(total_count, PAGE_TURN_DURATION)
    }

    /// A cursor whose turns animate for a renderer-specific duration.
    pub fn with_duration(total_count: usize, turn_duration: Duration) -> Self {
        Self {
            current_index: 0,
            total_count,
            turn_duration,
            pending: None,
            seq: 0,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<PendingTurn> {
        self.pending
    }

    /// Request a forward turn.
    ///
    /// Accepted only while idle and not already on the last index; boundary
    /// overruns and requests issued mid-turn are silent no-ops so rapid
    /// clicking past the edge never errors or desyncs.
    pub fn request_next(&mut self) -> Option<PendingTurn> {
        if self.pending.is_some() || self.current_index >= self.total_count {
            return None;
        }
        self.arm(TurnDirection::Forward)
    }

    /// Request a backward turn. Same acceptance rules as [`request_next`],
    /// mirrored at the lower bound.
    ///
    /// [`request_next`]: PageCursor::request_next
    pub fn request_previous(&mut self) -> Option<PendingTurn> {
        if self.pending.is_some() || self.current_index == 0 {
            return None;
        }
        self.arm(TurnDirection::Backward)
    }

    fn arm(&mut self, direction: TurnDirection) -> Option<PendingTurn> {
        self.seq += 1;
        let turn = PendingTurn {
            from_index: self.current_index,
            direction,
            seq: self.seq,
            deadline: Instant::now() + self.turn_duration,
        };
        self.pending = Some(turn);
        Some(turn)
    }

    /// Commit the pending turn identified by `seq`.
    ///
    /// Returns the settled transition, or `None` when `seq` is stale (a
    /// `reset()` happened after the turn was armed). A commit fires exactly
    /// once per accepted request; the caller drives timing.
    pub fn settle(&mut self, seq: u64) -> Option<SettledTurn> {
        let pending = self.pending?;
        if pending.seq != seq {
            return None;
        }
        self.pending = None;
        let to_index = match pending.direction {
            TurnDirection::Forward => self.current_index + 1,
            TurnDirection::Backward => self.current_index - 1,
        };
        let settled = SettledTurn {
            from_index: self.current_index,
            to_index,
            direction: pending.direction,
        };
        self.current_index = to_index;
        Some(settled)
    }

    /// Commit the pending turn if its deadline has passed.
    pub fn settle_due(&mut self, now: Instant) -> Option<SettledTurn> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.settle(pending.seq)
    }

    /// Force the cursor back to the initial state.
    ///
    /// Valid in any state. The sequence bump invalidates any settle still
    /// scheduled for a turn that was in flight.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.pending = None;
        self.seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_at_zero() {
        let cursor = PageCursor::new(3);
        assert_eq!(cursor.current_index(), 0);
        assert!(!cursor.is_transitioning());
    }

    #[test]
    fn next_arms_then_settles_one_step() {
        let mut cursor = PageCursor::new(3);
        let turn = cursor.request_next().expect("turn accepted");
        assert!(cursor.is_transitioning());
        assert_eq!(turn.from_index, 0);
        assert_eq!(turn.direction, TurnDirection::Forward);

        let settled = cursor.settle(turn.seq).expect("commit");
        assert_eq!(settled.to_index, 1);
        assert_eq!(cursor.current_index(), 1);
        assert!(!cursor.is_transitioning());
    }

    #[test]
    fn requests_during_transition_are_dropped() {
        let mut cursor = PageCursor::new(3);
        let turn = cursor.request_next().expect("turn accepted");

        // Both directions are rejected mid-turn, state untouched.
        assert!(cursor.request_next().is_none());
        assert!(cursor.request_previous().is_none());
        assert_eq!(cursor.current_index(), 0);
        assert!(cursor.is_transitioning());

        cursor.settle(turn.seq);
        assert_eq!(cursor.current_index(), 1);
    }

    #[test]
    fn next_at_upper_bound_is_noop() {
        let mut cursor = PageCursor::new(2);
        for _ in 0..2 {
            let turn = cursor.request_next().expect("turn accepted");
            cursor.settle(turn.seq);
        }
        assert_eq!(cursor.current_index(), 2);

        assert!(cursor.request_next().is_none());
        assert_eq!(cursor.current_index(), 2);
        assert!(!cursor.is_transitioning());
    }

    #[test]
    fn previous_at_zero_is_noop() {
        let mut cursor = PageCursor::new(2);
        assert!(cursor.request_previous().is_none());
        assert_eq!(cursor.current_index(), 0);
        assert!(!cursor.is_transitioning());
    }

    #[test]
    fn three_page_walk_then_boundary_noop() {
        // Scenario: a 3-page story walked to the end; a fourth request
        // changes nothing.
        let mut cursor = PageCursor::new(3);
        for expected in 1..=3 {
            let turn = cursor.request_next().expect("turn accepted");
            cursor.settle(turn.seq);
            assert_eq!(cursor.current_index(), expected);
        }
        assert!(cursor.request_next().is_none());
        assert_eq!(cursor.current_index(), 3);
    }

    #[test]
    fn round_trip_returns_to_start_index() {
        let mut cursor = PageCursor::new(3);
        let t1 = cursor.request_next().expect("accepted");
        cursor.settle(t1.seq);
        let t2 = cursor.request_next().expect("accepted");
        cursor.settle(t2.seq);
        assert_eq!(cursor.current_index(), 2);

        let back = cursor.request_previous().expect("accepted");
        cursor.settle(back.seq);
        let forward = cursor.request_next().expect("accepted");
        cursor.settle(forward.seq);
        assert_eq!(cursor.current_index(), 2);
    }

    #[test]
    fn concurrent_request_advances_by_one_not_two() {
        let mut cursor = PageCursor::new(3);
        let first = cursor.request_next().expect("accepted");
        // Second request before the first commit fires: dropped.
        assert!(cursor.request_next().is_none());

        cursor.settle(first.seq);
        assert_eq!(cursor.current_index(), 1);
        assert!(!cursor.is_transitioning());
    }

    #[test]
    fn stale_settle_after_reset_is_noop() {
        let mut cursor = PageCursor::new(3);
        let turn = cursor.request_next().expect("accepted");
        cursor.reset();

        // The commit for the pre-reset turn must not move the fresh cursor.
        assert!(cursor.settle(turn.seq).is_none());
        assert_eq!(cursor.current_index(), 0);
        assert!(!cursor.is_transitioning());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut cursor = PageCursor::new(3);
        let turn = cursor.request_next().expect("accepted");
        cursor.settle(turn.seq);

        cursor.reset();
        let after_one = (cursor.current_index(), cursor.is_transitioning());
        cursor.reset();
        let after_two = (cursor.current_index(), cursor.is_transitioning());
        assert_eq!(after_one, (0, false));
        assert_eq!(after_one, after_two);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_due_respects_the_animation_deadline() {
        let mut cursor = PageCursor::new(3);
        cursor.request_next().expect("accepted");

        // Before the duration elapses the commit must not apply.
        assert!(cursor.settle_due(Instant::now()).is_none());
        assert_eq!(cursor.current_index(), 0);

        tokio::time::advance(PAGE_TURN_DURATION).await;
        let settled = cursor.settle_due(Instant::now()).expect("commit due");
        assert_eq!(settled.to_index, 1);
        assert_eq!(cursor.current_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_due_fires_exactly_once() {
        let mut cursor = PageCursor::new(3);
        cursor.request_next().expect("accepted");
        tokio::time::advance(PAGE_TURN_DURATION).await;

        assert!(cursor.settle_due(Instant::now()).is_some());
        assert!(cursor.settle_due(Instant::now()).is_none());
        assert_eq!(cursor.current_index(), 1);
    }
}
