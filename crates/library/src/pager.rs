//! Page-turn state machine.

use derive_more::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    #[display("forward")]
    Forward,
    #[display("backward")]
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Idle,
    Transitioning(Direction),
}

/// Which navigation controls may be used right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub previous: bool,
    pub next: bool,
}

/// Tracks the current page of a book and the page turn in progress.
///
/// A turn is started with [`begin`](Self::begin) and finished with
/// [`complete`](Self::complete); the index only moves on completion. While a
/// turn is in progress every other request is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    index: usize,
    len: usize,
    state: PagerState,
}
impl Pager {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len, state: PagerState::Idle }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    /// Starts a turn. Returns the index the turn will land on, or `None`
    /// (leaving the pager untouched) when a turn is already in progress or
    /// there is no page in that direction.
    pub fn begin(&mut self, direction: Direction) -> Option<usize> {
        if self.state != PagerState::Idle {
            return None;
        }
        let target = self.target(direction)?;
        self.state = PagerState::Transitioning(direction);
        Some(target)
    }

    /// Finishes the turn in progress, moving exactly one page. Returns the
    /// new index, or `None` when no turn was in progress.
    pub fn complete(&mut self) -> Option<usize> {
        let PagerState::Transitioning(direction) = self.state else {
            return None;
        };
        // Bounds were checked by `begin`.
        self.index = self.target(direction)?;
        self.state = PagerState::Idle;
        Some(self.index)
    }

    pub fn controls(&self) -> Controls {
        if self.state != PagerState::Idle {
            return Controls::default();
        }
        Controls {
            previous: self.target(Direction::Backward).is_some(),
            next: self.target(Direction::Forward).is_some(),
        }
    }

    /// Moves straight to `index`. Refused during a turn or out of bounds.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if self.state != PagerState::Idle || index >= self.len {
            return false;
        }
        self.index = index;
        true
    }

    fn target(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Forward => Some(self.index + 1).filter(|next| *next < self.len),
            Direction::Backward => self.index.checked_sub(1),
        }
    }
}
