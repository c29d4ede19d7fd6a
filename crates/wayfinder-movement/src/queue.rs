//! Bounded FIFO of predicted moves.
//!
//! Each [`PendingMove`] stores the direction that was sent and the
//! coordinate it is expected to lead to. The front entry is the move in
//! flight; later entries are chained predictions from it. Moves the retry
//! timer already emulated stay queued, marked, until the server answers.

use std::collections::VecDeque;

use thiserror::Error;
use wayfinder_coords::{Coordinate, ExitDir};

/// Default bound on queued moves.
pub const DEFAULT_MAX_PENDING_MOVES: usize = 16;

/// A move that was sent (or emulated) but not yet confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub direction: ExitDir,
    /// `None` when the starting position was unknown.
    pub predicted: Option<Coordinate>,
    /// Already shown to the user from the map while the server was silent.
    pub emulated: bool,
}

impl PendingMove {
    pub fn new(direction: ExitDir, predicted: Option<Coordinate>) -> Self {
        Self {
            direction,
            predicted,
            emulated: false,
        }
    }
}

/// Rejected moves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("too many queued moves (max {max})")]
    QueueFull { max: usize },

    #[error("alas, you cannot go {0} from here")]
    CannotGo(ExitDir),
}

/// Bounded queue of [`PendingMove`]s. Pushing onto a full queue is an
/// error, never an eviction.
#[derive(Debug, Clone)]
pub struct MoveQueue {
    entries: VecDeque<PendingMove>,
    max_size: usize,
}

impl MoveQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn push(&mut self, mv: PendingMove) -> Result<(), MoveError> {
        if self.is_full() {
            return Err(MoveError::QueueFull { max: self.max_size });
        }
        self.entries.push_back(mv);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<PendingMove> {
        self.entries.pop_front()
    }

    pub fn pop_back(&mut self) -> Option<PendingMove> {
        self.entries.pop_back()
    }

    pub fn get(&self, index: usize) -> Option<&PendingMove> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut PendingMove> {
        self.entries.get_mut(index)
    }

    /// Number of leading entries that were emulated. Emulation runs in
    /// queue order, so emulated entries always form a prefix.
    pub fn emulated_len(&self) -> usize {
        self.entries.iter().take_while(|m| m.emulated).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingMove> {
        self.entries.iter()
    }

    /// Where a new move would start: the last queued prediction, or
    /// `confirmed` when nothing is queued.
    pub fn tail(&self, confirmed: Option<Coordinate>) -> Option<Coordinate> {
        match self.entries.back() {
            Some(last) => last.predicted,
            None => confirmed,
        }
    }

    /// Recomputes every prediction as a chain starting at `start`.
    pub fn rechain(&mut self, start: Option<Coordinate>) {
        let mut at = start;
        for entry in &mut self.entries {
            at = at.map(|c| c.step(entry.direction));
            entry.predicted = at;
        }
    }
}

impl Default for MoveQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING_MOVES)
    }
}
