//! Movement coordination: prediction, confirmation, and offline emulation.
//!
//! Every move the player sends is queued with the coordinate it should lead
//! to. When the server shows the next room the front move is confirmed
//! against it. If the two disagree the server wins: the mismatch is
//! reported once, the server's coordinate becomes the confirmed position,
//! and the remaining predictions are replayed from there.
//!
//! While no server answers (offline, or a move left unanswered for the
//! retry timeout) moves are emulated from the map instead. The retry timer
//! is identified by a [`TimerToken`]; arming a new one makes any earlier
//! token stale, so a late firing is simply ignored.

use std::time::{Duration, Instant};

use wayfinder_coords::{Coordinate, ExitDir};
use wayfinder_parser::RoomObserved;

use crate::map::MapLookup;
use crate::queue::{MoveError, MoveQueue, PendingMove};

/// Default wait before an unanswered move is emulated.
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_millis(1000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Whether a server is there to answer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Online,
    Offline,
}

/// Identifies one arming of the retry timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Things the coordinator asks its owner to do or publish.
#[derive(Debug, Clone, PartialEq)]
pub enum MovementOutcome {
    /// A move was emulated from the map; show and publish this room.
    Synthesized {
        room: RoomObserved,
        coordinate: Coordinate,
    },
    /// The server confirmed a different room than predicted.
    Desync {
        expected: Coordinate,
        actual: Coordinate,
    },
    /// Fire [`MovementCoordinator::on_timer`] with `token` at `deadline`.
    TimerArmed { token: TimerToken, deadline: Instant },
    /// A queued move could not be emulated and was dropped.
    Refused(ExitDir),
}

// ---------------------------------------------------------------------------
// MovementCoordinator
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MovementCoordinator {
    queue: MoveQueue,
    last_confirmed: Option<Coordinate>,
    connection: ConnectionState,
    timer: Option<(TimerToken, Instant)>,
    next_token: u64,
    retry_timeout: Duration,
}

impl MovementCoordinator {
    pub fn new(max_pending: usize, retry_timeout: Duration, connection: ConnectionState) -> Self {
        Self {
            queue: MoveQueue::new(max_pending),
            last_confirmed: None,
            connection,
            timer: None,
            next_token: 0,
            retry_timeout,
        }
    }

    pub fn last_confirmed(&self) -> Option<Coordinate> {
        self.last_confirmed
    }

    /// Tells the coordinator where the player is without a server room,
    /// e.g. after the user picks a room on the map.
    pub fn set_position(&mut self, coordinate: Option<Coordinate>) {
        self.last_confirmed = coordinate;
        self.queue.rechain(coordinate);
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingMove> {
        self.queue.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// The armed retry timer, if any.
    pub fn timer(&self) -> Option<(TimerToken, Instant)> {
        self.timer
    }

    /// Where the player will be once every queued move succeeds.
    pub fn predicted_position(&self) -> Option<Coordinate> {
        self.queue.tail(self.last_confirmed)
    }

    fn arm_timer(&mut self, now: Instant, out: &mut Vec<MovementOutcome>) {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        let deadline = now + self.retry_timeout;
        self.timer = Some((token, deadline));
        out.push(MovementOutcome::TimerArmed { token, deadline });
    }

    /// Arms the timer while some queued move is neither answered nor
    /// emulated.
    fn rearm_if_pending(&mut self, now: Instant, out: &mut Vec<MovementOutcome>) {
        if self.connection == ConnectionState::Online
            && self.queue.emulated_len() < self.queue.len()
        {
            self.arm_timer(now, out);
        } else {
            self.timer = None;
        }
    }

    /// Emulates one step from the confirmed position. On success the player
    /// is moved there and the room is returned.
    fn emulate(&mut self, dir: ExitDir, map: &dyn MapLookup) -> Option<MovementOutcome> {
        let (room, coordinate) = emulate_step(self.last_confirmed?, dir, map)?;
        self.last_confirmed = Some(coordinate);
        Some(MovementOutcome::Synthesized { room, coordinate })
    }

    /// Queues a move in `dir`. Online the move waits for the server (and the
    /// retry timer is armed); offline it is emulated at once.
    pub fn enqueue_move(
        &mut self,
        dir: ExitDir,
        now: Instant,
        map: &dyn MapLookup,
    ) -> Result<Vec<MovementOutcome>, MoveError> {
        if !dir.is_real() {
            return Err(MoveError::CannotGo(dir));
        }
        if self.queue.is_full() {
            tracing::warn!(%dir, max = self.queue.max_size(), "move queue full");
            return Err(MoveError::QueueFull {
                max: self.queue.max_size(),
            });
        }

        let mut out = Vec::new();
        match self.connection {
            ConnectionState::Online => {
                let predicted = self.queue.tail(self.last_confirmed).map(|c| c.step(dir));
                self.queue.push(PendingMove::new(dir, predicted))?;
                if self.timer.is_none() {
                    self.arm_timer(now, &mut out);
                }
            }
            ConnectionState::Offline => match self.emulate(dir, map) {
                Some(outcome) => out.push(outcome),
                None => {
                    tracing::warn!(%dir, "cannot emulate move offline");
                    return Err(MoveError::CannotGo(dir));
                }
            },
        }
        Ok(out)
    }

    /// Handles a retry timer firing. Stale tokens are ignored. Otherwise the
    /// oldest move not yet emulated is emulated from the map if it allows
    /// it, and the timer is re-armed while such moves remain. Emulated moves
    /// stay queued: the server's late answer still confirms them.
    pub fn on_timer(
        &mut self,
        token: TimerToken,
        now: Instant,
        map: &dyn MapLookup,
    ) -> Vec<MovementOutcome> {
        let mut out = Vec::new();
        match self.timer {
            Some((armed, _)) if armed == token => {}
            _ => {
                tracing::debug!(token = token.id(), "stale timer ignored");
                return out;
            }
        }
        self.timer = None;

        let index = self.queue.emulated_len();
        if let Some(next) = self.queue.get(index).copied() {
            let from = match index {
                0 => self.last_confirmed,
                _ => self.queue.get(index - 1).and_then(|m| m.predicted),
            };
            match from.and_then(|from| emulate_step(from, next.direction, map)) {
                Some((room, coordinate)) => {
                    if let Some(entry) = self.queue.get_mut(index) {
                        entry.emulated = true;
                        entry.predicted = Some(coordinate);
                    }
                    out.push(MovementOutcome::Synthesized { room, coordinate });
                }
                None => {
                    tracing::debug!(dir = %next.direction, "no answer yet and nothing to emulate");
                }
            }
        }
        self.rearm_if_pending(now, &mut out);
        out
    }

    /// Handles a room the server showed. Confirms the move in flight, if
    /// any, and reports a desync when its prediction was wrong.
    pub fn on_room_observed(
        &mut self,
        room: &RoomObserved,
        now: Instant,
        map: &dyn MapLookup,
    ) -> Vec<MovementOutcome> {
        let mut out = Vec::new();
        self.timer = None;

        let actual = map.resolve(room);
        if let Some(front) = self.queue.pop_front()
            && let (Some(expected), Some(actual)) = (front.predicted, actual)
            && expected != actual
        {
            tracing::warn!(%expected, %actual, dir = %front.direction, "position desync");
            out.push(MovementOutcome::Desync { expected, actual });
        }

        self.last_confirmed = actual;
        self.queue.rechain(actual);
        self.rearm_if_pending(now, &mut out);
        out
    }

    /// Drops the move in flight after the server refused it.
    pub fn on_move_failed(&mut self, now: Instant) -> (Option<PendingMove>, Vec<MovementOutcome>) {
        let mut out = Vec::new();
        let failed = self.queue.pop_front();
        if let Some(mv) = &failed {
            tracing::info!(dir = %mv.direction, "move refused by server");
            self.queue.rechain(self.last_confirmed);
            self.rearm_if_pending(now, &mut out);
        }
        (failed, out)
    }

    /// Removes the most recently queued move.
    pub fn pop_last(&mut self) -> Option<PendingMove> {
        let popped = self.queue.pop_back();
        if self.queue.is_empty() {
            self.timer = None;
        }
        popped
    }

    /// Switches between online and offline. Going offline emulates every
    /// queued move in order; the first one that cannot be emulated drops
    /// the rest.
    pub fn set_connection(
        &mut self,
        state: ConnectionState,
        now: Instant,
        map: &dyn MapLookup,
    ) -> Vec<MovementOutcome> {
        let mut out = Vec::new();
        if state == self.connection {
            return out;
        }
        tracing::info!(?state, "connection changed");
        self.connection = state;

        match state {
            ConnectionState::Offline => {
                self.timer = None;
                while let Some(mv) = self.queue.pop_front() {
                    if mv.emulated {
                        // Already shown; only the position catches up.
                        self.last_confirmed = mv.predicted.or(self.last_confirmed);
                        continue;
                    }
                    match self.emulate(mv.direction, map) {
                        Some(outcome) => out.push(outcome),
                        None => {
                            out.push(MovementOutcome::Refused(mv.direction));
                            out.extend(
                                std::iter::from_fn(|| self.queue.pop_front())
                                    .map(|rest| MovementOutcome::Refused(rest.direction)),
                            );
                        }
                    }
                }
            }
            ConnectionState::Online => self.rearm_if_pending(now, &mut out),
        }
        out
    }

    /// Forgets the queue, the confirmed position, and the timer.
    pub fn reset(&mut self) {
        tracing::info!(dropped = self.queue.len(), "movement reset");
        self.queue.clear();
        self.last_confirmed = None;
        self.timer = None;
    }
}

/// One step from `from` using only the map: the room must list the exit
/// (when the map knows its exits) and the target room must be mapped.
fn emulate_step(
    from: Coordinate,
    dir: ExitDir,
    map: &dyn MapLookup,
) -> Option<(RoomObserved, Coordinate)> {
    if let Some(exits) = map.room_at(from).and_then(|room| room.exits)
        && !exits.has_exit(dir)
    {
        tracing::debug!(%from, %dir, "no exit to emulate");
        return None;
    }
    let coordinate = from.step(dir);
    let mut room = map.room_at(coordinate)?;
    room.synthesized = true;
    tracing::debug!(%coordinate, name = %room.name, "emulated move");
    Some((room, coordinate))
}

impl Default for MovementCoordinator {
    fn default() -> Self {
        Self::new(
            crate::queue::DEFAULT_MAX_PENDING_MOVES,
            DEFAULT_RETRY_TIMEOUT,
            ConnectionState::Online,
        )
    }
}
