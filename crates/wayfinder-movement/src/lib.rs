//! Movement tracking: predicted moves, confirmation against server rooms,
//! and offline emulation from map data.

pub mod coordinator;
pub mod map;
pub mod queue;

pub use coordinator::{ConnectionState, MovementCoordinator, MovementOutcome, TimerToken};
pub use map::{InMemoryMap, MapError, MapLookup, MapRoom};
pub use queue::{DEFAULT_MAX_PENDING_MOVES, MoveError, MoveQueue, PendingMove};
