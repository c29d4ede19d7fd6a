//! Events flowing into and out of a [`Session`](crate::Session).

use wayfinder_coords::{Coordinate, ExitDir};
use wayfinder_movement::{ConnectionState, TimerToken};
use wayfinder_parser::{DoorFlags, ExitFlags, PromptFields, RoomObserved};

/// Work queued for the session, handled strictly in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Decoded text from the game server.
    ServerText(String),
    /// One line typed by the user.
    UserInput(String),
    /// A retry timer came due.
    TimerFired(TimerToken),
    Connection(ConnectionState),
}

/// Published to every subscriber of the session's event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Text for the transport, without line terminator.
    SendToServer(String),
    /// Text for the user's display. `go_ahead` marks the end of a prompt.
    SendToUser { text: String, go_ahead: bool },
    RoomObserved(RoomObserved),
    PromptObserved(PromptFields),
    PositionDesync {
        expected: Coordinate,
        actual: Coordinate,
    },
    DoorStateChanged {
        direction: ExitDir,
        exit_flags: ExitFlags,
        door_flags: DoorFlags,
    },
    MoveFailed { direction: ExitDir },
}
