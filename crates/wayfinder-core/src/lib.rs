//! The wayfinder event loop.
//!
//! A [`Session`] owns everything needed to follow the player around: the
//! text mode (and with it the stream classifier), the movement coordinator,
//! the current prompt and exits, the special-command dispatcher, and the
//! event bus. Server text, user input, timer firings, and connection
//! changes all enter through one inbound queue and are handled in order.

pub mod builtin;
pub mod bus;
pub mod error;
pub mod events;
pub mod mode;
pub mod session;
pub mod timers;

#[cfg(test)]
mod tests;

pub use bus::{EventBus, EventSink};
pub use error::SessionError;
pub use events::{CoreEvent, InboundEvent};
pub use mode::{ClassifyingMode, PassthroughMode, TextMode};
pub use session::{Session, SessionState};
pub use timers::TimerQueue;
