//! Locally intercepted commands: the prefix-command registry and dispatcher,
//! and the door/exit command synthesizer.

pub mod dispatcher;
pub mod door;
pub mod registry;

pub use dispatcher::{Dispatch, DispatchContext, SpecialCommandDispatcher};
pub use door::{
    DoorAction, door_command, expand_door_variables, set_door_name, toggle_door_flag,
    toggle_exit_flag,
};
pub use registry::{CommandEntry, CommandHandler, CommandRegistry, Invocation, Lookup, RegistryError};
