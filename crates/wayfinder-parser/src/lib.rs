//! Server text parsing: prompts, exits lines, and room blocks.

pub mod ansi;
pub mod classifier;
pub mod exits;
pub mod flags;
pub mod prompt;
pub mod room;

pub use ansi::strip_ansi;
pub use classifier::{LineKind, MAX_DESCRIPTION_LINES, StreamClassifier, StreamEvent};
pub use exits::{
    ConnectedRoomFields, DirectionalLight, ExitField, ExitsFields, is_exits_line,
    parse_connected_rooms, parse_exits,
};
pub use flags::{DoorFlag, DoorFlags, ExitFlag, ExitFlags, PromptFlags};
pub use prompt::{LightLevel, MAX_PROMPT_LEN, PromptFields, Terrain, is_prompt_line, parse_prompt};
pub use room::RoomObserved;
