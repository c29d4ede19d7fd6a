//! Room observations produced by the classifier.

use serde::{Deserialize, Serialize};

use crate::exits::{ConnectedRoomFields, ExitsFields};

/// A room the player is (or is predicted to be) standing in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomObserved {
    /// Room name, ANSI stripped.
    pub name: String,
    /// Description lines in arrival order.
    pub description: Vec<String>,
    /// `None` when the block ended before an exits line arrived (dark room,
    /// brief mode).
    pub exits: Option<ExitsFields>,
    pub connected: ConnectedRoomFields,
    /// Built locally from map data instead of received from the server.
    pub synthesized: bool,
}

impl RoomObserved {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, lines: &[&str]) -> Self {
        self.description = lines.iter().map(|l| (*l).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_exits(mut self, exits: ExitsFields) -> Self {
        self.exits = Some(exits);
        self
    }

    /// Text shown to the user for this room: name, description, and the
    /// exits line when known.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(&self.name);
        out.push('\n');
        for line in &self.description {
            out.push_str(line);
            out.push('\n');
        }
        if let Some(exits) = &self.exits {
            out.push_str(&exits.to_exits_line());
            out.push('\n');
        }
        out
    }
}
