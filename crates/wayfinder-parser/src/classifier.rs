//! Line-by-line classification of server text.
//!
//! [`StreamClassifier`] buffers decoded text chunks, splits them into lines,
//! and decides for each line whether it is a room name, a description line,
//! an exits line, a prompt, or ordinary narrative. Classification is local
//! to the line except for the room block: a room name opens a block that
//! collects description lines until an exits line (or a prompt, or the next
//! room name) closes it.
//!
//! ```text
//!   AwaitingBlock ──room name──▶ InRoomBlock ──exits line──▶ AwaitingBlock
//!        │  ▲                       │   │                       (Room)
//!        │  └──────── prompt ───────┘   └─ other line: description
//!        └─ other line: narrative
//! ```

use crate::ansi::strip_ansi;
use crate::exits::{ConnectedRoomFields, ExitsFields, is_exits_line, parse_connected_rooms, parse_exits};
use crate::prompt::{PromptFields, is_prompt_line, parse_prompt};
use crate::room::RoomObserved;

/// Description lines kept per room before the block is abandoned.
pub const MAX_DESCRIPTION_LINES: usize = 64;

/// Unterminated input held back before it is forced out as narrative.
pub const MAX_PARTIAL_LEN: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// How a single line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    RoomName,
    Description,
    Exits,
    Prompt,
    Narrative,
}

/// Output of [`StreamClassifier::feed`], in stream order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Every input line, for the display path.
    Line { text: String, kind: LineKind },
    /// A room block closed.
    Room(RoomObserved),
    /// An exits line outside any room block (e.g. the reply to `exits`).
    Exits {
        exits: ExitsFields,
        connected: ConnectedRoomFields,
    },
    /// A prompt line.
    Prompt(PromptFields),
}

// ---------------------------------------------------------------------------
// StreamClassifier
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
enum BlockState {
    #[default]
    AwaitingBlock,
    InRoomBlock {
        name: String,
        description: Vec<String>,
    },
}

/// Stateful classifier for the server text stream.
#[derive(Debug)]
pub struct StreamClassifier {
    room_name_color: String,
    partial: String,
    state: BlockState,
}

impl StreamClassifier {
    /// `room_name_color` is the ANSI prefix that marks room name lines; an
    /// empty string disables room detection.
    pub fn new(room_name_color: impl Into<String>) -> Self {
        Self {
            room_name_color: room_name_color.into(),
            partial: String::new(),
            state: BlockState::AwaitingBlock,
        }
    }

    /// Returns `true` while a room name has been seen but not yet closed.
    pub fn in_room_block(&self) -> bool {
        matches!(self.state, BlockState::InRoomBlock { .. })
    }

    /// Drops buffered input and any open room block.
    pub fn reset(&mut self) {
        self.partial.clear();
        self.state = BlockState::AwaitingBlock;
    }

    /// Feeds one decoded chunk. Complete lines are classified; a trailing
    /// fragment is held until more text arrives unless it is a prompt,
    /// which the server sends without a line terminator.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        self.partial.push_str(chunk);

        while let Some(pos) = self.partial.find('\n') {
            let mut line: String = self.partial.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            self.classify_line(&line, &mut out);
        }

        if !self.partial.is_empty()
            && (is_prompt_line(&self.partial) || self.partial.len() > MAX_PARTIAL_LEN)
        {
            let line = std::mem::take(&mut self.partial);
            self.classify_line(&line, &mut out);
        }
        out
    }

    /// Classifies whatever fragment is still buffered, e.g. when the
    /// transport signals end of a server message.
    pub fn flush(&mut self) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.classify_line(&line, &mut out);
        }
        out
    }

    /// End of stream: flushes the held fragment and closes any open room
    /// block with unknown exits.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut out = self.flush();
        if let Some(room) = self.close_block(None) {
            out.push(StreamEvent::Room(room));
        }
        out
    }

    fn is_room_name(&self, raw: &str, clean: &str) -> bool {
        !self.room_name_color.is_empty()
            && raw.starts_with(&self.room_name_color)
            && !clean.trim().is_empty()
    }

    fn close_block(&mut self, exits: Option<(ExitsFields, ConnectedRoomFields)>) -> Option<RoomObserved> {
        match std::mem::take(&mut self.state) {
            BlockState::AwaitingBlock => None,
            BlockState::InRoomBlock { name, description } => {
                let (exits, connected) = match exits {
                    Some((exits, connected)) => (Some(exits), connected),
                    None => (None, ConnectedRoomFields::default()),
                };
                Some(RoomObserved {
                    name,
                    description,
                    exits,
                    connected,
                    synthesized: false,
                })
            }
        }
    }

    fn classify_line(&mut self, raw: &str, out: &mut Vec<StreamEvent>) {
        let clean = strip_ansi(raw);

        if self.is_room_name(raw, &clean) {
            if let Some(room) = self.close_block(None) {
                out.push(StreamEvent::Room(room));
            }
            tracing::debug!(name = %clean.trim(), "room block opened");
            self.state = BlockState::InRoomBlock {
                name: clean.trim().to_string(),
                description: Vec::new(),
            };
            out.push(line(raw, LineKind::RoomName));
            return;
        }

        if is_exits_line(&clean) {
            let exits = parse_exits(&clean);
            let connected = parse_connected_rooms(&clean);
            out.push(line(raw, LineKind::Exits));
            match self.close_block(Some((exits.clone(), connected.clone()))) {
                Some(room) => out.push(StreamEvent::Room(room)),
                None => out.push(StreamEvent::Exits { exits, connected }),
            }
            return;
        }

        if is_prompt_line(&clean) {
            if let Some(room) = self.close_block(None) {
                out.push(StreamEvent::Room(room));
            }
            out.push(line(raw, LineKind::Prompt));
            out.push(StreamEvent::Prompt(parse_prompt(&clean)));
            return;
        }

        match &mut self.state {
            BlockState::InRoomBlock { description, .. } => {
                if clean.trim().is_empty() {
                    out.push(line(raw, LineKind::Narrative));
                } else if description.len() >= MAX_DESCRIPTION_LINES {
                    tracing::debug!("room block abandoned after {MAX_DESCRIPTION_LINES} lines");
                    self.state = BlockState::AwaitingBlock;
                    out.push(line(raw, LineKind::Narrative));
                } else {
                    description.push(clean.trim_end().to_string());
                    out.push(line(raw, LineKind::Description));
                }
            }
            BlockState::AwaitingBlock => out.push(line(raw, LineKind::Narrative)),
        }
    }
}

fn line(raw: &str, kind: LineKind) -> StreamEvent {
    StreamEvent::Line {
        text: raw.to_string(),
        kind,
    }
}
