//! Text modes: what happens to server text.
//!
//! The mode is picked when the session is built. [`ClassifyingMode`] is
//! normal play; [`PassthroughMode`] shows the text and tracks nothing, for
//! servers or situations where the classifier would only get in the way.

use wayfinder_parser::{LineKind, StreamClassifier, StreamEvent, strip_ansi};

use crate::events::CoreEvent;
use crate::session::SessionState;

/// Strategy for handling server text.
pub trait TextMode {
    fn name(&self) -> &'static str;

    fn on_server_text(&mut self, state: &mut SessionState, chunk: &str);

    /// The server stream ended; handles anything still held back.
    fn finish(&mut self, _state: &mut SessionState) {}

    /// Drops any partially handled text.
    fn reset(&mut self) {}
}

// ---------------------------------------------------------------------------
// ClassifyingMode
// ---------------------------------------------------------------------------

/// Classifies every line, keeps the current room/exits/prompt up to date,
/// and drives movement confirmation.
#[derive(Debug)]
pub struct ClassifyingMode {
    classifier: StreamClassifier,
}

impl ClassifyingMode {
    pub fn new(room_name_color: &str) -> Self {
        Self {
            classifier: StreamClassifier::new(room_name_color),
        }
    }
}

impl TextMode for ClassifyingMode {
    fn name(&self) -> &'static str {
        "classifying"
    }

    fn on_server_text(&mut self, state: &mut SessionState, chunk: &str) {
        apply_stream_events(state, self.classifier.feed(chunk));
    }

    fn finish(&mut self, state: &mut SessionState) {
        apply_stream_events(state, self.classifier.finish());
    }

    fn reset(&mut self) {
        self.classifier.reset();
    }
}

fn apply_stream_events(state: &mut SessionState, events: Vec<StreamEvent>) {
    for event in events {
        match event {
            StreamEvent::Line { text, kind } => {
                if kind == LineKind::Narrative {
                    state.on_narrative(&strip_ansi(&text));
                }
                let (text, go_ahead) = match kind {
                    LineKind::Prompt => (text, true),
                    _ => (text + "\n", false),
                };
                state.publish(CoreEvent::SendToUser { text, go_ahead });
            }
            StreamEvent::Room(room) => state.on_room(room),
            StreamEvent::Exits { exits, connected } => state.on_exits(exits, connected),
            StreamEvent::Prompt(prompt) => state.on_prompt(prompt),
        }
    }
}

// ---------------------------------------------------------------------------
// PassthroughMode
// ---------------------------------------------------------------------------

/// Echoes server text to the user untouched.
#[derive(Debug, Default)]
pub struct PassthroughMode;

impl TextMode for PassthroughMode {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn on_server_text(&mut self, state: &mut SessionState, chunk: &str) {
        state.publish(CoreEvent::SendToUser {
            text: chunk.to_string(),
            go_ahead: false,
        });
    }
}
