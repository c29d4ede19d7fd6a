//! Exits line parsing and re-serialization.
//!
//! The server lists a room's exits as `Exits: north, [east], =south=.`,
//! decorating each direction with punctuation that marks doors, roads,
//! climbs, and portals, optionally followed by a parenthesized door name:
//!
//! ```text
//! Exits: (north)(gate), [east], =/up\=, *west*.
//!         │      │       │       │       └ neighbouring room is sunlit
//!         │      │       │       └ road + climb
//!         │      │       └ closed door
//!         │      └ door name
//!         └ open door
//! ```
//!
//! Parsing is best effort: malformed tokens are skipped and the direction
//! stays at its default, and sentence forms like `No exits!` mean "no
//! directions", never an error.

use serde::{Deserialize, Serialize};
use wayfinder_coords::{ALL_EXITS, ExitDir, NUM_EXITS};

use crate::ansi::strip_ansi;
use crate::flags::{DoorFlags, ExitFlags};

const LEADING_DECORATIONS: &[char] = &['(', '[', '#', '=', '-', '/', '\\', '{', '?', '*', '^'];
const TRAILING_DECORATIONS: &[char] = &[')', ']', '#', '=', '-', '/', '\\', '}', '?', '*', '^'];

// ---------------------------------------------------------------------------
// ExitField / ExitsFields
// ---------------------------------------------------------------------------

/// What is known about one direction of the current room.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExitField {
    pub flags: ExitFlags,
    /// Local annotations; the server never reports these.
    pub door_flags: DoorFlags,
    pub door_name: Option<String>,
}

/// Exit state for all six directions of the current room.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExitsFields {
    fields: [ExitField; NUM_EXITS],
}

impl ExitsFields {
    #[must_use]
    pub fn field(&self, dir: ExitDir) -> Option<&ExitField> {
        dir.index().map(|i| &self.fields[i])
    }

    pub fn field_mut(&mut self, dir: ExitDir) -> Option<&mut ExitField> {
        dir.index().map(|i| &mut self.fields[i])
    }

    /// Exit flags for `dir`; empty for the sentinel directions.
    #[must_use]
    pub fn flags(&self, dir: ExitDir) -> ExitFlags {
        self.field(dir).map_or(ExitFlags::NONE, |f| f.flags)
    }

    #[must_use]
    pub fn door_flags(&self, dir: ExitDir) -> DoorFlags {
        self.field(dir).map_or(DoorFlags::NONE, |f| f.door_flags)
    }

    #[must_use]
    pub fn door_name(&self, dir: ExitDir) -> Option<&str> {
        self.field(dir).and_then(|f| f.door_name.as_deref())
    }

    #[must_use]
    pub fn has_exit(&self, dir: ExitDir) -> bool {
        self.flags(dir).is_exit()
    }

    /// Directions that have an exit, in table order.
    pub fn exits(&self) -> impl Iterator<Item = ExitDir> + '_ {
        ALL_EXITS.into_iter().filter(|&dir| self.has_exit(dir))
    }

    /// True when no direction has an exit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exits().next().is_none()
    }

    /// Carries local annotations (door flags and names the server never
    /// sends) over from an earlier view of the same room. Directions that
    /// lost their exit lose their annotations.
    pub fn inherit_annotations(&mut self, previous: &ExitsFields) {
        for (field, old) in self.fields.iter_mut().zip(previous.fields.iter()) {
            if !field.flags.is_exit() {
                continue;
            }
            field.door_flags |= old.door_flags;
            if field.door_name.is_none() {
                field.door_name.clone_from(&old.door_name);
            }
        }
    }

    /// Re-serializes using the same conventions [`parse_exits`] accepts.
    #[must_use]
    pub fn to_exits_line(&self) -> String {
        let tokens: Vec<String> = self
            .exits()
            .filter_map(|dir| self.field(dir).map(|field| encode_token(dir, field)))
            .collect();

        if tokens.is_empty() {
            "Exits: none.".to_string()
        } else {
            format!("Exits: {}.", tokens.join(", "))
        }
    }
}

fn encode_token(dir: ExitDir, field: &ExitField) -> String {
    let flags = field.flags;
    let mut token = dir.name().to_string();
    if flags.is_climb() {
        token = format!("/{token}\\");
    }
    if flags.is_road() {
        token = format!("={token}=");
    }
    if flags.is_special() {
        token = format!("{{{token}}}");
    }
    if flags.is_random() {
        token = format!("?{token}?");
    }
    if flags.contains(ExitFlags::CLOSED) {
        token = format!("[{token}]");
    } else if flags.is_door() {
        token = format!("({token})");
    }
    if let Some(name) = &field.door_name {
        token.push('(');
        token.push_str(name);
        token.push(')');
    }
    token
}

// ---------------------------------------------------------------------------
// ConnectedRoomFields
// ---------------------------------------------------------------------------

/// Light seen in a neighbouring room through an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DirectionalLight {
    #[default]
    Unknown,
    DirectSun,
    IndirectSun,
}

/// Per-direction hints about neighbouring rooms.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectedRoomFields {
    lights: [DirectionalLight; NUM_EXITS],
}

impl ConnectedRoomFields {
    #[must_use]
    pub fn light(&self, dir: ExitDir) -> DirectionalLight {
        dir.index()
            .map_or(DirectionalLight::Unknown, |i| self.lights[i])
    }

    pub fn set_light(&mut self, dir: ExitDir, light: DirectionalLight) {
        if let Some(i) = dir.index() {
            self.lights[i] = light;
        }
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ExitToken {
    dir: ExitDir,
    flags: ExitFlags,
    light: DirectionalLight,
    door_name: Option<String>,
}

/// True for lines the classifier should treat as an exits line.
#[must_use]
pub fn is_exits_line(line: &str) -> bool {
    let clean = strip_ansi(line);
    let lower = clean.trim().to_ascii_lowercase();
    lower.starts_with("exits:") || is_no_exits_sentence(&lower)
}

fn is_no_exits_sentence(lower: &str) -> bool {
    lower.starts_with("no exits") || lower.starts_with("no obvious exits")
}

fn decoration_flags(c: char, flags: &mut ExitFlags, light: &mut DirectionalLight) {
    match c {
        '(' | ')' | '#' => flags.insert(ExitFlags::DOOR),
        '[' | ']' => flags.insert(ExitFlags::DOOR | ExitFlags::CLOSED),
        '=' | '-' => flags.insert(ExitFlags::ROAD),
        '/' | '\\' => flags.insert(ExitFlags::CLIMB),
        '{' | '}' => flags.insert(ExitFlags::SPECIAL),
        '?' => flags.insert(ExitFlags::RANDOM),
        '*' => *light = DirectionalLight::DirectSun,
        '^' => *light = DirectionalLight::IndirectSun,
        _ => {}
    }
}

fn is_separator(c: char) -> bool {
    c == ',' || c == '.' || c == '!' || c.is_whitespace()
}

fn scan_exits(block: &str) -> Vec<ExitToken> {
    let clean = strip_ansi(block);
    let joined = clean.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = joined.to_ascii_lowercase();

    if is_no_exits_sentence(&lower) {
        return Vec::new();
    }
    let body = match lower.find("exits:") {
        Some(i) => &joined[i + "exits:".len()..],
        None => joined.as_str(),
    };

    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if is_separator(chars[i]) {
            i += 1;
            continue;
        }
        let start = i;
        let mut flags = ExitFlags::EXIT;
        let mut light = DirectionalLight::Unknown;

        while i < chars.len() && LEADING_DECORATIONS.contains(&chars[i]) {
            decoration_flags(chars[i], &mut flags, &mut light);
            i += 1;
        }
        let word_start = i;
        while i < chars.len() && chars[i].is_ascii_alphabetic() {
            i += 1;
        }
        let word: String = chars[word_start..i].iter().collect();
        while i < chars.len() && TRAILING_DECORATIONS.contains(&chars[i]) {
            decoration_flags(chars[i], &mut flags, &mut light);
            i += 1;
        }

        let mut door_name = None;
        if i < chars.len() && chars[i] == '(' {
            if let Some(len) = chars[i + 1..].iter().position(|&c| c == ')') {
                let name: String = chars[i + 1..i + 1 + len].iter().collect();
                let name = name.trim();
                if !name.is_empty() {
                    door_name = Some(name.to_string());
                }
                i += len + 2;
            }
        }

        // Skip whatever is left of a malformed token.
        while i < chars.len() && !is_separator(chars[i]) {
            i += 1;
        }
        if i == start {
            i += 1;
        }

        match ExitDir::parse(&word) {
            Some(dir) if dir.name().eq_ignore_ascii_case(&word) => {
                tokens.push(ExitToken {
                    dir,
                    flags,
                    light,
                    door_name,
                });
            }
            _ => {
                if !word.eq_ignore_ascii_case("none") && !word.is_empty() {
                    tracing::debug!(token = %word, "skipping unrecognized exit token");
                }
            }
        }
    }
    tokens
}

/// Parses an exits line (or block) into per-direction flags. Directions
/// the line does not mention keep default flags.
#[must_use]
pub fn parse_exits(block: &str) -> ExitsFields {
    let mut exits = ExitsFields::default();
    for token in scan_exits(block) {
        if let Some(field) = exits.field_mut(token.dir) {
            field.flags = token.flags;
            field.door_name = token.door_name;
        }
    }
    exits
}

/// Reads the neighbouring-room light markers (`*`, `^`) of an exits line.
#[must_use]
pub fn parse_connected_rooms(block: &str) -> ConnectedRoomFields {
    let mut connected = ConnectedRoomFields::default();
    for token in scan_exits(block) {
        connected.set_light(token.dir, token.light);
    }
    connected
}
