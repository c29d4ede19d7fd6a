//! Door and exit command synthesis.
//!
//! Turns "open the door to the east" into the exact text the server expects,
//! using the door names tracked in the current [`ExitsFields`], and edits
//! the local exit/door annotations.

use wayfinder_coords::{ALL_EXITS, ExitDir};
use wayfinder_parser::{DoorFlag, DoorFlags, ExitFlag, ExitFlags, ExitsFields};

const VARIABLE_OPEN: &str = "$$DOOR_";
const VARIABLE_CLOSE: &str = "$$";

/// Actions that target a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorAction {
    Open,
    Close,
    Lock,
    Unlock,
    Pick,
    Rock,
    Bash,
    Break,
    Block,
    Knock,
}

impl DoorAction {
    pub const ALL: [DoorAction; 10] = [
        DoorAction::Open,
        DoorAction::Close,
        DoorAction::Lock,
        DoorAction::Unlock,
        DoorAction::Pick,
        DoorAction::Rock,
        DoorAction::Bash,
        DoorAction::Break,
        DoorAction::Block,
        DoorAction::Knock,
    ];

    /// Text sent to the server before the door name.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Pick => "pick",
            Self::Rock => "throw rock",
            Self::Bash => "bash",
            Self::Break => "cast 'break door'",
            Self::Block => "cast 'block door'",
            Self::Knock => "knock",
        }
    }

    /// Name of the local command that performs this action.
    #[must_use]
    pub fn command_name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Pick => "pick",
            Self::Rock => "rock",
            Self::Bash => "bash",
            Self::Break => "break",
            Self::Block => "block",
            Self::Knock => "knock",
        }
    }

    /// Shortest accepted abbreviation of [`command_name`](Self::command_name).
    #[must_use]
    pub fn min_abbreviation(self) -> usize {
        match self {
            // "ba" would also select "back".
            Self::Bash => 3,
            _ => 2,
        }
    }
}

/// Builds the server command for `action` on the door in `dir`.
///
/// Uses the tracked door name when there is one, appending the direction
/// when another exit carries the same name. Without a name the server's
/// `exit <d>` form is used. Returns `None` for the sentinel directions.
#[must_use]
pub fn door_command(action: DoorAction, dir: ExitDir, exits: &ExitsFields) -> Option<String> {
    if !dir.is_real() {
        return None;
    }
    let verb = action.verb();
    match exits.door_name(dir) {
        Some(name) => {
            let shared = ALL_EXITS.into_iter().any(|other| {
                other != dir
                    && exits
                        .door_name(other)
                        .is_some_and(|n| n.eq_ignore_ascii_case(name))
            });
            if shared {
                Some(format!("{verb} {name} {}", dir.abbreviation()))
            } else {
                Some(format!("{verb} {name}"))
            }
        }
        None => Some(format!("{verb} exit {}", dir.abbreviation())),
    }
}

/// Flips one exit flag on `dir`. Returns the new flag set.
pub fn toggle_exit_flag(exits: &mut ExitsFields, flag: ExitFlag, dir: ExitDir) -> Option<ExitFlags> {
    let field = exits.field_mut(dir)?;
    field.flags.toggle(flag.bits());
    Some(field.flags)
}

/// Flips one door annotation on `dir`. Returns the new flag set.
pub fn toggle_door_flag(exits: &mut ExitsFields, flag: DoorFlag, dir: ExitDir) -> Option<DoorFlags> {
    let field = exits.field_mut(dir)?;
    field.door_flags.toggle(flag.bits());
    Some(field.door_flags)
}

/// Sets (or with an empty `name`, clears) the door name on `dir`.
pub fn set_door_name(exits: &mut ExitsFields, dir: ExitDir, name: &str) -> bool {
    let Some(field) = exits.field_mut(dir) else {
        return false;
    };
    let name = name.trim();
    field.door_name = (!name.is_empty()).then(|| name.to_string());
    true
}

/// Replaces every `$$DOOR_N$$` (N one of `NSEWUD`) in `line` with that
/// direction's door name, or `exit <d>` when unnamed. Returns `None` when
/// `line` contains no variable.
#[must_use]
pub fn expand_door_variables(line: &str, exits: &ExitsFields) -> Option<String> {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    let mut expanded = false;

    while let Some(start) = rest.find(VARIABLE_OPEN) {
        let after = &rest[start + VARIABLE_OPEN.len()..];
        let mut chars = after.chars();
        let dir = chars.next().and_then(ExitDir::from_abbreviation);
        match dir {
            Some(dir) if chars.as_str().starts_with(VARIABLE_CLOSE) => {
                out.push_str(&rest[..start]);
                match exits.door_name(dir) {
                    Some(name) => out.push_str(name),
                    None => {
                        out.push_str("exit ");
                        out.push(dir.abbreviation());
                    }
                }
                rest = &chars.as_str()[VARIABLE_CLOSE.len()..];
                expanded = true;
            }
            _ => {
                out.push_str(&rest[..start + VARIABLE_OPEN.len()]);
                rest = after;
            }
        }
    }
    out.push_str(rest);

    expanded.then_some(out)
}
