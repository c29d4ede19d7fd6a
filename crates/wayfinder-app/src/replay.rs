//! Transcript replay.
//!
//! A transcript is plain text. Lines starting with `> ` are what the user
//! typed; `@wait <ms>`, `@offline` and `@online` drive the clock and the
//! connection; every other line is server text.

use std::time::{Duration, Instant};

use wayfinder_core::Session;
use wayfinder_movement::ConnectionState;

const USER_MARKER: &str = "> ";
const DIRECTIVE_MARKER: char = '@';

/// One step of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    Server(String),
    User(String),
    Wait(Duration),
    Connection(ConnectionState),
}

/// Splits a transcript into steps. Unknown directives are kept as server
/// text.
pub fn parse_transcript(text: &str) -> Vec<ReplayStep> {
    text.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> ReplayStep {
    if let Some(input) = line.strip_prefix(USER_MARKER) {
        return ReplayStep::User(input.to_string());
    }
    if let Some(directive) = line.strip_prefix(DIRECTIVE_MARKER) {
        let mut words = directive.split_whitespace();
        match (words.next(), words.next()) {
            (Some("offline"), None) => return ReplayStep::Connection(ConnectionState::Offline),
            (Some("online"), None) => return ReplayStep::Connection(ConnectionState::Online),
            (Some("wait"), Some(ms)) => {
                if let Ok(ms) = ms.parse::<u64>() {
                    return ReplayStep::Wait(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        tracing::debug!(line, "not a replay directive");
    }
    ReplayStep::Server(format!("{line}\n"))
}

/// Feeds every step to `session` on a virtual clock starting at `start`,
/// then ends the server stream. Returns the virtual time that passed.
pub fn replay(session: &mut Session, steps: &[ReplayStep], start: Instant) -> Duration {
    let mut elapsed = Duration::ZERO;
    for step in steps {
        match step {
            ReplayStep::Server(text) => session.on_server_text(text),
            ReplayStep::User(line) => session.on_user_input(line),
            ReplayStep::Wait(duration) => {
                elapsed += *duration;
                session.advance_clock(start + elapsed);
            }
            ReplayStep::Connection(state) => session.set_connection(*state),
        }
    }
    session.finish();
    elapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use wayfinder_config::Config;
    use wayfinder_core::CoreEvent;
    use wayfinder_movement::InMemoryMap;

    #[test]
    fn test_parse_transcript() {
        let steps = parse_transcript("> north\n@wait 1500\n@offline\n@bogus\nYou see a tree.\n");
        assert_eq!(
            steps,
            vec![
                ReplayStep::User("north".to_string()),
                ReplayStep::Wait(Duration::from_millis(1500)),
                ReplayStep::Connection(ConnectionState::Offline),
                ReplayStep::Server("@bogus\n".to_string()),
                ReplayStep::Server("You see a tree.\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_replay_drives_session() {
        let map = InMemoryMap::from_ron_str(
            r#"(rooms: [
                (coordinate: (x: 0, y: 0, z: 0), name: "Gate", exits: "Exits: north."),
                (coordinate: (x: 0, y: -1, z: 0), name: "Road", exits: "Exits: south."),
            ])"#,
        )
        .unwrap();
        let start = Instant::now();
        let mut session = Session::new(&Config::default(), Arc::new(map), start).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.subscribe(move |e: &CoreEvent| sink.borrow_mut().push(e.clone()));

        let transcript = "\u{1b}[32mGate\nExits: north.\n> n\n@wait 1000\n";
        let elapsed = replay(&mut session, &parse_transcript(transcript), start);
        assert_eq!(elapsed, Duration::from_millis(1000));

        let events = events.borrow();
        assert!(events.contains(&CoreEvent::SendToServer("n".to_string())));
        assert!(events.iter().any(
            |e| matches!(e, CoreEvent::RoomObserved(room) if room.name == "Road" && room.synthesized)
        ));
    }

    #[test]
    fn test_replay_closes_trailing_room() {
        let start = Instant::now();
        let mut session =
            Session::new(&Config::default(), Arc::new(InMemoryMap::new()), start).unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.subscribe(move |e: &CoreEvent| sink.borrow_mut().push(e.clone()));

        let transcript = "\u{1b}[32mDock\nWaves lap at the pier.\n";
        replay(&mut session, &parse_transcript(transcript), start);

        let events = events.borrow();
        assert!(events.iter().any(
            |e| matches!(e, CoreEvent::RoomObserved(room) if room.name == "Dock" && room.exits.is_none())
        ));
    }
}
