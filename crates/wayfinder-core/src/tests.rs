//! Scenario tests for the session event loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use wayfinder_commands::{Invocation, RegistryError};
use wayfinder_config::{Config, ConfigError};
use wayfinder_coords::{Coordinate, ExitDir};
use wayfinder_movement::{ConnectionState, InMemoryMap, MapRoom};
use wayfinder_parser::{LightLevel, Terrain};

use crate::{CoreEvent, PassthroughMode, Session, SessionError, SessionState};

const GREEN: &str = "\u{1b}[32m";
const RESET: &str = "\u{1b}[0m";

fn map_room(x: i32, y: i32, name: &str, exits: &str) -> MapRoom {
    MapRoom {
        coordinate: Coordinate::new(x, y, 0),
        name: name.to_string(),
        description: vec![format!("You are in the {name}.")],
        exits: exits.to_string(),
        light: LightLevel::Sun,
        terrain: Terrain::City,
    }
}

fn test_map() -> Arc<InMemoryMap> {
    let map = InMemoryMap::from_rooms([
        map_room(0, 0, "Centre", "Exits: north, [east](gate), south."),
        map_room(0, -1, "North Arm", "Exits: south."),
        map_room(1, 0, "East Arm", "Exits: west."),
        map_room(0, 1, "South Arm", "Exits: north."),
    ])
    .unwrap();
    Arc::new(map)
}

fn room_text(name: &str, exits: &str) -> String {
    format!("{GREEN}{name}{RESET}\nYou are in the {name}.\n{exits}\n")
}

struct Harness {
    session: Session,
    events: Receiver<CoreEvent>,
    start: Instant,
}

impl Harness {
    fn new(config: Config) -> Self {
        let start = Instant::now();
        let mut session = Session::new(&config, test_map(), start).unwrap();
        let (tx, events) = crossbeam_channel::unbounded();
        session.subscribe(tx);
        Self {
            session,
            events,
            start,
        }
    }

    fn at_centre() -> Self {
        let mut h = Self::new(Config::default());
        h.server(&room_text("Centre", "Exits: north, [east](gate), south."));
        h.drain();
        h
    }

    fn server(&mut self, text: &str) {
        self.session.on_server_text(text);
    }

    fn user(&mut self, line: &str) {
        self.session.on_user_input(line);
    }

    fn drain(&self) -> Vec<CoreEvent> {
        self.events.try_iter().collect()
    }

    fn state(&self) -> &SessionState {
        self.session.state()
    }
}

fn sent(events: &[CoreEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::SendToServer(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn shown(events: &[CoreEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::SendToUser { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn rooms(events: &[CoreEvent]) -> Vec<(&str, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::RoomObserved(room) => Some((room.name.as_str(), room.synthesized)),
            _ => None,
        })
        .collect()
}

fn desyncs(events: &[CoreEvent]) -> Vec<(Coordinate, Coordinate)> {
    events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::PositionDesync { expected, actual } => Some((*expected, *actual)),
            _ => None,
        })
        .collect()
}

// --- Server text ---

#[test]
fn test_lines_are_shown_and_prompt_tracked() {
    let mut h = Harness::new(Config::default());
    h.server("The wind howls.\n*#>");
    let events = h.drain();

    assert!(events.contains(&CoreEvent::SendToUser {
        text: "The wind howls.\n".to_string(),
        go_ahead: false
    }));
    assert!(events.contains(&CoreEvent::SendToUser {
        text: "*#>".to_string(),
        go_ahead: true
    }));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, CoreEvent::PromptObserved(p) if p.light == LightLevel::Sun))
    );
    assert_eq!(h.state().prompt().terrain, Terrain::City);
}

#[test]
fn test_finish_closes_open_room_block() {
    let mut h = Harness::new(Config::default());
    h.server(&format!("{GREEN}Centre{RESET}\nYou are in the Centre.\n"));
    assert!(rooms(&h.drain()).is_empty());

    h.session.finish();
    assert_eq!(rooms(&h.drain()), vec![("Centre", false)]);
    assert_eq!(
        h.state().coordinator().last_confirmed(),
        Some(Coordinate::new(0, 0, 0))
    );
}

#[test]
fn test_room_sets_position_and_exits() {
    let h = Harness::at_centre();
    assert_eq!(
        h.state().coordinator().last_confirmed(),
        Some(Coordinate::new(0, 0, 0))
    );
    assert!(h.state().exits().flags(ExitDir::East).is_closed_door());
    assert_eq!(h.state().exits().door_name(ExitDir::East), Some("gate"));
}

#[test]
fn test_passthrough_mode_tracks_nothing() {
    let config = Config::default();
    let start = Instant::now();
    let mut session =
        Session::with_mode(&config, test_map(), Box::new(PassthroughMode), start).unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();
    session.subscribe(tx);

    let text = room_text("Centre", "Exits: north.");
    session.on_server_text(&text);
    let events: Vec<CoreEvent> = rx.try_iter().collect();

    assert_eq!(session.mode_name(), "passthrough");
    assert_eq!(
        events,
        vec![CoreEvent::SendToUser {
            text,
            go_ahead: false
        }]
    );
    assert_eq!(session.state().coordinator().last_confirmed(), None);
}

// --- Movement ---

#[test]
fn test_move_and_matching_confirmation() {
    let mut h = Harness::at_centre();
    h.user("n");
    assert_eq!(sent(&h.drain()), vec!["n"]);
    assert_eq!(h.state().coordinator().pending_len(), 1);

    h.server(&room_text("North Arm", "Exits: south."));
    let events = h.drain();
    assert_eq!(rooms(&events), vec![("North Arm", false)]);
    assert!(desyncs(&events).is_empty());
    assert_eq!(h.state().coordinator().pending_len(), 0);
}

#[test]
fn test_wrong_room_fires_one_desync() {
    let mut h = Harness::at_centre();
    h.user("north");
    h.server(&room_text("East Arm", "Exits: west."));
    let events = h.drain();

    assert_eq!(
        desyncs(&events),
        vec![(Coordinate::new(0, -1, 0), Coordinate::new(1, 0, 0))]
    );
    assert_eq!(
        h.state().coordinator().last_confirmed(),
        Some(Coordinate::new(1, 0, 0))
    );
}

#[test]
fn test_move_failure_pattern_drops_move() {
    let mut h = Harness::at_centre();
    h.user("w");
    h.drain();

    h.server("Alas, you cannot go that way...\n");
    let events = h.drain();
    assert!(events.contains(&CoreEvent::MoveFailed {
        direction: ExitDir::West
    }));
    assert_eq!(h.state().coordinator().pending_len(), 0);
}

#[test]
fn test_queue_full_tells_user() {
    let mut config = Config::default();
    config.movement.max_pending_moves = 2;
    let mut h = Harness::new(config);

    h.user("n");
    h.user("n");
    h.user("n");
    let events = h.drain();
    assert_eq!(sent(&events), vec!["n", "n"]);
    assert!(shown(&events).contains("dropped"));
}

#[test]
fn test_offline_move_is_synthesized() {
    let mut config = Config::default();
    config.movement.start_offline = true;
    let mut h = Harness::new(config);
    h.server(&room_text("Centre", "Exits: north, [east](gate), south."));
    h.drain();

    h.user("s");
    let events = h.drain();
    assert!(sent(&events).is_empty());
    assert_eq!(rooms(&events), vec![("South Arm", true)]);
    let text = shown(&events);
    assert!(text.contains("South Arm\nYou are in the South Arm.\nExits: north.\n"));
    assert!(text.ends_with("*#>"));
    assert_eq!(
        h.state().coordinator().last_confirmed(),
        Some(Coordinate::new(0, 1, 0))
    );
}

#[test]
fn test_offline_without_exit_refuses() {
    let mut config = Config::default();
    config.movement.start_offline = true;
    let mut h = Harness::new(config);
    h.server(&room_text("Centre", "Exits: north, [east](gate), south."));
    h.drain();

    h.user("w");
    let events = h.drain();
    assert!(rooms(&events).is_empty());
    assert!(shown(&events).contains("Alas, you cannot go that way..."));
}

#[test]
fn test_retry_timer_emulates_then_late_room_confirms() {
    let mut h = Harness::at_centre();
    h.user("n");
    h.drain();
    assert_eq!(h.state().timers().len(), 1);

    h.session.advance_clock(h.start + Duration::from_millis(999));
    assert!(rooms(&h.drain()).is_empty());

    h.session.advance_clock(h.start + Duration::from_millis(1000));
    assert_eq!(rooms(&h.drain()), vec![("North Arm", true)]);

    h.server(&room_text("North Arm", "Exits: south."));
    let events = h.drain();
    assert!(desyncs(&events).is_empty());
    assert_eq!(
        h.state().coordinator().last_confirmed(),
        Some(Coordinate::new(0, -1, 0))
    );
}

#[test]
fn test_slow_server_answers_emulated_moves_in_order() {
    let mut h = Harness::at_centre();
    h.user("n");
    h.user("s");
    h.drain();

    h.session.advance_clock(h.start + Duration::from_millis(1000));
    assert_eq!(rooms(&h.drain()), vec![("North Arm", true)]);
    assert_eq!(h.state().coordinator().pending_len(), 2);

    h.server(&room_text("North Arm", "Exits: south."));
    let events = h.drain();
    assert!(desyncs(&events).is_empty());
    assert_eq!(h.state().coordinator().pending_len(), 1);

    h.server(&room_text("Centre", "Exits: north, [east](gate), south."));
    let events = h.drain();
    assert!(desyncs(&events).is_empty());
    assert_eq!(h.state().coordinator().pending_len(), 0);
    assert_eq!(
        h.state().coordinator().last_confirmed(),
        Some(Coordinate::new(0, 0, 0))
    );
}

#[test]
fn test_timer_after_confirmation_is_stale() {
    let mut h = Harness::at_centre();
    h.user("n");
    h.server(&room_text("North Arm", "Exits: south."));
    h.drain();

    h.session.advance_clock(h.start + Duration::from_secs(5));
    assert!(rooms(&h.drain()).is_empty());
}

#[test]
fn test_going_offline_emulates_queue() {
    let mut h = Harness::at_centre();
    h.user("n");
    h.drain();

    h.session.set_connection(ConnectionState::Offline);
    assert_eq!(rooms(&h.drain()), vec![("North Arm", true)]);
    assert_eq!(h.state().connection(), ConnectionState::Offline);

    h.user("look");
    let events = h.drain();
    assert!(sent(&events).is_empty());
    assert!(shown(&events).contains("offline"));
}

#[test]
fn test_reset_skips_next_check() {
    let mut h = Harness::at_centre();
    h.session.reset();
    h.user("n");
    h.server(&room_text("East Arm", "Exits: west."));
    assert!(desyncs(&h.drain()).is_empty());
}

// --- Exits and doors ---

#[test]
fn test_standalone_exits_report_door_change() {
    let mut h = Harness::at_centre();
    h.server("Exits: north, (east), south.\n");
    let events = h.drain();

    let changes: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::DoorStateChanged {
                direction,
                exit_flags,
                ..
            } => Some((*direction, exit_flags.is_closed_door())),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![(ExitDir::East, false)]);
    // The door keeps its name across the update.
    assert_eq!(h.state().exits().door_name(ExitDir::East), Some("gate"));
}

#[test]
fn test_room_without_exits_keeps_door_names() {
    let mut h = Harness::at_centre();
    h.server(&format!("{GREEN}Centre{RESET}\nYou are in the Centre.\n*#>"));
    h.drain();
    assert_eq!(h.state().exits().door_name(ExitDir::East), Some("gate"));

    h.user("_open e");
    assert_eq!(sent(&h.drain()), vec!["open gate"]);

    // A later exits line for the same room changes nothing.
    h.server("Exits: north, [east](gate), south.\n");
    let events = h.drain();
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, CoreEvent::DoorStateChanged { .. }))
    );
}

#[test]
fn test_unmapped_room_without_exits_keeps_previous() {
    let mut h = Harness::at_centre();
    h.user("_name north hatch");
    h.server(&format!("{GREEN}Nowhere{RESET}\nA blank place.\n*#>"));
    h.drain();
    assert_eq!(h.state().coordinator().last_confirmed(), None);
    assert_eq!(h.state().exits().door_name(ExitDir::North), Some("hatch"));
}

#[test]
fn test_door_command_and_variables() {
    let mut h = Harness::at_centre();
    h.user("_open e");
    h.user("unlock $$DOOR_E$$");
    h.user("_knock n");
    assert_eq!(sent(&h.drain()), vec!["open gate", "unlock gate", "knock exit n"]);
}

#[test]
fn test_declined_command_is_forwarded() {
    let mut h = Harness::at_centre();
    h.user("_open");
    h.user("_open sideways");
    h.user("say hello");
    assert_eq!(sent(&h.drain()), vec!["_open", "_open sideways", "say hello"]);
}

// --- Built-in commands ---

#[test]
fn test_help_lists_commands() {
    let mut h = Harness::at_centre();
    h.user("_help");
    let text = shown(&h.drain());
    assert!(text.contains("_back"));
    assert!(text.contains("_doorflag"));
    assert!(text.contains("(min. _bas)"));

    h.user("_h exitf");
    assert!(shown(&h.drain()).starts_with("exitflag <flag> <dir>"));
}

#[test]
fn test_prefix_change() {
    let mut h = Harness::at_centre();
    h.user("_prefix #");
    h.drain();
    assert_eq!(h.state().prefix(), '#');

    h.user("#exits");
    assert_eq!(shown(&h.drain()), "Exits: north, [east](gate), south.\n");

    h.user("_exits");
    assert_eq!(sent(&h.drain()), vec!["_exits"]);

    h.user("#prefix x");
    assert_eq!(sent(&h.drain()), vec!["#prefix x"]);
    assert_eq!(h.state().prefix(), '#');
}

#[test]
fn test_back_and_sync() {
    let mut h = Harness::at_centre();
    h.user("n");
    h.user("s");
    h.user("_back");
    assert_eq!(h.state().coordinator().pending_len(), 1);

    h.user("_sy");
    assert_eq!(h.state().coordinator().pending_len(), 0);
    assert_eq!(h.state().coordinator().last_confirmed(), None);
    assert!(h.state().timers().is_empty());
}

#[test]
fn test_name_and_flags() {
    let mut h = Harness::at_centre();
    h.user("_name north hatch");
    assert_eq!(h.state().exits().door_name(ExitDir::North), Some("hatch"));

    h.user("_doorf needkey north");
    h.user("_exitf road south");
    let events = h.drain();
    let changes: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::DoorStateChanged {
                direction,
                exit_flags,
                door_flags,
            } => Some((*direction, exit_flags.is_road(), door_flags.needs_key())),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![(ExitDir::North, false, true), (ExitDir::South, true, false)]
    );

    h.user("_open n");
    assert_eq!(sent(&h.drain()), vec!["open hatch"]);
}

#[test]
fn test_custom_command() {
    fn whereami(state: &mut SessionState, _: &Invocation<'_, SessionState>) -> bool {
        let at = state.coordinator().last_confirmed();
        state.send_to_user(format!("{at:?}\n"));
        true
    }

    let mut h = Harness::at_centre();
    h.session
        .register_command("whereami", 2, whereami, |_| "where am I".to_string())
        .unwrap();
    h.user("_wh");
    assert_eq!(shown(&h.drain()), "Some(Coordinate { x: 0, y: 0, z: 0 })\n");

    assert_eq!(
        h.session
            .register_command("help", 1, whereami, |_| String::new()),
        Err(RegistryError::Duplicate("help".to_string()))
    );
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = Config::default();
    config.parser.command_prefix = 'a';
    let result = Session::new(&config, test_map(), Instant::now());
    assert!(matches!(
        result,
        Err(SessionError::Config(ConfigError::InvalidPrefix('a')))
    ));
}
