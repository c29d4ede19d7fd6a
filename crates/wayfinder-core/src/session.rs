//! The session: inbound queue, shared state, and generic input handling.
//!
//! [`SessionState`] is everything commands and text modes may touch; it is
//! also the context the special-command dispatcher hands to commands.
//! [`Session`] adds the pieces that drive it: the inbound queue, the text
//! mode, and the dispatcher.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use wayfinder_commands::{
    CommandHandler, CommandRegistry, Dispatch, DispatchContext, RegistryError,
    SpecialCommandDispatcher, expand_door_variables,
};
use wayfinder_config::Config;
use wayfinder_coords::{ALL_EXITS, ExitDir};
use wayfinder_movement::{
    ConnectionState, MapLookup, MoveError, MovementCoordinator, MovementOutcome,
};
use wayfinder_parser::{
    ConnectedRoomFields, ExitsFields, LightLevel, PromptFields, RoomObserved, Terrain,
};

use crate::builtin::register_builtins;
use crate::bus::{EventBus, EventSink};
use crate::error::SessionError;
use crate::events::{CoreEvent, InboundEvent};
use crate::mode::{ClassifyingMode, TextMode};
use crate::timers::TimerQueue;

const CANNOT_GO: &str = "Alas, you cannot go that way...";

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// State shared by text modes and special commands.
pub struct SessionState {
    prefix: char,
    move_failure_patterns: Vec<String>,
    pub(crate) coordinator: MovementCoordinator,
    map: Arc<dyn MapLookup>,
    prompt: PromptFields,
    exits: ExitsFields,
    connected: ConnectedRoomFields,
    bus: EventBus,
    timers: TimerQueue,
    now: Instant,
}

impl SessionState {
    fn new(config: &Config, map: Arc<dyn MapLookup>, now: Instant) -> Self {
        let connection = if config.movement.start_offline {
            ConnectionState::Offline
        } else {
            ConnectionState::Online
        };
        Self {
            prefix: config.parser.command_prefix,
            move_failure_patterns: config.parser.move_failure_patterns.clone(),
            coordinator: MovementCoordinator::new(
                config.movement.max_pending_moves,
                config.movement.offline_retry(),
                connection,
            ),
            map,
            prompt: PromptFields::default(),
            exits: ExitsFields::default(),
            connected: ConnectedRoomFields::default(),
            bus: EventBus::new(),
            timers: TimerQueue::new(),
            now,
        }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub(crate) fn set_prefix(&mut self, prefix: char) {
        self.prefix = prefix;
    }

    pub fn prompt(&self) -> &PromptFields {
        &self.prompt
    }

    pub fn exits(&self) -> &ExitsFields {
        &self.exits
    }

    pub(crate) fn exits_mut(&mut self) -> &mut ExitsFields {
        &mut self.exits
    }

    pub fn connected(&self) -> &ConnectedRoomFields {
        &self.connected
    }

    pub fn coordinator(&self) -> &MovementCoordinator {
        &self.coordinator
    }

    pub fn connection(&self) -> ConnectionState {
        self.coordinator.connection()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    // --- Output ---

    pub fn publish(&mut self, event: CoreEvent) {
        self.bus.publish(event);
    }

    pub fn send_to_user(&mut self, text: impl Into<String>) {
        self.publish(CoreEvent::SendToUser {
            text: text.into(),
            go_ahead: false,
        });
    }

    fn send_prompt_to_user(&mut self, prompt: &str) {
        self.publish(CoreEvent::SendToUser {
            text: prompt.to_string(),
            go_ahead: true,
        });
    }

    /// Sends `text` to the server, or tells the user it went nowhere.
    pub fn send_to_server(&mut self, text: impl Into<String>) {
        let text = text.into();
        match self.connection() {
            ConnectionState::Online => self.publish(CoreEvent::SendToServer(text)),
            ConnectionState::Offline => {
                tracing::debug!(%text, "offline, not sent");
                self.send_to_user(format!("You are offline; '{text}' was not sent.\n"));
            }
        }
    }

    // --- Movement ---

    /// Queues a move. Online the typed line (or the direction name) is sent
    /// to the server; offline the move is emulated.
    pub fn request_move(&mut self, dir: ExitDir, typed: Option<&str>) {
        match self.coordinator.enqueue_move(dir, self.now, &*self.map) {
            Ok(outcomes) => {
                if self.connection() == ConnectionState::Online {
                    let text = typed.unwrap_or(dir.name()).to_string();
                    self.publish(CoreEvent::SendToServer(text));
                }
                self.apply_outcomes(outcomes);
            }
            Err(err @ MoveError::QueueFull { .. }) => {
                self.send_to_user(format!("Move {dir} dropped: {err}.\n"));
            }
            Err(MoveError::CannotGo(_)) => self.send_to_user(format!("{CANNOT_GO}\n")),
        }
    }

    /// Drops every queued move and the confirmed position.
    pub fn reset_movement(&mut self) {
        self.coordinator.reset();
        self.timers.clear();
    }

    pub(crate) fn apply_outcomes(&mut self, outcomes: Vec<MovementOutcome>) {
        for outcome in outcomes {
            match outcome {
                MovementOutcome::Synthesized { room, coordinate } => {
                    let prompt = self.map.prompt_at(coordinate).unwrap_or_else(|| {
                        PromptFields::synthesize(LightLevel::Unknown, Terrain::Undefined)
                    });
                    self.show_synthesized_room(room, prompt);
                }
                MovementOutcome::Desync { expected, actual } => {
                    self.publish(CoreEvent::PositionDesync { expected, actual });
                }
                MovementOutcome::TimerArmed { token, deadline } => {
                    self.timers.schedule(token, deadline);
                }
                MovementOutcome::Refused(direction) => {
                    self.send_to_user(format!("{CANNOT_GO}\n"));
                    self.publish(CoreEvent::MoveFailed { direction });
                }
            }
        }
    }

    fn show_synthesized_room(&mut self, room: RoomObserved, prompt: PromptFields) {
        self.exits = room.exits.clone().unwrap_or_default();
        self.connected = room.connected.clone();
        self.send_to_user(room.render());
        self.publish(CoreEvent::RoomObserved(room));

        self.prompt = prompt.clone();
        self.send_prompt_to_user(&prompt.text);
        self.publish(CoreEvent::PromptObserved(prompt));
    }

    fn fill_door_names(&self, exits: &mut ExitsFields) {
        let Some(at) = self.coordinator.last_confirmed() else {
            return;
        };
        for dir in ALL_EXITS {
            let Some(field) = exits.field_mut(dir) else {
                continue;
            };
            if field.flags.is_door() && field.door_name.is_none() {
                field.door_name = self.map.door_name(at, dir);
            }
        }
    }

    // --- Classified server text ---

    /// A room block from the server.
    pub fn on_room(&mut self, mut room: RoomObserved) {
        let outcomes = self
            .coordinator
            .on_room_observed(&room, self.now, &*self.map);

        match room.exits.take() {
            Some(mut exits) => {
                self.fill_door_names(&mut exits);
                room.exits = Some(exits.clone());
                self.exits = exits;
            }
            // Exits unknown: the map's view of the room, else what we had.
            None => {
                if let Some(mapped) = self
                    .coordinator
                    .last_confirmed()
                    .and_then(|at| self.map.room_at(at))
                    .and_then(|mapped| mapped.exits)
                {
                    self.exits = mapped;
                }
            }
        }
        self.connected = room.connected.clone();
        self.publish(CoreEvent::RoomObserved(room));
        self.apply_outcomes(outcomes);
    }

    /// An exits line seen outside a room block: same room, fresh view.
    pub fn on_exits(&mut self, mut exits: ExitsFields, connected: ConnectedRoomFields) {
        exits.inherit_annotations(&self.exits);
        self.fill_door_names(&mut exits);

        for dir in ALL_EXITS {
            let before = self.exits.flags(dir);
            let after = exits.flags(dir);
            if before.is_door() != after.is_door() || before.is_closed_door() != after.is_closed_door() {
                self.publish(CoreEvent::DoorStateChanged {
                    direction: dir,
                    exit_flags: after,
                    door_flags: exits.door_flags(dir),
                });
            }
        }
        self.exits = exits;
        self.connected = connected;
    }

    pub fn on_prompt(&mut self, prompt: PromptFields) {
        self.prompt = prompt.clone();
        self.publish(CoreEvent::PromptObserved(prompt));
    }

    /// Narrative text. Recognised refusals drop the move in flight.
    pub fn on_narrative(&mut self, text: &str) {
        if !self
            .move_failure_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && text.contains(pattern.as_str()))
        {
            return;
        }
        let (failed, outcomes) = self.coordinator.on_move_failed(self.now);
        if let Some(mv) = failed {
            self.publish(CoreEvent::MoveFailed {
                direction: mv.direction,
            });
        }
        self.apply_outcomes(outcomes);
    }
}

impl DispatchContext for SessionState {
    fn command_prefix(&self) -> char {
        self.prefix
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("prefix", &self.prefix)
            .field("coordinator", &self.coordinator)
            .field("prompt", &self.prompt)
            .field("exits", &self.exits)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Single-threaded event loop around [`SessionState`].
pub struct Session {
    state: SessionState,
    mode: Box<dyn TextMode>,
    dispatcher: SpecialCommandDispatcher<SessionState>,
    inbound: VecDeque<InboundEvent>,
}

impl Session {
    /// A classifying session with the built-in commands registered.
    pub fn new(config: &Config, map: Arc<dyn MapLookup>, now: Instant) -> Result<Self, SessionError> {
        let mode = Box::new(ClassifyingMode::new(&config.parser.room_name_color));
        Self::with_mode(config, map, mode, now)
    }

    pub fn with_mode(
        config: &Config,
        map: Arc<dyn MapLookup>,
        mode: Box<dyn TextMode>,
        now: Instant,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry)?;
        tracing::info!(
            mode = mode.name(),
            commands = registry.len(),
            prefix = %config.parser.command_prefix,
            "session started"
        );
        Ok(Self {
            state: SessionState::new(config, map, now),
            mode,
            dispatcher: SpecialCommandDispatcher::new(registry),
            inbound: VecDeque::new(),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode_name(&self) -> &'static str {
        self.mode.name()
    }

    pub fn subscribe<S: EventSink + 'static>(&mut self, sink: S) {
        self.state.bus.subscribe(sink);
    }

    /// Adds a special command next to the built-ins.
    pub fn register_command<H, P>(
        &mut self,
        name: &str,
        min_len: usize,
        handler: H,
        help: P,
    ) -> Result<(), RegistryError>
    where
        H: CommandHandler<SessionState> + 'static,
        P: Fn(&str) -> String + 'static,
    {
        self.dispatcher
            .registry_mut()
            .register(name, min_len, handler, help)
    }

    // --- Inbound ---

    pub fn post(&mut self, event: InboundEvent) {
        self.inbound.push_back(event);
    }

    /// Handles queued events until the queue is empty.
    pub fn process_pending(&mut self) {
        while let Some(event) = self.inbound.pop_front() {
            self.handle(event);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.inbound.len()
    }

    /// Moves the clock to `now`, queues every timer that came due, and
    /// processes the queue.
    pub fn advance_clock(&mut self, now: Instant) {
        self.state.now = now;
        for token in self.state.timers.drain_due(now) {
            self.post(InboundEvent::TimerFired(token));
        }
        self.process_pending();
    }

    pub fn on_server_text(&mut self, chunk: &str) {
        self.post(InboundEvent::ServerText(chunk.to_string()));
        self.process_pending();
    }

    pub fn on_user_input(&mut self, line: &str) {
        self.post(InboundEvent::UserInput(line.to_string()));
        self.process_pending();
    }

    pub fn set_connection(&mut self, state: ConnectionState) {
        self.post(InboundEvent::Connection(state));
        self.process_pending();
    }

    /// The server stream ended: classifies any held-back line and closes an
    /// open room block.
    pub fn finish(&mut self) {
        self.process_pending();
        self.mode.finish(&mut self.state);
    }

    /// Forgets movement state and any half-classified text.
    pub fn reset(&mut self) {
        self.mode.reset();
        self.state.reset_movement();
    }

    fn handle(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::ServerText(chunk) => self.mode.on_server_text(&mut self.state, &chunk),
            InboundEvent::UserInput(line) => self.handle_user_input(&line),
            InboundEvent::TimerFired(token) => {
                let state = &mut self.state;
                let outcomes = state.coordinator.on_timer(token, state.now, &*state.map);
                state.apply_outcomes(outcomes);
            }
            InboundEvent::Connection(connection) => {
                let state = &mut self.state;
                let outcomes = state
                    .coordinator
                    .set_connection(connection, state.now, &*state.map);
                if connection == ConnectionState::Offline {
                    state.timers.clear();
                }
                state.apply_outcomes(outcomes);
            }
        }
    }

    fn handle_user_input(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        if self.dispatcher.dispatch(&mut self.state, line) == Dispatch::Handled {
            return;
        }

        let trimmed = line.trim();
        if !trimmed.is_empty()
            && !trimmed.contains(char::is_whitespace)
            && let Some(dir) = ExitDir::parse(trimmed)
        {
            self.state.request_move(dir, Some(line));
            return;
        }

        if let Some(expanded) = expand_door_variables(line, &self.state.exits) {
            self.state.send_to_server(expanded);
            return;
        }
        self.state.send_to_server(line);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode.name())
            .field("inbound", &self.inbound.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
