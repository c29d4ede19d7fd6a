//! Built-in special commands.

use wayfinder_commands::{
    CommandRegistry, DoorAction, Invocation, Lookup, RegistryError, door_command,
    set_door_name, toggle_door_flag, toggle_exit_flag,
};
use wayfinder_config::validate_prefix;
use wayfinder_coords::ExitDir;
use wayfinder_parser::{DoorFlag, ExitFlag};

use crate::events::CoreEvent;
use crate::session::SessionState;

type Ctx = SessionState;

/// Registers every built-in command.
pub fn register_builtins(registry: &mut CommandRegistry<Ctx>) -> Result<(), RegistryError> {
    registry.register("help", 1, help, |_| {
        "help [command]: list special commands, or describe one".to_string()
    })?;
    registry.register("back", 1, back, |_| {
        "back: forget the most recently queued move".to_string()
    })?;
    registry.register("sync", 2, sync, |_| {
        "sync: forget the current position and wait for the next room".to_string()
    })?;
    registry.register("prefix", 3, prefix, |_| {
        "prefix [char]: show or change the special command prefix".to_string()
    })?;
    registry.register("exits", 2, exits, |_| {
        "exits: show the exits of the current room".to_string()
    })?;
    registry.register("name", 3, name, |_| {
        "name <dir> <door>: name the door in a direction (empty name clears)".to_string()
    })?;
    registry.register("doorflag", 5, door_flag, |_| {
        let names: Vec<&str> = DoorFlag::ALL.iter().map(|f| f.name()).collect();
        format!("doorflag <flag> <dir>: toggle a door flag ({})", names.join(", "))
    })?;
    registry.register("exitflag", 5, exit_flag, |_| {
        let names: Vec<&str> = ExitFlag::ALL.iter().map(|f| f.name()).collect();
        format!("exitflag <flag> <dir>: toggle an exit flag ({})", names.join(", "))
    })?;

    for action in DoorAction::ALL {
        registry.register(
            action.command_name(),
            action.min_abbreviation(),
            move |state: &mut Ctx, inv: &Invocation<'_, Ctx>| door(state, inv, action),
            move |name| format!("{name} <dir>: {} the door in a direction", action.verb()),
        )?;
    }
    Ok(())
}

/// The single direction argument of `inv`, if that is all there is.
fn single_direction(inv: &Invocation<'_, Ctx>) -> Option<ExitDir> {
    let mut words = inv.arg_words();
    let dir = ExitDir::parse(words.next()?)?;
    words.next().is_none().then_some(dir)
}

fn help(state: &mut Ctx, inv: &Invocation<'_, Ctx>) -> bool {
    let text = match inv.arg_words().next() {
        Some(topic) => {
            let topic = topic.trim_start_matches(state.prefix());
            match inv.registry.lookup(topic) {
                Lookup::Found(entry) => format!("{}\n", entry.help()),
                _ => format!("No special command '{topic}'.\n"),
            }
        }
        None => {
            let prefix = state.prefix();
            let mut text = format!("Special commands (prefix '{prefix}'):\n");
            for entry in inv.registry.entries() {
                text.push_str(&format!(
                    "  {prefix}{:<10} (min. {prefix}{})\n",
                    entry.name(),
                    entry.abbreviation()
                ));
            }
            text
        }
    };
    state.send_to_user(text);
    true
}

fn back(state: &mut Ctx, _: &Invocation<'_, Ctx>) -> bool {
    let text = match state.coordinator.pop_last() {
        Some(mv) => format!("Forgot queued move {}.\n", mv.direction),
        None => "No queued moves.\n".to_string(),
    };
    state.send_to_user(text);
    true
}

fn sync(state: &mut Ctx, _: &Invocation<'_, Ctx>) -> bool {
    state.reset_movement();
    state.send_to_user("Position forgotten; waiting for the next room.\n");
    true
}

fn prefix(state: &mut Ctx, inv: &Invocation<'_, Ctx>) -> bool {
    let mut chars = inv.args.chars();
    match (chars.next(), chars.next()) {
        (None, _) => {
            let current = state.prefix();
            state.send_to_user(format!("Special command prefix is '{current}'.\n"));
            true
        }
        (Some(c), None) if validate_prefix(c).is_ok() => {
            state.set_prefix(c);
            tracing::info!(prefix = %c, "command prefix changed");
            state.send_to_user(format!("Special command prefix is now '{c}'.\n"));
            true
        }
        _ => false,
    }
}

fn exits(state: &mut Ctx, _: &Invocation<'_, Ctx>) -> bool {
    let line = state.exits().to_exits_line();
    state.send_to_user(format!("{line}\n"));
    true
}

fn name(state: &mut Ctx, inv: &Invocation<'_, Ctx>) -> bool {
    let (dir_word, door) = inv
        .args
        .split_once(char::is_whitespace)
        .unwrap_or((inv.args, ""));
    let Some(dir) = ExitDir::parse(dir_word) else {
        return false;
    };
    if !set_door_name(state.exits_mut(), dir, door) {
        return false;
    }
    let text = match state.exits().door_name(dir) {
        Some(door) => format!("Door {dir} is now called '{door}'.\n"),
        None => format!("Door {dir} has no name.\n"),
    };
    state.send_to_user(text);
    true
}

fn flag_args<'a>(inv: &'a Invocation<'_, Ctx>) -> Option<(&'a str, ExitDir)> {
    let mut words = inv.arg_words();
    let flag = words.next()?;
    let dir = ExitDir::parse(words.next()?)?;
    words.next().is_none().then_some((flag, dir))
}

fn door_flag(state: &mut Ctx, inv: &Invocation<'_, Ctx>) -> bool {
    let Some((flag, dir)) = flag_args(inv) else {
        return false;
    };
    let Some(flag) = DoorFlag::parse(flag) else {
        return false;
    };
    let Some(door_flags) = toggle_door_flag(state.exits_mut(), flag, dir) else {
        return false;
    };
    let exit_flags = state.exits().flags(dir);
    let set = if door_flags.contains(flag.bits()) { "set" } else { "cleared" };
    state.send_to_user(format!("Door flag {} {set} on {dir}.\n", flag.name()));
    state.publish(CoreEvent::DoorStateChanged {
        direction: dir,
        exit_flags,
        door_flags,
    });
    true
}

fn exit_flag(state: &mut Ctx, inv: &Invocation<'_, Ctx>) -> bool {
    let Some((flag, dir)) = flag_args(inv) else {
        return false;
    };
    let Some(flag) = ExitFlag::parse(flag) else {
        return false;
    };
    let Some(exit_flags) = toggle_exit_flag(state.exits_mut(), flag, dir) else {
        return false;
    };
    let door_flags = state.exits().door_flags(dir);
    let set = if exit_flags.contains(flag.bits()) { "set" } else { "cleared" };
    state.send_to_user(format!("Exit flag {} {set} on {dir}.\n", flag.name()));
    state.publish(CoreEvent::DoorStateChanged {
        direction: dir,
        exit_flags,
        door_flags,
    });
    true
}

fn door(state: &mut Ctx, inv: &Invocation<'_, Ctx>, action: DoorAction) -> bool {
    let Some(dir) = single_direction(inv) else {
        return false;
    };
    match door_command(action, dir, state.exits()) {
        Some(command) => {
            state.send_to_server(command);
            true
        }
        None => false,
    }
}
