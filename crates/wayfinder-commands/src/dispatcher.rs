//! Routes prefixed user lines to registered commands.

use crate::registry::{CommandRegistry, Invocation, Lookup};

/// What the dispatcher needs from the state it hands to commands.
pub trait DispatchContext {
    /// Character that marks a line as a special command.
    fn command_prefix(&self) -> char;
}

/// Outcome of [`SpecialCommandDispatcher::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A command consumed the line.
    Handled,
    /// Not a special command; the caller should parse the line normally.
    NotSpecial,
}

/// Dispatches `<prefix><command> [args]` lines to a [`CommandRegistry`].
pub struct SpecialCommandDispatcher<C> {
    registry: CommandRegistry<C>,
}

impl<C: DispatchContext> SpecialCommandDispatcher<C> {
    pub fn new(registry: CommandRegistry<C>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CommandRegistry<C> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry<C> {
        &mut self.registry
    }

    /// Tries to run `line` as a special command. Unknown and ambiguous
    /// commands, and commands that decline their arguments, all come back
    /// as [`Dispatch::NotSpecial`].
    pub fn dispatch(&self, ctx: &mut C, line: &str) -> Dispatch {
        let Some(rest) = line.strip_prefix(ctx.command_prefix()) else {
            return Dispatch::NotSpecial;
        };
        let rest = rest.trim();
        let (token, args) = match rest.split_once(char::is_whitespace) {
            Some((token, args)) => (token, args.trim()),
            None => (rest, ""),
        };
        let token = token.to_lowercase();

        let entry = match self.registry.lookup(&token) {
            Lookup::Found(entry) => entry,
            Lookup::Ambiguous(names) => {
                tracing::debug!(token = %token, ?names, "ambiguous command");
                return Dispatch::NotSpecial;
            }
            Lookup::NotFound => return Dispatch::NotSpecial,
        };

        let invocation = Invocation {
            name: entry.name(),
            args,
            registry: &self.registry,
        };
        if entry.run(ctx, &invocation) {
            Dispatch::Handled
        } else {
            tracing::debug!(command = entry.name(), args, "command declined its arguments");
            Dispatch::NotSpecial
        }
    }
}

impl<C: DispatchContext> Default for SpecialCommandDispatcher<C> {
    fn default() -> Self {
        Self::new(CommandRegistry::new())
    }
}
