//! Command registry: full names, minimum abbreviations, and handlers.
//!
//! The [`CommandRegistry`] maps lower-cased command names to
//! [`CommandHandler`] implementations. A typed token selects a command when
//! it is the full name, or when it is a prefix of exactly one name and at
//! least as long as that command's minimum abbreviation.

use std::collections::BTreeMap;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Registration failures. All of them abort startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command `{0}` is already registered")]
    Duplicate(String),

    #[error("command name must not be empty")]
    EmptyName,

    #[error("command `{0}` needs a minimum abbreviation of at least 1")]
    ZeroAbbreviation(String),
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// One dispatched command line, split into its parts.
pub struct Invocation<'a, C> {
    /// Full name of the matched command.
    pub name: &'a str,
    /// Everything after the name, trimmed.
    pub args: &'a str,
    /// The registry the command was found in, for commands that list others.
    pub registry: &'a CommandRegistry<C>,
}

impl<C> Invocation<'_, C> {
    /// Whitespace-separated arguments.
    pub fn arg_words(&self) -> impl Iterator<Item = &str> {
        self.args.split_whitespace()
    }
}

/// Trait for command handlers. Returning `false` means "not mine": the line
/// falls through to generic parsing.
pub trait CommandHandler<C> {
    fn run(&self, ctx: &mut C, invocation: &Invocation<'_, C>) -> bool;
}

/// Blanket implementation for closures.
impl<C, F> CommandHandler<C> for F
where
    F: Fn(&mut C, &Invocation<'_, C>) -> bool,
{
    fn run(&self, ctx: &mut C, invocation: &Invocation<'_, C>) -> bool {
        self(ctx, invocation)
    }
}

type HelpFn = Box<dyn Fn(&str) -> String>;

/// A registered command.
pub struct CommandEntry<C> {
    name: String,
    min_len: usize,
    handler: Box<dyn CommandHandler<C>>,
    help: HelpFn,
}

impl<C> CommandEntry<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// The shortest accepted abbreviation.
    pub fn abbreviation(&self) -> &str {
        let end = self
            .name
            .char_indices()
            .nth(self.min_len)
            .map_or(self.name.len(), |(i, _)| i);
        &self.name[..end]
    }

    pub fn help(&self) -> String {
        (self.help)(&self.name)
    }

    pub fn run(&self, ctx: &mut C, invocation: &Invocation<'_, C>) -> bool {
        self.handler.run(ctx, invocation)
    }
}

impl<C> std::fmt::Debug for CommandEntry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("min_len", &self.min_len)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Result of resolving a typed token.
#[derive(Debug)]
pub enum Lookup<'a, C> {
    Found(&'a CommandEntry<C>),
    /// More than one command accepts the token; names in sorted order.
    Ambiguous(Vec<&'a str>),
    NotFound,
}

/// Commands keyed by lower-cased full name.
pub struct CommandRegistry<C> {
    entries: BTreeMap<String, CommandEntry<C>>,
}

impl<C> CommandRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a command. `min_len` is the shortest prefix that selects it.
    pub fn register<H, P>(
        &mut self,
        name: &str,
        min_len: usize,
        handler: H,
        help: P,
    ) -> Result<(), RegistryError>
    where
        H: CommandHandler<C> + 'static,
        P: Fn(&str) -> String + 'static,
    {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if min_len == 0 {
            return Err(RegistryError::ZeroAbbreviation(name));
        }
        if self.entries.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!(command = %name, min_len, "registered command");
        self.entries.insert(
            name.clone(),
            CommandEntry {
                name,
                min_len,
                handler: Box::new(handler),
                help: Box::new(help),
            },
        );
        Ok(())
    }

    /// Resolve a typed token. An exact name always wins over abbreviations.
    pub fn lookup(&self, token: &str) -> Lookup<'_, C> {
        let token = token.to_lowercase();
        if token.is_empty() {
            return Lookup::NotFound;
        }
        if let Some(entry) = self.entries.get(&token) {
            return Lookup::Found(entry);
        }

        let candidates: Vec<&CommandEntry<C>> = self
            .entries
            .range(token.clone()..)
            .take_while(|(name, _)| name.starts_with(&token))
            .map(|(_, entry)| entry)
            .filter(|entry| token.chars().count() >= entry.min_len)
            .collect();

        match candidates.as_slice() {
            [] => Lookup::NotFound,
            [entry] => Lookup::Found(entry),
            many => Lookup::Ambiguous(many.iter().map(|e| e.name()).collect()),
        }
    }

    /// All commands in name order.
    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry<C>> {
        self.entries.values()
    }

    /// Help text for a full command name.
    pub fn help_for(&self, name: &str) -> Option<String> {
        self.entries.get(&name.to_lowercase()).map(CommandEntry::help)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
