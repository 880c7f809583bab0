//! REPL command registry and input handling
//!
//! The registry is an ordinary value built at startup and handed to the
//! dispatch loop by reference. Registration order is the order `help` lists
//! commands in.

/// Identifies which handler a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    Exit,
    Map,
    MapBack,
    Explore,
    Catch,
    Inspect,
    Pokedex,
    Cache,
}

/// A single REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Word typed to invoke the command
    pub name: &'static str,
    /// Argument placeholder shown in help, empty if none
    pub args: &'static str,
    /// One-line description shown in help
    pub description: &'static str,
    /// Handler to run
    pub kind: CommandKind,
}

/// Lookup table of REPL commands
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in command
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("help", "", "Displays a help message", CommandKind::Help);
        registry.register("exit", "", "Exit the Pokedex", CommandKind::Exit);
        registry.register("map", "", "Displays the next page of location areas", CommandKind::Map);
        registry.register(
            "mapb",
            "",
            "Displays the previous page of location areas",
            CommandKind::MapBack,
        );
        registry.register(
            "explore",
            "<area>",
            "Lists the Pokemon found in a location area",
            CommandKind::Explore,
        );
        registry.register("catch", "<pokemon>", "Throws a Pokeball at a Pokemon", CommandKind::Catch);
        registry.register(
            "inspect",
            "<pokemon>",
            "Shows details of a caught Pokemon",
            CommandKind::Inspect,
        );
        registry.register("pokedex", "", "Lists every Pokemon you have caught", CommandKind::Pokedex);
        registry.register("cache", "", "Shows response cache statistics", CommandKind::Cache);
        registry
    }

    /// Adds a command, replacing any existing command with the same name
    pub fn register(
        &mut self,
        name: &'static str,
        args: &'static str,
        description: &'static str,
        kind: CommandKind,
    ) {
        let command = Command {
            name,
            args,
            description,
            kind,
        };
        match self.commands.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = command,
            None => self.commands.push(command),
        }
    }

    /// Looks up a command by name
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Iterates commands in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Splits a line of input into lowercase words, collapsing runs of whitespace
pub fn clean_input(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}
