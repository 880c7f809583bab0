//! Application state management for the Pokedex CLI
//!
//! This module contains the REPL session state (pagination cursors and caught
//! Pokemon) and the handlers that run each registered command.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::commands::{clean_input, CommandKind, CommandRegistry};
use crate::data::{ApiError, LocationAreaPage, PokeApiClient, Pokemon};

/// Errors a command handler can produce
#[derive(Debug, Error)]
pub enum AppError {
    /// The API request or decoding failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Writing to the output failed
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// A failed command, tagged with the name it was invoked as
#[derive(Debug, Error)]
#[error("Error executing command {name:?}: {source}")]
pub struct CommandError {
    pub name: String,
    #[source]
    pub source: AppError,
}

/// A Pokemon in the player's Pokedex
#[derive(Debug, Clone)]
pub struct CaughtPokemon {
    pub pokemon: Pokemon,
    pub caught_at: DateTime<Local>,
}

/// REPL session state
pub struct App {
    /// API client; owns the shared response cache
    client: PokeApiClient,
    /// Cursor for `map`; `None` reads the first page
    next_page: Option<String>,
    /// Cursor for `mapb`
    previous_page: Option<String>,
    /// Caught Pokemon keyed by name
    pokedex: BTreeMap<String, CaughtPokemon>,
    /// Rolls below this value catch the Pokemon
    catch_difficulty: u32,
    /// Source of catch rolls
    rng: StdRng,
    /// Flag indicating the REPL should stop
    pub should_quit: bool,
}

impl App {
    /// Creates a new session using `client` for all API access
    pub fn new(client: PokeApiClient, catch_difficulty: u32) -> Self {
        Self::with_rng(client, catch_difficulty, StdRng::from_entropy())
    }

    /// Creates a new session with a specific random number generator
    pub fn with_rng(client: PokeApiClient, catch_difficulty: u32, rng: StdRng) -> Self {
        Self {
            client,
            next_page: None,
            previous_page: None,
            pokedex: BTreeMap::new(),
            catch_difficulty,
            rng,
            should_quit: false,
        }
    }

    /// Caught Pokemon, ordered by name
    pub fn pokedex(&self) -> &BTreeMap<String, CaughtPokemon> {
        &self.pokedex
    }

    /// Records a Pokemon as caught now
    pub fn record_catch(&mut self, pokemon: Pokemon) {
        let entry = CaughtPokemon {
            pokemon,
            caught_at: Local::now(),
        };
        self.pokedex.insert(entry.pokemon.name.clone(), entry);
    }

    /// Parses and runs one line of input
    ///
    /// Blank lines are ignored and unknown commands print `Unknown command`.
    /// Handler failures are returned tagged with the command name; the session
    /// stays usable afterwards.
    pub async fn handle_line<W: Write>(
        &mut self,
        registry: &CommandRegistry,
        line: &str,
        out: &mut W,
    ) -> Result<(), CommandError> {
        let words = clean_input(line);
        let Some((name, args)) = words.split_first() else {
            return Ok(());
        };

        let result = match registry.get(name) {
            Some(command) => {
                debug!(command = command.name, ?args, "dispatching");
                self.execute(command.kind, registry, args, out).await
            }
            None => writeln!(out, "Unknown command").map_err(AppError::from),
        };

        result.map_err(|source| CommandError {
            name: name.clone(),
            source,
        })
    }

    /// Runs the handler for `kind`
    pub async fn execute<W: Write>(
        &mut self,
        kind: CommandKind,
        registry: &CommandRegistry,
        args: &[String],
        out: &mut W,
    ) -> Result<(), AppError> {
        match kind {
            CommandKind::Help => self.command_help(registry, out),
            CommandKind::Exit => self.command_exit(out),
            CommandKind::Map => self.command_map(out).await,
            CommandKind::MapBack => self.command_map_back(out).await,
            CommandKind::Explore => self.command_explore(args.first(), out).await,
            CommandKind::Catch => self.command_catch(args.first(), out).await,
            CommandKind::Inspect => self.command_inspect(args.first(), out),
            CommandKind::Pokedex => self.command_pokedex(out),
            CommandKind::Cache => self.command_cache(out),
        }
    }

    fn command_help<W: Write>(&self, registry: &CommandRegistry, out: &mut W) -> Result<(), AppError> {
        writeln!(out)?;
        writeln!(out, "Welcome to the Pokedex!")?;
        writeln!(out, "Usage:")?;
        writeln!(out)?;
        for command in registry.iter() {
            if command.args.is_empty() {
                writeln!(out, "{}: {}", command.name, command.description)?;
            } else {
                writeln!(out, "{} {}: {}", command.name, command.args, command.description)?;
            }
        }
        writeln!(out)?;
        Ok(())
    }

    fn command_exit<W: Write>(&mut self, out: &mut W) -> Result<(), AppError> {
        writeln!(out, "Closing the Pokedex... Goodbye!")?;
        self.should_quit = true;
        Ok(())
    }

    async fn command_map<W: Write>(&mut self, out: &mut W) -> Result<(), AppError> {
        let page = self.client.location_areas(self.next_page.as_deref()).await?;
        self.show_page(page, out)
    }

    async fn command_map_back<W: Write>(&mut self, out: &mut W) -> Result<(), AppError> {
        let Some(url) = self.previous_page.clone() else {
            writeln!(out, "No previous locations available.")?;
            return Ok(());
        };
        let page = self.client.location_areas(Some(url.as_str())).await?;
        self.show_page(page, out)
    }

    /// Moves the cursors to `page` and prints its location areas
    ///
    /// After the last page `next` is null, so the following `map` starts over
    /// from the first page.
    fn show_page<W: Write>(&mut self, page: LocationAreaPage, out: &mut W) -> Result<(), AppError> {
        self.next_page = page.next;
        self.previous_page = page.previous;

        writeln!(out)?;
        for location in &page.results {
            writeln!(out, " - {}", location.name)?;
        }
        writeln!(out)?;
        Ok(())
    }

    async fn command_explore<W: Write>(&mut self, area: Option<&String>, out: &mut W) -> Result<(), AppError> {
        let Some(area) = area else {
            writeln!(out, "Please provide a location area name to explore.")?;
            return Ok(());
        };

        let location = match self.client.location_area(area).await {
            Ok(location) => location,
            Err(ApiError::NotFound(_)) => {
                writeln!(out, "{} is not a valid location area", area)?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        writeln!(out)?;
        writeln!(out, "Exploring {}...", area)?;
        writeln!(out, "Found Pokemon:")?;
        for encounter in &location.pokemon_encounters {
            writeln!(out, " - {}", encounter.pokemon.name)?;
        }
        writeln!(out)?;
        Ok(())
    }

    async fn command_catch<W: Write>(&mut self, name: Option<&String>, out: &mut W) -> Result<(), AppError> {
        let Some(name) = name else {
            writeln!(out, "Please provide a name of the pokemon to catch.")?;
            return Ok(());
        };

        let pokemon = match self.client.pokemon(name).await {
            Ok(pokemon) => pokemon,
            Err(ApiError::NotFound(_)) => {
                writeln!(out, "{} is not a valid pokemon name", name)?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        writeln!(out)?;
        writeln!(out, "Throwing a Pokeball at {}...", pokemon.name)?;

        let bound = catch_roll_bound(pokemon.base_experience);
        let roll = self.rng.gen_range(0..bound);
        debug!(pokemon = %pokemon.name, roll, bound, difficulty = self.catch_difficulty, "catch roll");

        if is_caught(roll, self.catch_difficulty) {
            writeln!(out, "{} was caught!", pokemon.name)?;
            writeln!(out, "You may now inspect it with the inspect command.")?;
            self.record_catch(pokemon);
        } else {
            writeln!(out, "{} escaped!", pokemon.name)?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn command_inspect<W: Write>(&self, name: Option<&String>, out: &mut W) -> Result<(), AppError> {
        let Some(name) = name else {
            writeln!(out, "Please provide a name of the pokemon to inspect.")?;
            return Ok(());
        };
        let Some(caught) = self.pokedex.get(name) else {
            writeln!(out, "you have not caught that pokemon")?;
            return Ok(());
        };

        let pokemon = &caught.pokemon;
        writeln!(out, "Name: {}", pokemon.name)?;
        writeln!(out, "Height: {}", pokemon.height)?;
        writeln!(out, "Weight: {}", pokemon.weight)?;
        writeln!(out, "Stats:")?;
        for stat in &pokemon.stats {
            writeln!(out, "  -{}: {}", stat.stat.name, stat.base_stat)?;
        }
        writeln!(out, "Types:")?;
        for slot in &pokemon.types {
            writeln!(out, "  - {}", slot.kind.name)?;
        }
        writeln!(out, "Caught: {}", caught.caught_at.format("%Y-%m-%d %H:%M:%S"))?;
        Ok(())
    }

    fn command_pokedex<W: Write>(&self, out: &mut W) -> Result<(), AppError> {
        if self.pokedex.is_empty() {
            writeln!(out, "Your Pokedex is empty.")?;
            return Ok(());
        }
        writeln!(out, "Your Pokedex:")?;
        for name in self.pokedex.keys() {
            writeln!(out, " - {}", name)?;
        }
        Ok(())
    }

    fn command_cache<W: Write>(&self, out: &mut W) -> Result<(), AppError> {
        let cache = self.client.cache();
        writeln!(
            out,
            "Cached responses: {} (swept every {}s)",
            cache.len(),
            cache.interval().as_secs()
        )?;
        Ok(())
    }
}

/// Upper bound (exclusive) of the catch roll for a Pokemon
///
/// Higher base experience means a wider roll range and a harder catch.
pub fn catch_roll_bound(base_experience: Option<u32>) -> u32 {
    base_experience.unwrap_or(0).max(1)
}

/// Whether a roll catches the Pokemon
pub fn is_caught(roll: u32, difficulty: u32) -> bool {
    roll < difficulty
}
