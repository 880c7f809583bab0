//! Core data models for the Pokedex CLI
//!
//! This module contains the PokeAPI response types the application decodes,
//! trimmed to the fields that are displayed. Unknown fields are ignored.

pub mod pokeapi;

pub use pokeapi::{ApiError, PokeApiClient};

use serde::{Deserialize, Serialize};

/// A named link to another PokeAPI resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// One page of the location-area listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationAreaPage {
    /// Total number of location areas in the catalog
    pub count: u32,
    /// URL of the next page, null on the last page
    pub next: Option<String>,
    /// URL of the previous page, null on the first page
    pub previous: Option<String>,
    /// Location areas on this page
    pub results: Vec<NamedResource>,
}

/// A single location area and the Pokemon that can be found there
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationArea {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub pokemon_encounters: Vec<PokemonEncounter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonEncounter {
    pub pokemon: NamedResource,
}

/// A Pokemon species entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Experience gained for defeating it; also drives catch difficulty.
    /// Some entries report null.
    #[serde(default)]
    pub base_experience: Option<u32>,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
}

/// A base stat value such as hp or speed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonStat {
    pub base_stat: u32,
    pub stat: NamedResource,
}

/// An elemental type slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonType {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}
