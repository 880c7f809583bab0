//! Pokedex CLI Library
//!
//! This module exposes the cache, API client, command registry and session
//! state for use by the binary and in integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
