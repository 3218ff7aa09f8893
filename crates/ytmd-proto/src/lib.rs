//! Wire types, persisted settings and configuration shared by the deck plugin.

pub mod config;
pub mod platform;
pub mod protocol;
pub mod settings;
