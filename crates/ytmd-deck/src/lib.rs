//! Stream Deck plugin bridging keys and dials to YouTube Music Desktop.

pub mod actions;
pub mod args;
pub mod auth;
pub mod connector;
pub mod core;
pub mod formatter;
pub mod host;
pub mod inspector;
pub mod logging;
pub mod navigation;
pub mod playlist;
pub mod realtime;
pub mod registry;
pub mod remote;
pub mod rest;
pub mod streamdeck;
pub mod thumbnail;
pub mod watchdog;
