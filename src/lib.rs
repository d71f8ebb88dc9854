pub mod commands;
pub mod config;
pub mod delivery;
pub mod error;
pub mod filter;
pub mod forward;
pub mod platform;
pub mod registry;
pub mod server;
pub mod shutdown;
pub mod webhook;
