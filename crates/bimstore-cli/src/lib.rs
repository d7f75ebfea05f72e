//! # bimstore-cli
//!
//! Command-line client for a BIM Store server. Downloads land in a local
//! store directory, where models can also be converted without the server.

pub mod client;
pub mod commands;
pub mod output;

pub use client::ServerClient;
