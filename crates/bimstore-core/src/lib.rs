//! # bimstore-core
//!
//! Core crate for BIM Store. Contains the configuration schemas and the
//! unified error system shared by the converter, storage, API and CLI crates.
//!
//! This crate has **no** internal dependencies on other BIM Store crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
