//! Common utilities and shared types for UniVerse.
//!
//! This crate provides foundational components used across all UniVerse crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Validation**: Shared field rules for usernames, passwords and colors
//!
//! # Example
//!
//! ```no_run
//! use universe_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Listening on {}:{} ({id})", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod validation;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
