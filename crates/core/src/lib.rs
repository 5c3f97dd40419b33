//! Core business logic for UniVerse.

pub mod services;

pub use services::*;
