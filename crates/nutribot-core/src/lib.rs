//! nutribot-core
//!
//! Shared data model, collaborator traits, error type and configuration for
//! the food-query pipeline. The JSON food catalog in `catalog` doubles as the
//! in-memory food repository.

pub mod catalog;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
