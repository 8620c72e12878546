//! ragcheck: setup verification for local RAG demo environments
//!
//! Checks that the configuration, compute device, embedding model, vector
//! store, local or remote generator and cache directories are in place,
//! and reports each result without stopping at the first problem.

pub mod assets;
pub mod checks;
pub mod config;
pub mod device;
pub mod embed;
pub mod error;
pub mod llm;
pub mod progress;
pub mod report;
pub mod store;
pub mod verify;

pub use config::Config;
pub use error::{Error, Result};
