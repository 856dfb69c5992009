//! hybridrag-core
//!
//! Shared domain types, the model/retrieval capability traits, the error
//! taxonomy, configuration loading and the plain-text document store used by
//! the retrieval pipeline crates.

#![deny(unused_variables)]

pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
