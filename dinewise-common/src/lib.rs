//! # Dinewise Common Library
//!
//! Shared code for Dinewise microservices including:
//! - Error type and result alias
//! - TOML configuration loading
//! - Logging initialization
//! - Clock abstraction for date-keyed state
//! - Database pool creation and schema initialization

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
