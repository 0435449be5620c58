//! Database pool creation and schema

pub mod init;

pub use init::*;
