//! Error and logging plumbing shared by the syntax, rewrite, fmt and CLI crates.

pub mod error;
pub mod log;

pub use error::Error;
