//! # Shared
//! Logging and failure helpers shared by the backup tooling.
//!

#![warn(missing_docs)]

mod failure;
mod logger;

pub use failure::{Failure, log_and_panic};
pub use logger::{LoggerError, init_logger};
