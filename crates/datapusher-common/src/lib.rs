//! Datapusher Common Library
//!
//! Shared pieces used by every datapusher workspace member:
//!
//! - **Logging**: process-wide `tracing` setup and the [`LogLevel`] vocabulary
//!   shared with task log sinks
//! - **Types**: the catalog data model (resources, datastore fields and their
//!   target types)
//!
//! # Example
//!
//! ```no_run
//! use datapusher_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod logging;
pub mod types;

// Re-export commonly used types
pub use logging::LogLevel;
pub use types::{Field, Resource, TargetType};
