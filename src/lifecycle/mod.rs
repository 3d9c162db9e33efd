//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     SIGINT → trigger broadcast → serve loop drains, sweep task exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
