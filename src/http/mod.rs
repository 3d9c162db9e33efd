//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (router construction, admission chain, serve loop)
//!     → [gate decides admission]
//!     → handlers.rs (decode, validate, respond)
//!     → response.rs (error and validation envelopes)
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use server::GateServer;
