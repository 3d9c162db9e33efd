//! Request-admission gate for a resource API.
//!
//! Every inbound request passes, in order, through per-client rate
//! limiting, bearer-token authentication, and permission-scoped
//! authorization before the wrapped handler runs; handlers validate their
//! decoded payloads with the shared validator before touching domain
//! logic. Each stage either passes the request on unchanged or
//! short-circuits with a terminal response.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │               ADMISSION GATE                 │
//!   Request ──────┼─▶ rate limit ─▶ authenticate ─▶ authorize ───┼─▶ handler
//!                 │     429            401             401/403   │   (validates
//!                 │                                              │    payload)
//!                 └──────────────────────────────────────────────┘
//! ```
//!
//! Persistence, email, and the resource business rules live behind the
//! [`directory::UserDirectory`] collaborator boundary.

// Core subsystems
pub mod config;
pub mod directory;
pub mod gate;
pub mod http;
pub mod validator;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{load_config, GateConfig};
pub use directory::{InMemoryDirectory, User, UserDirectory};
pub use gate::Principal;
pub use http::GateServer;
pub use lifecycle::Shutdown;
