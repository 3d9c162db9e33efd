//! Request admission subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client token bucket; 429 when exhausted)
//!     → authenticate.rs (bearer token → principal in request extensions)
//!     → authorize.rs (per-route permission gate; 401/403 on denial)
//!     → Pass to handler (validates its own payload)
//! ```
//!
//! # Design Decisions
//! - Stages compose as middleware; ordering is fixed once at router build
//! - Fail closed: a denial at any stage is terminal for the request
//! - Every denial is a deterministic function of request state

pub mod authenticate;
pub mod authorize;
pub mod principal;
pub mod rate_limit;

pub use authenticate::authenticate_middleware;
pub use authorize::{require_permission_middleware, RequiredPermission};
pub use principal::Principal;
pub use rate_limit::{rate_limit_middleware, RateLimiter};

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response;

/// Terminal admission outcomes, mapped onto HTTP statuses.
///
/// `RateLimited` signals "retry later" and is never a server fault;
/// `DirectoryUnavailable` is infrastructure trouble and must not be
/// mistaken for a bad credential.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("invalid or malformed authentication token")]
    MalformedCredentials,

    #[error("invalid authentication credentials")]
    InvalidCredentials,

    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    #[error("your user account must be activated to access this resource")]
    AccountNotActivated,

    #[error("your user account doesn't have the necessary permissions to access this resource")]
    PermissionDenied,

    #[error("the user store is currently unavailable")]
    DirectoryUnavailable,
}

impl AdmissionError {
    fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::MalformedCredentials | Self::InvalidCredentials | Self::AuthenticationRequired => {
                StatusCode::UNAUTHORIZED
            }
            Self::AccountNotActivated | Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::DirectoryUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let mut response = response::error_json(self.status(), &self.to_string());
        match self {
            Self::RateLimited => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            }
            Self::MalformedCredentials | Self::InvalidCredentials => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            _ => {}
        }
        response
    }
}
