//! Permission-scoped authorization middleware.
//!
//! Applied per route with `Router::route_layer`, after the authenticator
//! has attached a [`Principal`]. The checks form a one-way ladder: an
//! anonymous caller must authenticate, an unactivated account must
//! activate, and an activated account must hold the route's permission
//! code; a denial at any rung is terminal for the request.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::directory::UserDirectory;
use crate::gate::{AdmissionError, Principal};
use crate::observability::metrics;

/// Route-level permission requirement handed to the middleware as state.
#[derive(Clone)]
pub struct RequiredPermission {
    directory: Arc<dyn UserDirectory>,
    code: &'static str,
}

impl RequiredPermission {
    pub fn new(directory: Arc<dyn UserDirectory>, code: &'static str) -> Self {
        Self { directory, code }
    }
}

pub async fn require_permission_middleware(
    State(required): State<RequiredPermission>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AdmissionError> {
    // A route wired without the authenticator carries no principal;
    // treating that as anonymous fails closed.
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .unwrap_or(Principal::Anonymous);

    let user = match principal {
        Principal::Anonymous => return Err(AdmissionError::AuthenticationRequired),
        Principal::User(user) => user,
    };

    if !user.activated {
        tracing::warn!(user_id = user.id, "Unactivated account denied");
        return Err(AdmissionError::AccountNotActivated);
    }

    if !required.directory.user_has_permission(user.id, required.code).await {
        tracing::warn!(user_id = user.id, permission = required.code, "Permission denied");
        metrics::record_permission_denied();
        return Err(AdmissionError::PermissionDenied);
    }

    Ok(next.run(request).await)
}
