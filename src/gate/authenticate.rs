//! Bearer-token authentication middleware.
//!
//! Resolves the `Authorization` header to a [`Principal`] and attaches it
//! to the request's extensions for the authorizer and handlers. A missing
//! header is not an error: the request proceeds as anonymous and is only
//! rejected later if a route demands a permission. The directory lookup
//! performs I/O, so the authenticator holds no shared state of its own.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::directory::{hash_token, DirectoryError, UserDirectory};
use crate::gate::{AdmissionError, Principal};
use crate::observability::metrics;

pub async fn authenticate_middleware(
    State(directory): State<Arc<dyn UserDirectory>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = match resolve_principal(directory.as_ref(), request.headers()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(denial) => {
            metrics::record_auth_failure(match denial {
                AdmissionError::MalformedCredentials => "malformed",
                AdmissionError::InvalidCredentials => "invalid_token",
                _ => "store_unavailable",
            });
            denial.into_response()
        }
    };

    // The response depends on the credentials presented; caches must key
    // on the Authorization header.
    response
        .headers_mut()
        .insert(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

async fn resolve_principal(
    directory: &dyn UserDirectory,
    headers: &HeaderMap,
) -> Result<Principal, AdmissionError> {
    let header_value = match headers.get(header::AUTHORIZATION) {
        None => return Ok(Principal::Anonymous),
        Some(value) => value.to_str().map_err(|_| AdmissionError::MalformedCredentials)?,
    };

    let token = parse_bearer(header_value).ok_or(AdmissionError::MalformedCredentials)?;

    match directory.find_user_by_token(&hash_token(token)).await {
        Ok(user) => Ok(Principal::User(user)),
        Err(DirectoryError::NotFound) => Err(AdmissionError::InvalidCredentials),
        Err(DirectoryError::Unavailable(reason)) => {
            // A store outage must never read as a bad credential.
            tracing::error!(error = %reason, "User lookup failed");
            Err(AdmissionError::DirectoryUnavailable)
        }
    }
}

/// Extract the opaque token from a `Bearer <token>` header value.
///
/// The header must be exactly two space-separated parts with the literal
/// scheme word; anything else is malformed.
fn parse_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}
