//! Resource handlers behind the gate.
//!
//! The movie endpoints stand in for the business logic the gate protects:
//! they decode their input, run it through the validator, and echo a
//! result instead of persisting it. What matters here is the admission
//! contract and the validation pass, not the resource itself.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::http::response;
use crate::validator::{self, Validator};

/// Liveness probe; open to any admitted caller.
pub async fn healthcheck() -> Response {
    Json(json!({
        "status": "available",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub runtime: i32,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// `POST /v1/movies`, behind the `movies:write` permission.
pub async fn create_movie(Json(input): Json<CreateMovieRequest>) -> Response {
    let mut v = Validator::new();
    v.check(validator::not_blank(&input.title), "title", "must be provided");
    v.check(
        validator::max_chars(&input.title, 500),
        "title",
        "must not be more than 500 characters long",
    );
    v.check(input.year >= 1888, "year", "must be 1888 or later");
    v.check(input.runtime > 0, "runtime", "must be a positive integer");
    v.check(
        validator::between(input.genres.len(), 1, 5),
        "genres",
        "must contain between 1 and 5 genres",
    );
    v.check(validator::unique(&input.genres), "genres", "must not contain duplicate values");

    if !v.valid() {
        return response::validation_failed(&v.errors);
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "id": Uuid::new_v4(),
            "title": input.title,
            "year": input.year,
            "runtime": input.runtime,
            "genres": input.genres,
        })),
    )
        .into_response()
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

fn default_sort() -> String {
    "id".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ListMoviesParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_sort")]
    pub sort: String,
}

const SORT_KEYS: [&str; 6] = ["id", "title", "year", "-id", "-title", "-year"];

/// `GET /v1/movies`, behind the `movies:read` permission.
pub async fn list_movies(Query(params): Query<ListMoviesParams>) -> Response {
    let mut v = Validator::new();
    v.check(
        validator::between(params.page, 1, 10_000_000),
        "page",
        "must be between 1 and 10 million",
    );
    v.check(
        validator::between(params.page_size, 1, 100),
        "page_size",
        "must be between 1 and 100",
    );
    v.check(
        validator::permitted(&params.sort.as_str(), &SORT_KEYS),
        "sort",
        "invalid sort value",
    );

    if !v.valid() {
        return response::validation_failed(&v.errors);
    }

    Json(json!({
        "movies": [],
        "page": params.page,
        "page_size": params.page_size,
        "sort": params.sort,
    }))
    .into_response()
}
