//! End-to-end admission scenarios for the gate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{json, Value};

use admission_gate::config::GateConfig;
use admission_gate::directory::{DirectoryError, TokenHash, User, UserDirectory};

mod common;

#[tokio::test]
async fn test_missing_credentials_are_rejected() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/v1/movies", addr))
        .send()
        .await
        .expect("gate unreachable");

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["error"],
        json!("you must be authenticated to access this resource")
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_unactivated_account_is_distinct_from_unauthenticated() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/v1/movies", addr))
        .header("Authorization", "Bearer bob-token")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["error"],
        json!("your user account must be activated to access this resource")
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_permission_is_denied() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    // carol is activated but holds no permission codes.
    let res = client
        .get(format!("http://{}/v1/movies", addr))
        .header("Authorization", "Bearer carol-token")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["error"],
        json!("your user account doesn't have the necessary permissions to access this resource")
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_and_malformed_tokens_get_challenge() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    for header in ["Bearer no-such-token", "Bearer", "Bearer a b", "Basic abc"] {
        let res = client
            .get(format!("http://{}/v1/movies", addr))
            .header("Authorization", header)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {:?}", header);
        assert_eq!(
            res.headers().get("www-authenticate").map(|v| v.as_bytes()),
            Some(b"Bearer".as_slice()),
            "header {:?}",
            header
        );
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_authorized_request_passes_through() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/v1/movies", addr))
        .header("Authorization", "Bearer alice-token")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("vary").map(|v| v.as_bytes()),
        Some(b"Authorization".as_slice())
    );
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["movies"], json!([]));

    shutdown.trigger();
}

#[tokio::test]
async fn test_healthcheck_open_to_anonymous_callers() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/v1/healthcheck", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], json!("available"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_rate_limit_burst_then_refill() {
    let mut config = GateConfig::default();
    config.rate_limit.requests_per_second = 2.0;
    config.rate_limit.burst_size = 4;

    let (addr, shutdown) = common::start_gate(config, common::seeded_directory()).await;
    let client = common::client();
    let url = format!("http://{}/v1/healthcheck", addr);

    for i in 0..4 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "request {} should be admitted", i);
    }

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key("retry-after"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], json!("rate limit exceeded"));

    // Two tokens refill over the next second.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
}

#[tokio::test]
async fn test_rate_limiting_outranks_authentication() {
    let mut config = GateConfig::default();
    config.rate_limit.requests_per_second = 0.01;
    config.rate_limit.burst_size = 1;

    let (addr, shutdown) = common::start_gate(config, common::seeded_directory()).await;
    let client = common::client();
    let url = format!("http://{}/v1/healthcheck", addr);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The bucket is spent, so even a garbage token never reaches the
    // authenticator.
    let res = client
        .get(&url)
        .header("Authorization", "Bearer garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    shutdown.trigger();
}

/// Directory double whose backing store is down.
struct OutageDirectory;

#[async_trait]
impl UserDirectory for OutageDirectory {
    async fn find_user_by_token(&self, _token_hash: &TokenHash) -> Result<User, DirectoryError> {
        Err(DirectoryError::Unavailable("connection refused".to_string()))
    }

    async fn user_has_permission(&self, _user_id: u64, _code: &str) -> bool {
        false
    }
}

#[tokio::test]
async fn test_store_outage_is_a_server_fault_not_bad_credentials() {
    let (addr, shutdown) =
        common::start_gate(common::relaxed_limit_config(), Arc::new(OutageDirectory)).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/v1/healthcheck", addr))
        .header("Authorization", "Bearer alice-token")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], json!("the user store is currently unavailable"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_movie_payload_returns_field_errors() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    let res = client
        .post(format!("http://{}/v1/movies", addr))
        .header("Authorization", "Bearer alice-token")
        .json(&json!({
            "title": "",
            "year": 1800,
            "runtime": -10,
            "genres": ["drama", "drama"],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    for field in ["title", "year", "runtime", "genres"] {
        assert!(body["error"][field].is_string(), "missing error for {}", field);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_valid_movie_payload_is_created() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    let res = client
        .post(format!("http://{}/v1/movies", addr))
        .header("Authorization", "Bearer alice-token")
        .json(&json!({
            "title": "Casablanca",
            "year": 1942,
            "runtime": 102,
            "genres": ["drama", "romance"],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], json!("Casablanca"));
    assert!(body["id"].is_string());

    shutdown.trigger();
}

#[tokio::test]
async fn test_list_query_parameters_are_validated() {
    let (addr, shutdown) = common::start_gate(common::relaxed_limit_config(), common::seeded_directory()).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/v1/movies?page=0&page_size=500&sort=rating", addr))
        .header("Authorization", "Bearer alice-token")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    for field in ["page", "page_size", "sort"] {
        assert!(body["error"][field].is_string(), "missing error for {}", field);
    }

    shutdown.trigger();
}
