//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use admission_gate::config::GateConfig;
use admission_gate::directory::{InMemoryDirectory, User, UserDirectory};
use admission_gate::http::GateServer;
use admission_gate::lifecycle::Shutdown;

/// Start a gate server on an ephemeral port.
///
/// The listener is bound before the serve task is spawned, so the
/// returned address accepts connections immediately.
pub async fn start_gate(
    config: GateConfig,
    directory: Arc<dyn UserDirectory>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = GateServer::new(config, directory);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Directory with the cast used across scenarios: an activated user with
/// both movie permissions, an unactivated user, and an activated user
/// with no permissions at all.
pub fn seeded_directory() -> Arc<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();
    directory.insert_user(
        "alice-token",
        User {
            id: 1,
            name: "alice".to_string(),
            activated: true,
        },
        &["movies:read", "movies:write"],
    );
    directory.insert_user(
        "bob-token",
        User {
            id: 2,
            name: "bob".to_string(),
            activated: false,
        },
        &["movies:read"],
    );
    directory.insert_user(
        "carol-token",
        User {
            id: 3,
            name: "carol".to_string(),
            activated: true,
        },
        &[],
    );
    Arc::new(directory)
}

/// Config with the limiter loose enough to stay out of the way.
pub fn relaxed_limit_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.rate_limit.requests_per_second = 1000.0;
    config.rate_limit.burst_size = 1000;
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
