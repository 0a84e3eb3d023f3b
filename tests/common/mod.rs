#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use guestlist::config::Config;
use guestlist::core::{AppState, encode_jwt};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-only-used-in-tests";

/// Ids and phones of the users in `fixtures/users.sql`
pub const ALICE: (i64, &str) = (1, "9876543210");
pub const BOB: (i64, &str) = (2, "9123456780");
pub const CAROL: (i64, &str) = (3, "9000000003");

/// Builds the state with every external integration disabled
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    create_test_state_with(pool, test_config())
}

pub fn create_test_state_with(pool: SqlitePool, config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(pool, config))
}

pub fn test_config() -> Config {
    Config::local("sqlite::memory:", TEST_JWT_SECRET)
}

pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = guestlist::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Signed token for one of the fixture users
pub fn create_test_jwt(user: (i64, &str)) -> String {
    encode_jwt(user.0, user.1.to_string(), TEST_JWT_SECRET).expect("Failed to create JWT token")
}

/// Value of the Authorization header for a fixture user
pub fn bearer(user: (i64, &str)) -> String {
    format!("Bearer {}", create_test_jwt(user))
}

/// Serves `app` on a random local port, returns its base URL
pub async fn spawn_fake_api(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake api");
    let addr = listener.local_addr().expect("Fake api has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake api crashed");
    });
    format!("http://{addr}")
}

/// Polls `check` until it holds, side effects run on spawned tasks
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
