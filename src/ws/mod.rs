//! WebSocket Module - Live delivery of notifications
//!
//! - HTTP -> WebSocket upgrade for authenticated users
//! - One reader and one writer task per connection
//! - `UserMap` routing internal signals to the writer of an online user

pub mod connection;
pub mod usermap;

pub use connection::handle_socket;

use crate::{core::AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Idle time after which a silent connection is closed
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;
/// Minimum delay between two frames read from a client
pub const RATE_LIMITER_MILLIS: u64 = 10;

/// Upgrades the request, the user comes from the authentication middleware
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Response {
    let user_id = current_user.user_id;
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}
