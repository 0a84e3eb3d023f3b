//! Services module - HTTP handlers grouped by feature
//!
//! Every sub-module owns the endpoints of one feature. Handlers load what
//! they need through the repositories in `AppState`, enforce ownership and
//! delegate the guest rules to `crate::validation`.

pub mod auth;
pub mod event;
pub mod friend;
pub mod guest;
pub mod notification;
pub mod rsvp;
pub mod user;

// Re-exports
pub use auth::{request_otp, verify_otp};
pub use event::{create_event, get_event, list_my_events, publish_event, update_event, upload_flyer};
pub use friend::{add_friend, delete_friend, list_friends};
pub use guest::{add_guest, export_guests, list_guests};
pub use notification::{list_notifications, mark_all_read, mark_read};
pub use rsvp::{cancel_my_rsvp, get_my_rsvp, submit_rsvp};
pub use user::{get_me, update_me};

use crate::core::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
