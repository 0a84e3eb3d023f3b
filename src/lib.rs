//! Guestlist server library - event RSVPs with guest validation and de-duplication
//!
//! The binary in `main.rs` only loads the configuration, opens the database
//! and serves [`create_router`]; the integration tests build the same router.

pub mod core;
pub mod dtos;
pub mod entities;
pub mod export;
pub mod notify;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod validation;
pub mod ws;

pub use crate::core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{any, delete, get, patch, post},
};
use services::event::FLYER_MAX_BYTES;
use std::sync::Arc;

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    use crate::core::authentication_middleware;
    use ws::ws_handler;

    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes())
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/friends", configure_friend_routes(state.clone()))
        .nest("/events", configure_event_routes(state.clone()))
        .nest("/notifications", configure_notification_routes(state.clone()))
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .with_state(state)
}

/// Sign-in routes, the only ones without authentication
fn configure_auth_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/otp/request", post(request_otp))
        .route("/otp/verify", post(verify_otp))
}

fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

fn configure_friend_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_friends).post(add_friend))
        .route("/{friend_id}", delete(delete_friend))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Event, rsvp and guest list routes
fn configure_event_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_my_events).post(create_event))
        .route("/{event_id}", get(get_event).patch(update_event))
        .route("/{event_id}/publish", post(publish_event))
        .route(
            "/{event_id}/flyer",
            post(upload_flyer).layer(DefaultBodyLimit::max(FLYER_MAX_BYTES)),
        )
        .route("/{event_id}/rsvps", post(submit_rsvp))
        .route("/{event_id}/rsvps/me", get(get_my_rsvp).delete(cancel_my_rsvp))
        .route("/{event_id}/guests", get(list_guests).post(add_guest))
        .route("/{event_id}/guests/export", get(export_guests))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

fn configure_notification_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_notifications))
        .route("/{notification_id}/read", patch(mark_read))
        .route("/read-all", post(mark_all_read))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
