//! Event services - Creation, publication and editing of events

use crate::core::{AppError, AppState, require_creator};
use crate::dtos::{CreateEventDTO, CreateEventRequestDTO, EventDTO, UpdateEventDTO};
use crate::entities::{Event, EventStatus, NotificationKind, User};
use crate::notify::spawn_notify_user;
use crate::repositories::{Create, Read, Update};
use axum::{
    Extension,
    body::Bytes,
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Largest accepted flyer image
pub const FLYER_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Loads an event or fails with 404
pub(crate) async fn find_event(state: &AppState, event_id: i64) -> Result<Event, AppError> {
    state.event.read(&event_id).await?.ok_or_else(|| {
        warn!("Event {} not found", event_id);
        AppError::not_found("Event not found")
    })
}

/// Loads an event the user may see: published ones, or their own drafts
pub(crate) async fn find_visible_event(
    state: &AppState,
    event_id: i64,
    user: &User,
) -> Result<Event, AppError> {
    let event = find_event(state, event_id).await?;
    if !event.is_published() && event.creator_id != user.user_id {
        warn!("Draft event {} requested by user {}", event_id, user.user_id);
        return Err(AppError::not_found("Event not found"));
    }
    Ok(event)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateEventRequestDTO>,
) -> Result<(StatusCode, Json<EventDTO>), AppError> {
    debug!("Creating event");
    body.validate()?;

    let event = state
        .event
        .create(&CreateEventDTO::from_request(current_user.user_id, body))
        .await?;

    info!(event_id = event.event_id, "Event created as draft");
    Ok((StatusCode::CREATED, Json(EventDTO::from(event))))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_my_events(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<EventDTO>>, AppError> {
    let events = state.event.find_many_by_creator(&current_user.user_id).await?;
    debug!("Found {} events", events.len());
    Ok(Json(events.into_iter().map(EventDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
) -> Result<Json<EventDTO>, AppError> {
    let event = find_visible_event(&state, event_id, &current_user).await?;
    Ok(Json(EventDTO::from(event)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    Json(body): Json<UpdateEventDTO>,
) -> Result<Json<EventDTO>, AppError> {
    debug!("Updating event");
    // 1. Validate the body on its own, then against the stored schedule
    // 2. Hold the event lock so no rsvp lands between the capacity check and the write
    // 3. Capacity can not drop below the guests already confirmed
    body.validate()?;

    let event = find_event(&state, event_id).await?;
    require_creator(&event, &current_user)?;

    let _guard = state.event_locks.acquire(event_id).await;
    let event = find_event(&state, event_id).await?;
    body.validate_against(&event)?;

    if let Some(capacity) = body.capacity {
        if capacity < event.attendee_count {
            warn!(
                "Capacity {} below {} confirmed guests",
                capacity, event.attendee_count
            );
            return Err(AppError::conflict(
                "Capacity can not be lower than the number of confirmed guests",
            ));
        }
    }

    let update = UpdateEventDTO {
        name: body.name.map(|n| n.trim().to_string()),
        status: None,
        flyer_url: None,
        ..body
    };
    let updated = state.event.update(&event_id, &update).await?;

    info!("Event updated");
    Ok(Json(EventDTO::from(updated)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn publish_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
) -> Result<Json<EventDTO>, AppError> {
    let event = find_event(&state, event_id).await?;
    require_creator(&event, &current_user)?;

    if event.is_published() {
        debug!("Event already published");
        return Ok(Json(EventDTO::from(event)));
    }

    let published = state
        .event
        .update(
            &event_id,
            &UpdateEventDTO {
                status: Some(EventStatus::Published),
                ..Default::default()
            },
        )
        .await?;

    spawn_notify_user(
        &state,
        current_user.user_id,
        NotificationKind::EventPublished,
        format!("{} is now published", published.name),
    );

    info!("Event published");
    Ok(Json(EventDTO::from(published)))
}

#[instrument(skip(state, current_user, headers, body), fields(user_id = %current_user.user_id, size = body.len()))]
pub async fn upload_flyer(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EventDTO>, AppError> {
    debug!("Uploading flyer");
    // 1. Only the creator changes the flyer
    // 2. The body must be a non empty image of at most FLYER_MAX_BYTES
    // 3. Upload through the primary or fallback provider, 503 when both fail
    // 4. Store the public URL on the event
    let event = find_event(&state, event_id).await?;
    require_creator(&event, &current_user)?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
        .filter(|v| v.starts_with("image/"))
        .ok_or_else(|| {
            warn!("Flyer upload without an image content type");
            AppError::unsupported_media_type("Flyer must be an image")
        })?;

    if body.is_empty() {
        return Err(AppError::bad_request("Flyer image is empty"));
    }
    if body.len() > FLYER_MAX_BYTES {
        warn!("Flyer of {} bytes rejected", body.len());
        return Err(AppError::payload_too_large("Flyer can not exceed 5 MiB"));
    }

    let url = state
        .flyers
        .upload(event_id, body.to_vec(), &content_type)
        .await
        .map_err(|e| {
            warn!("Flyer upload failed: {}", e);
            AppError::service_unavailable("Flyer storage is unavailable")
        })?;

    let updated = state
        .event
        .update(
            &event_id,
            &UpdateEventDTO {
                flyer_url: Some(url),
                ..Default::default()
            },
        )
        .await?;

    info!("Flyer stored");
    Ok(Json(EventDTO::from(updated)))
}
