//! RSVP services - Submission and cancellation of a user's rsvp

use crate::core::{AppError, AppState};
use crate::dtos::{CreateRsvpDTO, NewGuestDTO, RsvpDTO, SubmitRsvpDTO};
use crate::entities::{Event, NotificationKind, RsvpGuest, User};
use crate::export::schedule_line;
use crate::notify::{TemplateKind, spawn_notify_user};
use crate::repositories::RsvpWrite;
use crate::services::event::{find_event, find_visible_event};
use crate::services::friend::remember_guests;
use crate::validation::{Contact, SubmissionContext, SubmissionRejection, validate_submission};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use futures::future::try_join;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Maps the unique index on confirmed rsvps to the "already responded" rejection
pub(crate) fn rsvp_write_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            warn!("Concurrent rsvp refused by the unique index");
            AppError::from(SubmissionRejection::AlreadyResponded)
        }
        other => AppError::from(other),
    }
}

pub(crate) fn event_full() -> AppError {
    AppError::conflict("Event is full")
}

/// Email and WhatsApp confirmations for freshly stored guests
pub(crate) fn send_confirmations(state: &AppState, event: &Event, guests: &[RsvpGuest]) {
    let schedule = schedule_line(event);
    for guest in guests {
        if let Some(email) = &guest.email {
            state.notifier.spawn_email(
                email.clone(),
                format!("You're on the guest list for {}", event.name),
                format!(
                    "Hi {},\n\nyou are confirmed for {} ({}).\n\nSee you there!",
                    guest.name, event.name, schedule
                ),
            );
        }
        if let Some(phone) = &guest.phone {
            state.notifier.spawn_whatsapp(
                phone.clone(),
                TemplateKind::RsvpConfirmation,
                vec![guest.name.clone(), event.name.clone(), schedule.clone()],
            );
        }
    }
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, guests = body.guests.len()))]
pub async fn submit_rsvp(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    Json(body): Json<SubmitRsvpDTO>,
) -> Result<(StatusCode, Json<RsvpDTO>), AppError> {
    debug!("Submitting rsvp");
    // 1. Only published events take rsvps
    // 2. Hold the event lock from the snapshot until the write is committed
    // 3. Load the snapshot: event counters, own confirmed rsvp, guests already on the list
    // 4. Validate every guest, then the event scope rules
    // 5. Check the remaining capacity, then store rsvp, guests and counter together
    // 6. Fire the side effects once the lock is released
    let event = find_event(&state, event_id).await?;
    if !event.is_published() {
        warn!("Rsvp to unpublished event");
        return Err(AppError::not_found("Event not found"));
    }

    let guard = state.event_locks.acquire(event_id).await;
    // the counter may have moved while waiting for the lock
    let event = find_event(&state, event_id).await?;

    let (own_rsvp, stored_guests) = try_join(
        state.rsvp.find_confirmed_by_user(&event_id, &current_user.user_id),
        state.rsvp.find_confirmed_guests_by_event(&event_id),
    )
    .await?;

    let user_contact = Contact::of_user(&current_user);
    let existing: Vec<Contact> = stored_guests.iter().map(Contact::of_guest).collect();
    let valid = validate_submission(
        &body.guests,
        &SubmissionContext {
            user: &user_contact,
            user_has_rsvp: own_rsvp.is_some(),
            existing: &existing,
            policy: &state.config.email_policy,
        },
    )
    .map_err(|rejection| {
        warn!("Rsvp rejected: {}", rejection);
        AppError::from(rejection)
    })?;

    if let Some(remaining) = event.remaining_capacity() {
        if (valid.len() as i64) > remaining {
            warn!("{} guests for {} remaining seats", valid.len(), remaining);
            return Err(event_full());
        }
    }

    let write = state
        .rsvp
        .create_with_guests(&CreateRsvpDTO {
            event_id,
            created_by: current_user.user_id,
            added_by_host: false,
            guests: valid.into_iter().map(NewGuestDTO::from).collect(),
        })
        .await
        .map_err(rsvp_write_error)?;
    drop(guard);

    let (rsvp, guests) = match write {
        RsvpWrite::Stored(rsvp, guests) => (rsvp, guests),
        RsvpWrite::CapacityExceeded => {
            warn!("Capacity guard refused the rsvp");
            return Err(event_full());
        }
    };
    info!(rsvp_id = rsvp.rsvp_id, "Rsvp stored");

    if event.creator_id != current_user.user_id {
        spawn_notify_user(
            &state,
            event.creator_id,
            NotificationKind::RsvpReceived,
            format!(
                "{} RSVP'd to {} with {} guest(s)",
                current_user.name,
                event.name,
                guests.len()
            ),
        );
    }
    send_confirmations(&state, &event, &guests);

    let background = state.clone();
    let owner_id = current_user.user_id;
    let companions = guests.clone();
    tokio::spawn(async move {
        if let Err(e) = remember_guests(&background, owner_id, &companions).await {
            warn!("Failed to cache guests as friends: {:?}", e);
        }
    });

    Ok((StatusCode::CREATED, Json(RsvpDTO::new(rsvp, guests))))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_my_rsvp(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
) -> Result<Json<RsvpDTO>, AppError> {
    find_visible_event(&state, event_id, &current_user).await?;

    let rsvp = state
        .rsvp
        .find_confirmed_by_user(&event_id, &current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("You have not responded to this event"))?;
    let guests = state.rsvp.find_guests(&rsvp.rsvp_id).await?;

    Ok(Json(RsvpDTO::new(rsvp, guests)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn cancel_my_rsvp(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Cancelling rsvp");
    let event = find_visible_event(&state, event_id, &current_user).await?;
    let guard = state.event_locks.acquire(event_id).await;

    let rsvp = state
        .rsvp
        .find_confirmed_by_user(&event_id, &current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("You have not responded to this event"))?;
    let guests = state.rsvp.find_guests(&rsvp.rsvp_id).await?;

    if !state.rsvp.cancel(&rsvp, guests.len() as i64).await? {
        return Err(AppError::not_found("You have not responded to this event"));
    }
    drop(guard);
    info!(rsvp_id = rsvp.rsvp_id, "Rsvp cancelled");

    if event.creator_id != current_user.user_id {
        spawn_notify_user(
            &state,
            event.creator_id,
            NotificationKind::RsvpCancelled,
            format!("{} cancelled their RSVP to {}", current_user.name, event.name),
        );
    }

    Ok(StatusCode::NO_CONTENT)
}
