//! Guest services - Host side management of the guest list

use crate::core::{AppError, AppState, require_creator};
use crate::dtos::{CreateRsvpDTO, GuestInput, NewGuestDTO, RosterDTO, RsvpDTO};
use crate::entities::{NotificationKind, RsvpGuest, User};
use crate::export::{ExportError, render_guest_list};
use crate::notify::spawn_notify_user;
use crate::repositories::RsvpWrite;
use crate::services::event::find_event;
use crate::services::rsvp::{event_full, rsvp_write_error, send_confirmations};
use crate::validation::{Contact, GuestIssue, check_against_event, validate_guest};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_guests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
) -> Result<Json<RosterDTO>, AppError> {
    let event = find_event(&state, event_id).await?;
    require_creator(&event, &current_user)?;

    let entries = state.rsvp.roster(&event_id).await?;
    debug!("Roster has {} guests", entries.len());
    Ok(Json(RosterDTO::new(&event, entries)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn add_guest(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
    Json(body): Json<GuestInput>,
) -> Result<(StatusCode, Json<RsvpDTO>), AppError> {
    debug!("Adding guest manually");
    // 1. Only the creator adds guests, under the event lock
    // 2. The guest is checked like a companion of the host
    // 3. Its contact must not be on the guest list yet
    // 4. Capacity applies, the guest is stored as its own rsvp flagged as added by the host
    let event = find_event(&state, event_id).await?;
    require_creator(&event, &current_user)?;

    let guard = state.event_locks.acquire(event_id).await;
    let event = find_event(&state, event_id).await?;

    let host_contact = Contact::of_user(&current_user);
    let guest = validate_guest(&body, 0, false, &host_contact, &[], &state.config.email_policy)
        .map_err(|reason| {
            warn!("Manual guest rejected: {}", reason);
            AppError::bad_request("One or more guests are invalid")
                .with_guests(&[GuestIssue { index: 0, reason }])
        })?;

    let existing: Vec<Contact> = state
        .rsvp
        .find_confirmed_guests_by_event(&event_id)
        .await?
        .iter()
        .map(Contact::of_guest)
        .collect();
    check_against_event(&guest, &existing).map_err(|reason| {
        warn!("Manual guest already listed: {}", reason);
        AppError::conflict("One or more guests are already on the guest list")
            .with_guests(&[GuestIssue { index: 0, reason }])
    })?;

    if event.remaining_capacity() == Some(0) {
        return Err(event_full());
    }

    let write = state
        .rsvp
        .create_with_guests(&CreateRsvpDTO {
            event_id,
            created_by: current_user.user_id,
            added_by_host: true,
            guests: vec![NewGuestDTO::from(guest)],
        })
        .await
        .map_err(rsvp_write_error)?;
    drop(guard);

    let (rsvp, guests) = match write {
        RsvpWrite::Stored(rsvp, guests) => (rsvp, guests),
        RsvpWrite::CapacityExceeded => return Err(event_full()),
    };
    info!(rsvp_id = rsvp.rsvp_id, "Guest added by host");

    send_confirmations(&state, &event, &guests);

    let background = state.clone();
    let host = current_user.clone();
    let event_name = event.name.clone();
    let added = guests.clone();
    tokio::spawn(async move {
        if let Err(e) = notify_linked_accounts(&background, &host, &event_name, &added).await {
            warn!("Failed to notify added guests: {:?}", e);
        }
    });

    Ok((StatusCode::CREATED, Json(RsvpDTO::new(rsvp, guests))))
}

/// Notifies the registered accounts matching guests added by the host
async fn notify_linked_accounts(
    state: &Arc<AppState>,
    host: &User,
    event_name: &str,
    guests: &[RsvpGuest],
) -> Result<(), sqlx::Error> {
    for guest in guests {
        let account = state
            .user
            .find_by_contact(guest.phone.as_deref(), guest.email.as_deref())
            .await?;
        if let Some(account) = account.filter(|u| u.user_id != host.user_id) {
            spawn_notify_user(
                state,
                account.user_id,
                NotificationKind::GuestAdded,
                format!("{} added you to the guest list of {}", host.name, event_name),
            );
        }
    }
    Ok(())
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn export_guests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_event(&state, event_id).await?;
    require_creator(&event, &current_user)?;
    let entries = state.rsvp.roster(&event_id).await?;

    let font_dir = state.config.pdf_font_dir.clone();
    let font_family = state.config.pdf_font_family.clone();
    let rendering = event.clone();
    let pdf = tokio::task::spawn_blocking(move || {
        render_guest_list(&rendering, &entries, &font_dir, &font_family)
    })
    .await
    .map_err(|e| {
        error!("PDF rendering task failed: {:?}", e);
        AppError::internal_server_error("Internal server error")
    })?
    .map_err(|e| match e {
        ExportError::Fonts(_) => {
            warn!("PDF export unavailable: {}", e);
            AppError::service_unavailable("PDF export is unavailable")
        }
        ExportError::Render(_) => {
            error!("PDF export failed: {}", e);
            AppError::internal_server_error("PDF export failed")
        }
    })?;

    info!(bytes = pdf.len(), "Guest list exported");
    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"guest-list-{}.pdf\"", event.event_id),
            ),
        ],
        pdf,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::repositories::Read;
    use sqlx::SqlitePool;
    use std::time::Duration;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "events", "rsvps")))]
    async fn test_notify_linked_accounts(pool: SqlitePool) -> sqlx::Result<()> {
        let state = Arc::new(AppState::new(pool.clone(), Config::local("sqlite::memory:", "secret")));
        let host = state.user.read(&1).await?.expect("alice exists");
        let guests = state.rsvp.find_guests(&1).await?;

        // Bob Guest owns the primary guest's phone, Xavier has no account
        notify_linked_accounts(&state, &host, "Summer Party", &guests).await?;
        let mut delivered = false;
        for _ in 0..50 {
            let feed = state.notification.find_many_by_recipient(&2, true, 50).await?;
            if feed.iter().any(|n| n.kind == NotificationKind::GuestAdded) {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(delivered, "linked account should be notified");

        // after the commit a failing lookup is only reported to the background task
        pool.close().await;
        assert!(
            notify_linked_accounts(&state, &host, "Summer Party", &guests)
                .await
                .is_err()
        );
        Ok(())
    }
}
