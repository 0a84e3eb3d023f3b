//! In-app notifications - Stored documents, pushed live to online recipients

use crate::core::AppState;
use crate::dtos::{CreateNotificationDTO, NotificationDTO};
use crate::entities::{Notification, NotificationKind};
use crate::repositories::Create;
use crate::ws::usermap::InternalSignal;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Stores a notification for `recipient_id` and pushes it over the
/// WebSocket if the recipient is connected.
#[instrument(skip(state, message))]
pub async fn notify_user(
    state: &AppState,
    recipient_id: i64,
    kind: NotificationKind,
    message: String,
) -> Result<Notification, sqlx::Error> {
    let notification = state
        .notification
        .create(&CreateNotificationDTO {
            recipient_id,
            kind,
            message,
        })
        .await?;

    info!(notification_id = notification.notification_id, "Notification stored");
    state.users_online.send_if_online(
        &recipient_id,
        InternalSignal::Notification(NotificationDTO::from(notification.clone())),
    );
    Ok(notification)
}

/// Background variant of [`notify_user`], failures are only logged
pub fn spawn_notify_user(
    state: &Arc<AppState>,
    recipient_id: i64,
    kind: NotificationKind,
    message: String,
) {
    let state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = notify_user(&state, recipient_id, kind, message).await {
            warn!("Failed to store notification for user {}: {:?}", recipient_id, e);
        }
    });
}
