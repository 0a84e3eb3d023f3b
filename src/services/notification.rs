//! Notification services - In-app notification feed

use crate::core::{AppError, AppState};
use crate::dtos::{NotificationDTO, NotificationsQuery, ReadAllDTO};
use crate::entities::User;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const FEED_LIMIT: i64 = 50;

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(params): Query<NotificationsQuery>,
) -> Result<Json<Vec<NotificationDTO>>, AppError> {
    let notifications = state
        .notification
        .find_many_by_recipient(&current_user.user_id, params.unread_only, FEED_LIMIT)
        .await?;
    debug!("Found {} notifications", notifications.len());
    Ok(Json(notifications.into_iter().map(NotificationDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(notification_id): Path<i64>,
) -> Result<Json<NotificationDTO>, AppError> {
    let notification = state
        .notification
        .mark_read(&notification_id, &current_user.user_id)
        .await?
        .ok_or_else(|| {
            warn!("Notification {} not found for user", notification_id);
            AppError::not_found("Notification not found")
        })?;
    Ok(Json(NotificationDTO::from(notification)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<ReadAllDTO>, AppError> {
    let updated = state.notification.mark_all_read(&current_user.user_id).await?;
    info!("Marked {} notifications read", updated);
    Ok(Json(ReadAllDTO { updated }))
}
