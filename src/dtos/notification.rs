//! Notification DTOs - Data Transfer Objects for in-app notifications

use crate::entities::{Notification, NotificationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NotificationDTO {
    pub notification_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDTO {
    fn from(value: Notification) -> Self {
        Self {
            notification_id: value.notification_id,
            kind: value.kind,
            message: value.message,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

/// DTO to create a notification (without id, read flag and timestamp)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateNotificationDTO {
    pub recipient_id: i64,
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ReadAllDTO {
    pub updated: u64,
}
