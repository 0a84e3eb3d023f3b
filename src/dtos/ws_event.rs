//! WebSocket Event DTOs - Events pushed to connected clients

use crate::dtos::NotificationDTO;
use serde::{Deserialize, Serialize};

/// Tagged union serialized as `{ "type": "Notification", "data": { ... } }`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data")]
pub enum WsEventDTO {
    Notification(NotificationDTO),
    Error { code: u16, message: String },
}
