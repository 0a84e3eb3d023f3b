//! Query DTOs - Query string parameters

use serde::{Deserialize, Serialize};

/// Query parameters of the notification list
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
}
