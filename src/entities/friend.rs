//! Friend entity - Contact cached under a user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Friend {
    pub friend_id: i64,
    pub owner_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    // filled in once the contact signs in with a matching phone or email
    pub linked_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
