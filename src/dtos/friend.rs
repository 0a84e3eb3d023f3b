//! Friend DTOs - Data Transfer Objects for cached contacts

use crate::dtos::GuestInput;
use crate::entities::{Friend, Gender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FriendDTO {
    pub friend_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub linked_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Friend> for FriendDTO {
    fn from(value: Friend) -> Self {
        Self {
            friend_id: value.friend_id,
            name: value.name,
            phone: value.phone,
            email: value.email,
            linked_user_id: value.linked_user_id,
            created_at: value.created_at,
        }
    }
}

/// Request body to add a contact
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddFriendDTO {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl From<&AddFriendDTO> for GuestInput {
    fn from(value: &AddFriendDTO) -> Self {
        Self {
            name: value.name.clone(),
            email: value.email.clone(),
            phone: value.phone.clone(),
            gender: Gender::Unspecified,
        }
    }
}

/// DTO to store a contact (without friend_id), contact fields already normalized
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateFriendDTO {
    pub owner_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub linked_user_id: Option<i64>,
}
