//! User services - Profile of the signed-in user

use crate::core::{AppError, AppState};
use crate::dtos::{UpdateUserDTO, UserDTO};
use crate::entities::User;
use crate::repositories::Update;
use crate::validation::normalize_email;
use axum::{
    Extension,
    extract::{Json, State},
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

pub async fn get_me(Extension(current_user): Extension<User>) -> Json<UserDTO> {
    Json(UserDTO::from(current_user))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateUserDTO>,
) -> Result<Json<UserDTO>, AppError> {
    let update = UpdateUserDTO {
        name: body.name.map(|n| n.trim().to_string()),
        email: body.email.map(|e| normalize_email(&e)),
    };
    update.validate()?;

    if let Some(email) = &update.email {
        if let Some(owner) = state.user.find_by_email(email).await? {
            if owner.user_id != current_user.user_id {
                warn!("Email already used by user {}", owner.user_id);
                return Err(AppError::conflict("Email already belongs to another account"));
            }
        }
    }

    let updated = state.user.update(&current_user.user_id, &update).await?;
    info!("Profile updated");

    if let Some(email) = &update.email {
        match state
            .friend
            .link_placeholders(&updated.user_id, None, Some(email))
            .await
        {
            Ok(linked) => info!("Linked {} friend placeholders by email", linked),
            Err(e) => warn!("Failed to link friend placeholders: {:?}", e),
        }
    }

    Ok(Json(UserDTO::from(updated)))
}
