//! Friend services - Contacts cached per user

use crate::core::{AppError, AppState};
use crate::dtos::{AddFriendDTO, CreateFriendDTO, FriendDTO, GuestInput};
use crate::entities::{Friend, RsvpGuest, User};
use crate::repositories::{Create, Delete, Read};
use crate::validation::{Contact, GuestIssue, check_fields};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn contact_of(friend: &Friend) -> Contact {
    Contact::new(friend.email.as_deref(), friend.phone.as_deref())
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<FriendDTO>>, AppError> {
    let friends = state.friend.find_many_by_owner(&current_user.user_id).await?;
    debug!("Found {} friends", friends.len());
    Ok(Json(friends.into_iter().map(FriendDTO::from).collect()))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn add_friend(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<AddFriendDTO>,
) -> Result<(StatusCode, Json<FriendDTO>), AppError> {
    debug!("Adding friend");
    // 1. Same field rules as a guest: name, contact present, email and phone format
    // 2. Reject a contact already cached by the caller
    // 3. Link the contact right away when a registered user owns it
    let (name, contact) =
        check_fields(&GuestInput::from(&body), &state.config.email_policy).map_err(|reason| {
            warn!("Invalid friend: {}", reason);
            AppError::bad_request("Friend is invalid").with_guests(&[GuestIssue { index: 0, reason }])
        })?;

    let existing = state.friend.find_many_by_owner(&current_user.user_id).await?;
    if existing
        .iter()
        .any(|f| contact_of(f).shared_field(&contact).is_some())
    {
        warn!("Friend already cached");
        return Err(AppError::conflict("This contact is already in your friends"));
    }

    let linked = state
        .user
        .find_by_contact(contact.phone.as_deref(), contact.email.as_deref())
        .await?;

    let friend = state
        .friend
        .create(&CreateFriendDTO {
            owner_id: current_user.user_id,
            name,
            phone: contact.phone,
            email: contact.email,
            linked_user_id: linked.map(|u| u.user_id),
        })
        .await?;

    info!(friend_id = friend.friend_id, "Friend added");
    Ok((StatusCode::CREATED, Json(FriendDTO::from(friend))))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_friend(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(friend_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    match state.friend.read(&friend_id).await? {
        Some(friend) if friend.owner_id == current_user.user_id => {
            state.friend.delete(&friend_id).await?;
            info!("Friend deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        _ => {
            warn!("Friend {} not found for user", friend_id);
            Err(AppError::not_found("Friend not found"))
        }
    }
}

/// Caches the companions of an rsvp as friends of the submitter.
/// Guests already cached, by phone or email, are skipped.
#[instrument(skip(state, guests), fields(guests = guests.len()))]
pub(crate) async fn remember_guests(
    state: &AppState,
    owner_id: i64,
    guests: &[RsvpGuest],
) -> Result<usize, sqlx::Error> {
    let mut known: Vec<Contact> = state
        .friend
        .find_many_by_owner(&owner_id)
        .await?
        .iter()
        .map(contact_of)
        .collect();

    let mut added = 0;
    for guest in guests.iter().filter(|g| !g.is_primary) {
        let contact = Contact::of_guest(guest);
        if contact.is_empty() || known.iter().any(|c| c.shared_field(&contact).is_some()) {
            continue;
        }

        let linked = state
            .user
            .find_by_contact(contact.phone.as_deref(), contact.email.as_deref())
            .await?;
        state
            .friend
            .create(&CreateFriendDTO {
                owner_id,
                name: guest.name.clone(),
                phone: contact.phone.clone(),
                email: contact.email.clone(),
                linked_user_id: linked.map(|u| u.user_id),
            })
            .await?;
        known.push(contact);
        added += 1;
    }

    debug!("Cached {} guests as friends", added);
    Ok(added)
}
