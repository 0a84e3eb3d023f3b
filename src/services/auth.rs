//! Auth services - Phone sign-in with one time codes

use crate::core::auth::session_cookie;
use crate::core::otp::OtpCheck;
use crate::core::{AppError, AppState, encode_jwt};
use crate::dtos::{CreateUserDTO, OtpRequestDTO, OtpVerifyDTO, UserDTO};
use crate::notify::TemplateKind;
use crate::repositories::Create;
use crate::validation::{PHONE_DIGITS, normalize_phone};
use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const DEFAULT_NAME: &str = "Guest";

fn sign_in_phone(raw: &str) -> Result<String, AppError> {
    let phone = normalize_phone(raw);
    if phone.len() != PHONE_DIGITS {
        warn!("Sign-in with an invalid phone");
        return Err(AppError::bad_request("Phone number must have exactly 10 digits"));
    }
    Ok(phone)
}

#[instrument(skip(state, body))]
pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OtpRequestDTO>,
) -> Result<StatusCode, AppError> {
    let phone = sign_in_phone(&body.phone)?;

    state.otp.purge_expired();
    let code = state.otp.issue(&phone);
    state
        .notifier
        .spawn_whatsapp(phone, TemplateKind::OtpCode, vec![code]);

    info!("Sign-in code issued");
    Ok(StatusCode::ACCEPTED)
}

#[instrument(skip(state, body))]
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OtpVerifyDTO>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Check the code, a valid one is consumed
    // 2. Load the profile of the phone, provision it on first sign-in
    // 3. Link the friend placeholders other users cached for this phone or email
    // 4. Issue the JWT as Bearer header and HttpOnly cookie
    let phone = sign_in_phone(&body.phone)?;

    match state.otp.verify(&phone, body.code.trim()) {
        OtpCheck::Valid => debug!("Sign-in code accepted"),
        OtpCheck::Invalid => return Err(AppError::unauthorized("Invalid code")),
        OtpCheck::Missing => {
            return Err(AppError::unauthorized("Code expired or never requested"));
        }
    }

    let user = match state.user.find_by_phone(&phone).await? {
        Some(user) => user,
        None => {
            let name = body
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| n.chars().count() >= 2)
                .unwrap_or(DEFAULT_NAME)
                .to_string();
            let user = state
                .user
                .create(&CreateUserDTO {
                    name,
                    phone: phone.clone(),
                    email: None,
                })
                .await?;
            info!(user_id = user.user_id, "Profile provisioned");
            user
        }
    };

    match state
        .friend
        .link_placeholders(&user.user_id, Some(&user.phone), user.email.as_deref())
        .await
    {
        Ok(linked) if linked > 0 => info!("Linked {} friend placeholders", linked),
        Ok(_) => {}
        Err(e) => warn!("Failed to link friend placeholders: {:?}", e),
    }

    let token = encode_jwt(user.user_id, user.phone.clone(), &state.jwt_secret)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&session_cookie(&token))
            .map_err(|_| AppError::internal_server_error("Internal server error"))?,
    );
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Internal server error"))?,
    );

    info!(user_id = user.user_id, "User signed in");
    Ok((StatusCode::OK, headers, Json(UserDTO::from(user))))
}
