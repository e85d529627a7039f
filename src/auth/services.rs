use std::time::Duration;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, PublicUser,
            RegisterRequest, VerifyResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, matches_any, verify_password},
    },
    error::{AppError, AppResult},
    mail,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub async fn register(st: &AppState, req: RegisterRequest) -> AppResult<MessageResponse> {
    if req.name.trim().is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("All fields are required"));
    }
    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    if st.users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::conflict("User already exists"));
    }

    let hash = hash_password(&req.password)?;
    let user = st
        .users
        .create(&req.name, &req.email, &hash)
        .await?
        .ok_or_else(|| {
            warn!(email = %req.email, "email registered concurrently");
            AppError::conflict("User already exists")
        })?;

    mail::schedule_welcome(
        st.mailer.clone(),
        &user.name,
        &user.email,
        Duration::from_secs(st.config.mail.welcome_delay_secs),
    );

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(MessageResponse::new(
        "User registered successfully. Welcome email will be sent shortly.",
    ))
}

pub async fn login(st: &AppState, req: LoginRequest) -> AppResult<AuthResponse> {
    let Some(user) = st.users.find_by_email(&req.email).await? else {
        warn!(email = %req.email, "login unknown email");
        return Err(AppError::InvalidCredentials(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(email = %req.email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials(INVALID_CREDENTIALS.into()));
    }

    let token = JwtKeys::from_ref(st).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        token,
        user: PublicUser {
            id: user.id,
            name: user.name,
            email: Some(user.email),
        },
    })
}

pub async fn change_password(
    st: &AppState,
    who: &AuthUser,
    req: ChangePasswordRequest,
) -> AppResult<MessageResponse> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::validation("All fields are required"));
    }

    let user = st
        .users
        .find_by_id(who.id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    if !verify_password(&req.old_password, &user.password_hash)? {
        warn!(user_id = %user.id, "change password with wrong old password");
        return Err(AppError::InvalidCredentials("Incorrect old password".into()));
    }

    let recent = std::iter::once(&user.password_hash).chain(user.password_history.iter());
    if matches_any(&req.new_password, recent)? {
        warn!(user_id = %user.id, "password reuse rejected");
        return Err(AppError::conflict("Cannot reuse the last 3 passwords"));
    }

    let new_hash = hash_password(&req.new_password)?;
    st.users
        .update_password(user.id, &new_hash, &user.rotated_history())
        .await?;

    info!(user_id = %user.id, "password changed");
    Ok(MessageResponse::new("Password updated successfully"))
}

/// The guard has already resolved the identity; this only projects it.
pub fn verify_token(who: &AuthUser) -> VerifyResponse {
    VerifyResponse {
        valid: true,
        user: PublicUser {
            id: who.id,
            name: who.name.clone(),
            email: None,
        },
    }
}
