use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AccountView, AuthResponse, LoginRequest, PublicProfile, RefreshRequest,
            RegisterRequest, UpdateProfileRequest,
        },
        repo_types::{NewUser, ProfilePatch, User},
        services::{hash_password, verify_password, AuthUser, JwtKeys},
    },
    db::StoreError,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    state::AppState,
    validation::{is_http_url, is_valid_email, is_valid_username, Validator},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/profile", put(update_profile))
        .route("/users/:user_id", get(get_public_profile))
}

const MIN_PASSWORD_LEN: usize = 8;

fn signed_response(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let (access_token, refresh_token) = keys.sign_pair(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

fn username_conflict_or_email(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict(constraint) if constraint.contains("username") => {
            AppError::Conflict("Username already taken".into())
        }
        StoreError::Conflict(_) => AppError::Conflict("Email already registered".into()),
        other => other.into(),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    let mut v = Validator::new();
    v.check(
        is_valid_username(&payload.username),
        "username",
        "Username must be 3-30 letters, digits or underscores",
    )
    .check(is_valid_email(&payload.email), "email", "Invalid email")
    .check(
        payload.password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "Password too short",
    );
    if let Err(e) = v.finish() {
        warn!(email = %payload.email, "register rejected");
        return Err(e);
    }

    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await
        .map_err(username_conflict_or_email)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(signed_response(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation(vec![crate::validation::FieldError::new(
            "email",
            "Invalid email",
        )]));
    }

    let Some(user) = state.users.find_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(signed_response(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(signed_response(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<AccountView>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<AccountView>> {
    let username = payload.username.map(|u| u.trim().to_string());
    let avatar_url = payload.avatar_url.map(|u| u.trim().to_string());

    let mut v = Validator::new();
    if let Some(u) = &username {
        v.check(
            is_valid_username(u),
            "username",
            "Username must be 3-30 letters, digits or underscores",
        );
    }
    if let Some(url) = &avatar_url {
        v.check(is_http_url(url), "avatarUrl", "Avatar must be an http(s) URL");
    }
    v.finish()?;

    let user = state
        .users
        .update_profile(user_id, ProfilePatch { username, avatar_url })
        .await
        .map_err(username_conflict_or_email)?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    info!(%user_id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_public_profile(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> AppResult<Json<PublicProfile>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user.into()))
}
