use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
    extractors::AuthUser,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::CreateUserError,
    repo_types::{NewUser, User},
    services::{is_valid_email, normalize_email, MIN_PASSWORD_LEN},
};
use crate::{
    error::{api_error, bad_request, internal, ApiError},
    state::AppState,
};

const BAD_CREDENTIALS: &str = "Invalid email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let Json(payload) = payload.map_err(bad_request)?;
    let email = normalize_email(&payload.email);
    let name = payload.name.trim();
    let phone = payload.phone.trim();

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid email"));
    }
    if name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Name is required"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(api_error(StatusCode::BAD_REQUEST, "Password too short"));
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        internal("Error creating user")
    })?;

    let new_user = NewUser {
        name,
        email: &email,
        password_hash: &hash,
        phone,
    };
    let user = match User::create(&state.db, new_user).await {
        Ok(u) => u,
        Err(CreateUserError::EmailTaken) => {
            warn!(%email, "email already registered");
            return Err(api_error(StatusCode::CONFLICT, "Email is already in use"));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(internal("Error creating user"));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload.map_err(bad_request)?;
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid email"));
    }

    let user = match User::find_by_email(&state.db, &email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(%email, "login unknown email");
            return Err(api_error(StatusCode::UNAUTHORIZED, BAD_CREDENTIALS));
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(internal("Error logging in"));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, user_id = %user.id, "verify_password failed");
        internal("Error logging in")
    })?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(api_error(StatusCode::UNAUTHORIZED, BAD_CREDENTIALS));
    }

    let response = issue_tokens(&JwtKeys::from_ref(&state), user)?;
    info!(user_id = %response.user.id, "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload.map_err(bad_request)?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        api_error(StatusCode::UNAUTHORIZED, "Invalid Token")
    })?;

    let user = load_user(&state, claims.sub).await?;
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = load_user(&state, user_id).await?;
    Ok(Json(user.into()))
}

/// A valid token for a vanished account is treated as unauthenticated.
async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    match User::find_by_id(&state.db, user_id).await {
        Ok(Some(u)) => Ok(u),
        Ok(None) => {
            warn!(%user_id, "token for unknown user");
            Err(api_error(StatusCode::UNAUTHORIZED, "User not found"))
        }
        Err(e) => {
            error!(error = %e, %user_id, "find_by_id failed");
            Err(internal("Error loading user"))
        }
    }
}

fn issue_tokens(keys: &JwtKeys, user: User) -> Result<AuthResponse, ApiError> {
    let user_id = user.id;
    let sign_failed = |e: anyhow::Error| {
        error!(error = %e, %user_id, "jwt sign failed");
        internal("Error issuing token")
    };
    let access_token = keys.sign_access(user_id).map_err(sign_failed)?;
    let refresh_token = keys.sign_refresh(user_id).map_err(sign_failed)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}
