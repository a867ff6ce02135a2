//! Account registration, login, and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::{AuthUser, BearerToken};
use crate::auth::passwords::{hash_password, verify_password};
use crate::auth::sessions;
use crate::db::schema::users;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::user::{NewUser, User, UserResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/users/@me", get(get_me))
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/register
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Explicit username. When omitted, one is derived from the display
    /// name / email the way social sign-ups do.
    pub username: Option<String>,
    pub password: String,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 409, description = "Username or email taken", body = ApiErrorBody),
    ),
)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    // --- Validation ---
    let mut errors: Vec<FieldError> = Vec::new();

    let display_name = body.display_name.trim().to_string();
    if display_name.is_empty() || display_name.len() > 64 {
        errors.push(FieldError {
            field: "display_name".into(),
            message: "Display name must be 1–64 characters".into(),
        });
    }

    let email = body.email.as_ref().map(|e| e.trim().to_lowercase());
    if let Some(ref e) = email {
        if !e.contains('@') || e.len() < 3 {
            errors.push(FieldError {
                field: "email".into(),
                message: "Invalid email address".into(),
            });
        }
    }

    if body.password.len() < 10 {
        errors.push(FieldError {
            field: "password".into(),
            message: "Password must be at least 10 characters".into(),
        });
    }

    let explicit_username = body.username.as_ref().map(|u| u.trim().to_string());
    if let Some(ref username) = explicit_username {
        if username.len() < 2 || username.len() > 32 {
            errors.push(FieldError {
                field: "username".into(),
                message: "Username must be 2–32 characters".into(),
            });
        } else if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
        {
            errors.push(FieldError {
                field: "username".into(),
                message:
                    "Username may only contain letters, digits, underscores, dots, and hyphens"
                        .into(),
            });
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let mut conn = state.db.get().await?;

    let username = match explicit_username {
        Some(u) => u,
        None => {
            // Derive firstname_lastname (or email local part) and suffix
            // until free, like the social sign-up flow.
            let mut parts = display_name.splitn(2, char::is_whitespace);
            let first = parts.next().unwrap_or_default();
            let last = parts.next().unwrap_or_default();
            let base = clubify_common::username::base_username(first, last, email.as_deref());

            let mut n = 0;
            loop {
                let candidate = clubify_common::username::candidate(&base, n);
                let taken: Option<String> = users::table
                    .filter(users::username_lower.eq(candidate.to_lowercase()))
                    .select(users::id)
                    .first(&mut conn)
                    .await
                    .optional()?;
                if taken.is_none() {
                    break candidate;
                }
                n += 1;
            }
        }
    };

    let password_hash = hash_password(&body.password)?;
    let id = clubify_common::id::prefixed_ulid(clubify_common::id::prefix::USER);
    let username_lower = username.to_lowercase();

    let new_user = NewUser {
        id,
        username,
        username_lower,
        display_name,
        email,
        password_hash,
    };

    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => ApiError::conflict("Username is already taken"),
            other => ApiError::from(other),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    let token = sessions::create_session(&state.db, &user.id, state.config.session_ttl_seconds)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = SessionResponse),
        (status = 401, description = "Bad credentials", body = ApiErrorBody),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let mut conn = state.db.get().await?;

    let user: Option<User> = users::table
        .filter(users::username_lower.eq(body.username.trim().to_lowercase()))
        .select(User::as_select())
        .first(&mut conn)
        .await
        .optional()?;

    let user = match user {
        Some(u) if verify_password(&body.password, &u.password_hash) => u,
        _ => return Err(ApiError::unauthorized("Invalid username or password")),
    };

    let token = sessions::create_session(&state.db, &user.id, state.config.session_ttl_seconds)
        .await?;

    tracing::info!(user_id = %user.id, "login");

    Ok(Json(SessionResponse {
        token,
        user: UserResponse::from(user),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/logout
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn logout(
    _auth: AuthUser,
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, ApiError> {
    sessions::revoke_session(&state.db, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /api/v1/users/@me
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/users/@me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn get_me(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut conn = state.db.get().await?;

    let user: User = users::table
        .find(&user_id)
        .select(User::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(user)))
}
