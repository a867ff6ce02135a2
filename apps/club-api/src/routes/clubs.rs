//! Club CRUD endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::AsyncConnection;
use rand::seq::SliceRandom;
use scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::db::pool::DbPool;
use crate::db::schema::{clubs, memberships};
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::club::{Club, NewClub, UpdateClub, PASTEL_COLORS};
use crate::models::membership::{Membership, NewMembership};
use crate::roles::{self, Role};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clubs", post(create_club).get(list_clubs))
        .route("/clubs/{slug}", get(get_club).patch(update_club))
}

/// Look up a club by slug or 404.
pub async fn club_by_slug(pool: &DbPool, slug: &str) -> Result<Club, ApiError> {
    let mut conn = pool.get().await?;

    let club: Option<Club> = diesel_async::RunQueryDsl::get_result(
        clubs::table
            .filter(clubs::slug.eq(slug))
            .select(Club::as_select()),
        &mut conn,
    )
    .await
    .optional()?;

    club.ok_or_else(|| ApiError::not_found("Club not found"))
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateClubRequest {
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClubResponse {
    #[serde(flatten)]
    pub club: Club,
    pub membership: Option<Membership>,
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs",
    tag = "Clubs",
    security(("bearer" = [])),
    request_body = CreateClubRequest,
    responses(
        (status = 201, description = "Club created", body = ClubResponse),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 409, description = "Name taken", body = ApiErrorBody),
    ),
)]
pub async fn create_club(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateClubRequest>,
) -> Result<(StatusCode, Json<ClubResponse>), ApiError> {
    // Validate.
    let name = body.name.trim().to_string();
    let description = body.description.trim().to_string();
    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push(FieldError {
            field: "name".to_string(),
            message: "Club name is required".to_string(),
        });
    } else if name.len() > 100 {
        errors.push(FieldError {
            field: "name".to_string(),
            message: "Club name must be 100 characters or fewer".to_string(),
        });
    }
    if description.is_empty() {
        errors.push(FieldError {
            field: "description".to_string(),
            message: "Description is required".to_string(),
        });
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let mut conn = state.db.get().await?;

    // Resolve a unique slug: base, base-1, base-2, …
    let base = clubify_common::slug::slugify(&name);
    let mut n = 0;
    let slug = loop {
        let candidate = clubify_common::slug::candidate(&base, n);
        let taken: Option<String> = diesel_async::RunQueryDsl::get_result(
            clubs::table
                .filter(clubs::slug.eq(&candidate))
                .select(clubs::id),
            &mut conn,
        )
        .await
        .optional()?;
        if taken.is_none() {
            break candidate;
        }
        n += 1;
    };

    let now = Utc::now();
    let club_id = clubify_common::id::prefixed_ulid(clubify_common::id::prefix::CLUB);
    let color = PASTEL_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PASTEL_COLORS[0]);

    // Club + creator's admin membership are one atomic unit; the membership
    // insert is conflict-do-nothing so a replay cannot produce a duplicate.
    let (club, membership) = conn
        .transaction::<_, ApiError, _>(|conn| {
            async move {
                let club: Club = diesel_async::RunQueryDsl::get_result(
                    diesel::insert_into(clubs::table)
                        .values(NewClub {
                            id: &club_id,
                            name: &name,
                            slug: &slug,
                            description: &description,
                            color,
                            logo_url: body.logo_url.as_deref(),
                            banner_url: body.banner_url.as_deref(),
                            created_by: &user_id,
                            created_at: now,
                        })
                        .returning(Club::as_returning()),
                    conn,
                )
                .await
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => ApiError::conflict("A club with that name already exists"),
                    other => ApiError::from(other),
                })?;

                diesel_async::RunQueryDsl::execute(
                    diesel::insert_into(memberships::table)
                        .values(NewMembership {
                            club_id: &club_id,
                            user_id: &user_id,
                            role: Role::Admin.as_str(),
                            joined_at: now,
                        })
                        .on_conflict_do_nothing(),
                    conn,
                )
                .await?;

                let membership: Membership = diesel_async::RunQueryDsl::get_result(
                    memberships::table
                        .find((&club_id, &user_id))
                        .select(Membership::as_select()),
                    conn,
                )
                .await?;

                Ok((club, membership))
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(club_id = %club.id, slug = %club.slug, "club created");

    Ok((
        StatusCode::CREATED,
        Json(ClubResponse {
            club,
            membership: Some(membership),
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/clubs",
    tag = "Clubs",
    responses((status = 200, description = "All clubs, newest first", body = [Club])),
)]
pub async fn list_clubs(State(state): State<AppState>) -> Result<Json<Vec<Club>>, ApiError> {
    let mut conn = state.db.get().await?;

    let list: Vec<Club> = diesel_async::RunQueryDsl::load(
        clubs::table
            .order(clubs::created_at.desc())
            .select(Club::as_select()),
        &mut conn,
    )
    .await?;

    Ok(Json(list))
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/clubs/{slug}",
    tag = "Clubs",
    params(("slug" = String, Path, description = "Club slug")),
    responses(
        (status = 200, description = "Club detail", body = ClubResponse),
        (status = 404, description = "Not found", body = ApiErrorBody),
    ),
)]
pub async fn get_club(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ClubResponse>, ApiError> {
    let club = club_by_slug(&state.db, &slug).await?;

    Ok(Json(ClubResponse {
        club,
        membership: None,
    }))
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/clubs/:slug
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateClubRequest {
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/api/v1/clubs/{slug}",
    tag = "Clubs",
    security(("bearer" = [])),
    params(("slug" = String, Path, description = "Club slug")),
    request_body = UpdateClubRequest,
    responses(
        (status = 200, description = "Club updated", body = Club),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Not found", body = ApiErrorBody),
    ),
)]
pub async fn update_club(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<UpdateClubRequest>,
) -> Result<Json<Club>, ApiError> {
    let club = club_by_slug(&state.db, &slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Admin).await?;

    if let Some(ref description) = body.description {
        if description.trim().is_empty() {
            return Err(ApiError::validation(vec![FieldError {
                field: "description".to_string(),
                message: "Description cannot be empty".to_string(),
            }]));
        }
    }

    if body.description.is_none() && body.logo_url.is_none() && body.banner_url.is_none() {
        return Ok(Json(club));
    }

    // Empty-string URLs clear the field; absent fields keep it.
    let changeset = UpdateClub {
        description: body.description.map(|d| d.trim().to_string()),
        logo_url: body.logo_url.map(|u| Some(u).filter(|u| !u.is_empty())),
        banner_url: body.banner_url.map(|u| Some(u).filter(|u| !u.is_empty())),
    };

    let mut conn = state.db.get().await?;

    let club: Club = diesel_async::RunQueryDsl::get_result(
        diesel::update(clubs::table.find(&club.id))
            .set(&changeset)
            .returning(Club::as_returning()),
        &mut conn,
    )
    .await?;

    Ok(Json(club))
}
