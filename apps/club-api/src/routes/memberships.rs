//! Membership lifecycle: join requests, review, and role mutation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use diesel_async::AsyncConnection;
use scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::db::schema::{membership_requests, memberships, users};
use crate::error::{ApiError, ApiErrorBody};
use crate::models::membership::{MemberEntry, Membership, NewMembership};
use crate::models::membership_request::{
    MembershipRequest, NewMembershipRequest, STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED,
};
use crate::roles::{self, Role};
use crate::routes::clubs::club_by_slug;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clubs/{slug}/join", post(request_membership))
        .route("/clubs/{slug}/members", get(list_members))
        .route("/clubs/{slug}/requests", get(list_requests))
        .route("/clubs/{slug}/requests/{request_id}/approve", post(approve_request))
        .route("/clubs/{slug}/requests/{request_id}/reject", post(reject_request))
        .route("/clubs/{slug}/members/{user_id}/promote", post(promote_member))
        .route("/clubs/{slug}/members/{user_id}/demote", post(demote_member))
        .route("/clubs/{slug}/members/{user_id}", delete(remove_member))
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/join
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<MembershipRequest>,
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/join",
    tag = "Memberships",
    security(("bearer" = [])),
    params(("slug" = String, Path, description = "Club slug")),
    responses(
        (status = 201, description = "Request submitted", body = JoinResponse),
        (status = 200, description = "Nothing to do (already a member or already pending)", body = JoinResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Club not found", body = ApiErrorBody),
    ),
)]
pub async fn request_membership(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<JoinResponse>), ApiError> {
    let club = club_by_slug(&state.db, &slug).await?;

    // Already a member: informational, not an error.
    if roles::get_membership(&state.db, &club.id, &user_id)
        .await?
        .is_some()
    {
        return Ok((
            StatusCode::OK,
            Json(JoinResponse {
                message: format!("You are already a member of {}.", club.name),
                request: None,
            }),
        ));
    }

    let mut conn = state.db.get().await?;

    // One pending request per (user, club); a rejected request does not
    // block re-requesting.
    let pending: Option<MembershipRequest> = diesel_async::RunQueryDsl::get_result(
        membership_requests::table
            .filter(membership_requests::club_id.eq(&club.id))
            .filter(membership_requests::user_id.eq(&user_id))
            .filter(membership_requests::status.eq(STATUS_PENDING))
            .select(MembershipRequest::as_select()),
        &mut conn,
    )
    .await
    .optional()?;

    if let Some(existing) = pending {
        return Ok((
            StatusCode::OK,
            Json(JoinResponse {
                message: format!("Your request to join {} is already pending.", club.name),
                request: Some(existing),
            }),
        ));
    }

    let id = clubify_common::id::prefixed_ulid(clubify_common::id::prefix::REQUEST);
    let request: MembershipRequest = diesel_async::RunQueryDsl::get_result(
        diesel::insert_into(membership_requests::table)
            .values(NewMembershipRequest {
                id: &id,
                club_id: &club.id,
                user_id: &user_id,
                status: STATUS_PENDING,
                requested_at: Utc::now(),
            })
            .returning(MembershipRequest::as_returning()),
        &mut conn,
    )
    .await?;

    tracing::info!(club_id = %club.id, user_id = %user_id, "membership requested");

    Ok((
        StatusCode::CREATED,
        Json(JoinResponse {
            message: format!("Your request to join {} has been submitted!", club.name),
            request: Some(request),
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/members
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberListResponse {
    pub data: Vec<MemberEntry>,
}

#[utoipa::path(
    get,
    path = "/api/v1/clubs/{slug}/members",
    tag = "Memberships",
    security(("bearer" = [])),
    params(("slug" = String, Path, description = "Club slug")),
    responses(
        (status = 200, description = "Member list", body = MemberListResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Club not found", body = ApiErrorBody),
    ),
)]
pub async fn list_members(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<MemberListResponse>, ApiError> {
    let club = club_by_slug(&state.db, &slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Member).await?;

    let mut conn = state.db.get().await?;

    let mut data: Vec<MemberEntry> = diesel_async::RunQueryDsl::load(
        memberships::table
            .inner_join(users::table.on(users::id.eq(memberships::user_id)))
            .filter(memberships::club_id.eq(&club.id))
            .select((
                memberships::club_id,
                memberships::user_id,
                memberships::role,
                memberships::joined_at,
                users::username,
                users::display_name,
            )),
        &mut conn,
    )
    .await?;

    // Admins first, then moderators, then members, newest joins last.
    data.sort_by(|a, b| {
        let rank = |r: &str| Role::parse(r).unwrap_or(Role::Member);
        rank(&b.role)
            .cmp(&rank(&a.role))
            .then(a.joined_at.cmp(&b.joined_at))
    });

    Ok(Json(MemberListResponse { data }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/requests
// ---------------------------------------------------------------------------

#[derive(Debug, Queryable, Serialize, ToSchema)]
pub struct RequestEntry {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub requested_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestListResponse {
    pub data: Vec<RequestEntry>,
}

#[utoipa::path(
    get,
    path = "/api/v1/clubs/{slug}/requests",
    tag = "Memberships",
    security(("bearer" = [])),
    params(("slug" = String, Path, description = "Club slug")),
    responses(
        (status = 200, description = "Pending requests, newest first", body = RequestListResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not an admin", body = ApiErrorBody),
        (status = 404, description = "Club not found", body = ApiErrorBody),
    ),
)]
pub async fn list_requests(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RequestListResponse>, ApiError> {
    let club = club_by_slug(&state.db, &slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Admin).await?;

    let mut conn = state.db.get().await?;

    let data: Vec<RequestEntry> = diesel_async::RunQueryDsl::load(
        membership_requests::table
            .inner_join(users::table.on(users::id.eq(membership_requests::user_id)))
            .filter(membership_requests::club_id.eq(&club.id))
            .filter(membership_requests::status.eq(STATUS_PENDING))
            .order(membership_requests::requested_at.desc())
            .select((
                membership_requests::id,
                membership_requests::user_id,
                users::username,
                users::display_name,
                membership_requests::requested_at,
            )),
        &mut conn,
    )
    .await?;

    Ok(Json(RequestListResponse { data }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/requests/:request_id/approve
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestPath {
    pub slug: String,
    pub request_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub message: String,
    pub request: MembershipRequest,
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/requests/{request_id}/approve",
    tag = "Memberships",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("request_id" = String, Path, description = "Membership request ID"),
    ),
    responses(
        (status = 200, description = "Request approved, membership created", body = ReviewResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not an admin", body = ApiErrorBody),
        (status = 404, description = "No pending request with this ID", body = ApiErrorBody),
    ),
)]
pub async fn approve_request(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<RequestPath>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Admin).await?;

    let now = Utc::now();
    let club_id = club.id.clone();
    let reviewer = user_id.clone();
    let request_id = path.request_id.clone();

    let mut conn = state.db.get().await?;

    // The update filters on status=pending, so a request can be approved at
    // most once; the membership insert rides in the same transaction so an
    // approved request always yields exactly one membership.
    let request = conn
        .transaction::<_, ApiError, _>(|conn| {
            async move {
                let request: Option<MembershipRequest> = diesel_async::RunQueryDsl::get_result(
                    diesel::update(
                        membership_requests::table
                            .filter(membership_requests::id.eq(&request_id))
                            .filter(membership_requests::club_id.eq(&club_id))
                            .filter(membership_requests::status.eq(STATUS_PENDING)),
                    )
                    .set((
                        membership_requests::status.eq(STATUS_APPROVED),
                        membership_requests::reviewed_at.eq(Some(now)),
                        membership_requests::reviewed_by.eq(Some(&reviewer)),
                    ))
                    .returning(MembershipRequest::as_returning()),
                    conn,
                )
                .await
                .optional()?;

                let request = request.ok_or_else(|| {
                    ApiError::not_found("No pending request with this ID")
                })?;

                diesel_async::RunQueryDsl::execute(
                    diesel::insert_into(memberships::table)
                        .values(NewMembership {
                            club_id: &club_id,
                            user_id: &request.user_id,
                            role: Role::Member.as_str(),
                            joined_at: now,
                        })
                        .on_conflict_do_nothing(),
                    conn,
                )
                .await?;

                Ok(request)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(club_id = %club.id, request_id = %request.id, "membership request approved");

    Ok(Json(ReviewResponse {
        message: "Request approved.".to_string(),
        request,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/requests/:request_id/reject
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/requests/{request_id}/reject",
    tag = "Memberships",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("request_id" = String, Path, description = "Membership request ID"),
    ),
    responses(
        (status = 200, description = "Request rejected", body = ReviewResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not an admin", body = ApiErrorBody),
        (status = 404, description = "No pending request with this ID", body = ApiErrorBody),
    ),
)]
pub async fn reject_request(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<RequestPath>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Admin).await?;

    let mut conn = state.db.get().await?;

    let request: Option<MembershipRequest> = diesel_async::RunQueryDsl::get_result(
        diesel::update(
            membership_requests::table
                .filter(membership_requests::id.eq(&path.request_id))
                .filter(membership_requests::club_id.eq(&club.id))
                .filter(membership_requests::status.eq(STATUS_PENDING)),
        )
        .set((
            membership_requests::status.eq(STATUS_REJECTED),
            membership_requests::reviewed_at.eq(Some(Utc::now())),
            membership_requests::reviewed_by.eq(Some(&user_id)),
        ))
        .returning(MembershipRequest::as_returning()),
        &mut conn,
    )
    .await
    .optional()?;

    let request =
        request.ok_or_else(|| ApiError::not_found("No pending request with this ID"))?;

    Ok(Json(ReviewResponse {
        message: "Request rejected.".to_string(),
        request,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/members/:user_id/promote
// POST /api/v1/clubs/:slug/members/:user_id/demote
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemberPath {
    pub slug: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberUpdateResponse {
    pub message: String,
    pub membership: Membership,
}

async fn target_membership(
    state: &AppState,
    club_id: &str,
    user_id: &str,
) -> Result<Membership, ApiError> {
    roles::get_membership(&state.db, club_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/members/{user_id}/promote",
    tag = "Memberships",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("user_id" = String, Path, description = "Target member's user ID"),
    ),
    responses(
        (status = 200, description = "Promoted (or already a moderator)", body = MemberUpdateResponse),
        (status = 400, description = "Target is an admin", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not an admin", body = ApiErrorBody),
        (status = 404, description = "Member not found", body = ApiErrorBody),
    ),
)]
pub async fn promote_member(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
) -> Result<Json<MemberUpdateResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Admin).await?;

    let target = target_membership(&state, &club.id, &path.user_id).await?;

    match roles::role_of(&target) {
        Role::Admin => Err(ApiError::bad_request("You cannot change an admin's role")),
        Role::Moderator => Ok(Json(MemberUpdateResponse {
            message: "This member is already a moderator.".to_string(),
            membership: target,
        })),
        Role::Member => {
            let membership = set_role(&state, &club.id, &path.user_id, Role::Moderator).await?;
            Ok(Json(MemberUpdateResponse {
                message: "Member promoted to moderator.".to_string(),
                membership,
            }))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/members/{user_id}/demote",
    tag = "Memberships",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("user_id" = String, Path, description = "Target member's user ID"),
    ),
    responses(
        (status = 200, description = "Demoted (or already a plain member)", body = MemberUpdateResponse),
        (status = 400, description = "Target is an admin", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not an admin", body = ApiErrorBody),
        (status = 404, description = "Member not found", body = ApiErrorBody),
    ),
)]
pub async fn demote_member(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
) -> Result<Json<MemberUpdateResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Admin).await?;

    let target = target_membership(&state, &club.id, &path.user_id).await?;

    match roles::role_of(&target) {
        Role::Admin => Err(ApiError::bad_request("You cannot change an admin's role")),
        Role::Member => Ok(Json(MemberUpdateResponse {
            message: "This member is already a regular member.".to_string(),
            membership: target,
        })),
        Role::Moderator => {
            let membership = set_role(&state, &club.id, &path.user_id, Role::Member).await?;
            Ok(Json(MemberUpdateResponse {
                message: "Moderator demoted to member.".to_string(),
                membership,
            }))
        }
    }
}

async fn set_role(
    state: &AppState,
    club_id: &str,
    user_id: &str,
    role: Role,
) -> Result<Membership, ApiError> {
    let mut conn = state.db.get().await?;

    let membership: Membership = diesel_async::RunQueryDsl::get_result(
        diesel::update(memberships::table.find((club_id, user_id)))
            .set(memberships::role.eq(role.as_str()))
            .returning(Membership::as_returning()),
        &mut conn,
    )
    .await?;

    tracing::info!(club_id, user_id, role = %role, "member role changed");

    Ok(membership)
}

// ---------------------------------------------------------------------------
// DELETE /api/v1/clubs/:slug/members/:user_id
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/api/v1/clubs/{slug}/members/{user_id}",
    tag = "Memberships",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("user_id" = String, Path, description = "Target member's user ID"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 400, description = "Target is an admin or yourself", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not an admin", body = ApiErrorBody),
        (status = 404, description = "Member not found", body = ApiErrorBody),
    ),
)]
pub async fn remove_member(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
) -> Result<StatusCode, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Admin).await?;

    if path.user_id == user_id {
        return Err(ApiError::bad_request("You cannot remove yourself"));
    }

    let target = target_membership(&state, &club.id, &path.user_id).await?;
    if roles::role_of(&target) == Role::Admin {
        return Err(ApiError::bad_request("You cannot remove an admin"));
    }

    let mut conn = state.db.get().await?;

    diesel_async::RunQueryDsl::execute(
        diesel::delete(memberships::table.find((&club.id, &path.user_id))),
        &mut conn,
    )
    .await?;

    tracing::info!(club_id = %club.id, user_id = %path.user_id, "member removed");

    Ok(StatusCode::NO_CONTENT)
}
