//! Post engagement: likes, bookmarks, and comments.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::db::schema::{bookmarks, comments, likes, users};
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::bookmark::NewBookmark;
use crate::models::comment::{Comment, NewComment};
use crate::models::like::NewLike;
use crate::roles::{self, Role};
use crate::routes::clubs::club_by_slug;
use crate::routes::posts::post_in_club;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clubs/{slug}/posts/{post_id}/like", post(toggle_like))
        .route("/clubs/{slug}/posts/{post_id}/bookmark", post(toggle_bookmark))
        .route(
            "/clubs/{slug}/posts/{post_id}/comments",
            post(add_comment).get(list_comments),
        )
        .route(
            "/clubs/{slug}/posts/{post_id}/comments/{comment_id}",
            delete(delete_comment),
        )
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostPath {
    pub slug: String,
    pub post_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentPath {
    pub slug: String,
    pub post_id: String,
    pub comment_id: String,
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/posts/:post_id/like
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleResponse {
    /// State after the toggle.
    pub active: bool,
    pub count: i64,
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/posts/{post_id}/like",
    tag = "Engagement",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    responses(
        (status = 200, description = "Like toggled", body = ToggleResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn toggle_like(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    let mut conn = state.db.get().await?;

    let removed = diesel_async::RunQueryDsl::execute(
        diesel::delete(likes::table.find((&post.id, &user_id))),
        &mut conn,
    )
    .await?;

    let active = if removed == 0 {
        // Conflict-do-nothing keeps a double tap from erroring.
        diesel_async::RunQueryDsl::execute(
            diesel::insert_into(likes::table)
                .values(NewLike {
                    post_id: &post.id,
                    user_id: &user_id,
                    created_at: Utc::now(),
                })
                .on_conflict_do_nothing(),
            &mut conn,
        )
        .await?;
        true
    } else {
        false
    };

    let count: i64 = diesel_async::RunQueryDsl::get_result(
        likes::table.filter(likes::post_id.eq(&post.id)).count(),
        &mut conn,
    )
    .await?;

    Ok(Json(ToggleResponse { active, count }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/posts/:post_id/bookmark
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/posts/{post_id}/bookmark",
    tag = "Engagement",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    responses(
        (status = 200, description = "Bookmark toggled", body = ToggleResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn toggle_bookmark(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    let mut conn = state.db.get().await?;

    let removed = diesel_async::RunQueryDsl::execute(
        diesel::delete(bookmarks::table.find((&post.id, &user_id))),
        &mut conn,
    )
    .await?;

    let active = if removed == 0 {
        diesel_async::RunQueryDsl::execute(
            diesel::insert_into(bookmarks::table)
                .values(NewBookmark {
                    post_id: &post.id,
                    user_id: &user_id,
                    created_at: Utc::now(),
                })
                .on_conflict_do_nothing(),
            &mut conn,
        )
        .await?;
        true
    } else {
        false
    };

    let count: i64 = diesel_async::RunQueryDsl::get_result(
        bookmarks::table
            .filter(bookmarks::post_id.eq(&post.id))
            .count(),
        &mut conn,
    )
    .await?;

    Ok(Json(ToggleResponse { active, count }))
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/posts/:post_id/comments
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCommentRequest {
    pub body: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/posts/{post_id}/comments",
    tag = "Engagement",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    request_body = AddCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Empty comment", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn add_comment(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
    Json(body): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Member).await?;

    let text = body.body.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::validation(vec![FieldError {
            field: "body".to_string(),
            message: "Comment cannot be empty".to_string(),
        }]));
    }
    if text.len() > 2000 {
        return Err(ApiError::validation(vec![FieldError {
            field: "body".to_string(),
            message: "Comment must be 2000 characters or fewer".to_string(),
        }]));
    }

    let now = Utc::now();
    let id = clubify_common::id::prefixed_ulid(clubify_common::id::prefix::COMMENT);

    let mut conn = state.db.get().await?;

    let comment: Comment = diesel_async::RunQueryDsl::get_result(
        diesel::insert_into(comments::table)
            .values(NewComment {
                id: &id,
                post_id: &post.id,
                user_id: &user_id,
                body: &text,
                created_at: now,
                updated_at: now,
            })
            .returning(Comment::as_returning()),
        &mut conn,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/posts/:post_id/comments
// ---------------------------------------------------------------------------

#[derive(Debug, Queryable, Serialize, ToSchema)]
pub struct CommentEntry {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentListResponse {
    pub data: Vec<CommentEntry>,
}

#[utoipa::path(
    get,
    path = "/api/v1/clubs/{slug}/posts/{post_id}/comments",
    tag = "Engagement",
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    responses(
        (status = 200, description = "Comments, oldest first", body = CommentListResponse),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    let mut conn = state.db.get().await?;

    let data: Vec<CommentEntry> = diesel_async::RunQueryDsl::load(
        comments::table
            .inner_join(users::table.on(users::id.eq(comments::user_id)))
            .filter(comments::post_id.eq(&post.id))
            .order(comments::created_at.asc())
            .select((
                comments::id,
                comments::user_id,
                users::username,
                users::display_name,
                comments::body,
                comments::created_at,
            )),
        &mut conn,
    )
    .await?;

    Ok(Json(CommentListResponse { data }))
}

// ---------------------------------------------------------------------------
// DELETE /api/v1/clubs/:slug/posts/:post_id/comments/:comment_id
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/api/v1/clubs/{slug}/posts/{post_id}/comments/{comment_id}",
    tag = "Engagement",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
        ("comment_id" = String, Path, description = "Comment ID"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not the author or a moderator", body = ApiErrorBody),
        (status = 404, description = "Comment not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_comment(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<CommentPath>,
) -> Result<StatusCode, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    let mut conn = state.db.get().await?;

    let comment: Option<Comment> = diesel_async::RunQueryDsl::get_result(
        comments::table
            .filter(comments::id.eq(&path.comment_id))
            .filter(comments::post_id.eq(&post.id))
            .select(Comment::as_select()),
        &mut conn,
    )
    .await
    .optional()?;

    let comment = comment.ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.user_id != user_id {
        let membership = roles::get_membership(&state.db, &club.id, &user_id)
            .await?
            .ok_or_else(|| ApiError::forbidden("You must be a member of this club"))?;
        if roles::role_of(&membership) < Role::Moderator {
            return Err(ApiError::forbidden(
                "Only the author or a moderator can delete this comment",
            ));
        }
    }

    diesel_async::RunQueryDsl::execute(
        diesel::delete(comments::table.find(&comment.id)),
        &mut conn,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
