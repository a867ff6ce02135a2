//! Club posts: blog and news entries, summaries, and the share card.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::{maybe_user_id, AuthUser};
use crate::db::pool::DbPool;
use crate::db::schema::{comments, likes, posts};
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::club::Club;
use crate::models::post::{NewPost, Post, PostDetailResponse, TYPE_BLOG, TYPE_NEWS};
use crate::roles::{self, Role};
use crate::routes::clubs::club_by_slug;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clubs/{slug}/posts", post(create_post).get(list_posts))
        .route(
            "/clubs/{slug}/posts/{post_id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/clubs/{slug}/posts/{post_id}/summarize", post(summarize_post))
        .route("/clubs/{slug}/posts/{post_id}/og-image", get(og_image))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostPath {
    pub slug: String,
    pub post_id: String,
}

/// Look up a post by ID within a club or 404.
pub async fn post_in_club(
    pool: &DbPool,
    club_id: &str,
    post_id: &str,
) -> Result<Post, ApiError> {
    let mut conn = pool.get().await?;

    let found: Option<Post> = diesel_async::RunQueryDsl::get_result(
        posts::table
            .filter(posts::id.eq(post_id))
            .filter(posts::club_id.eq(club_id))
            .select(Post::as_select()),
        &mut conn,
    )
    .await
    .optional()?;

    found.ok_or_else(|| ApiError::not_found("Post not found"))
}

fn render_markdown(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(body, options));
    out
}

fn validate_post_fields(title: &str, body: &str) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if title.is_empty() {
        errors.push(FieldError {
            field: "title".to_string(),
            message: "Title is required".to_string(),
        });
    } else if title.len() > 200 {
        errors.push(FieldError {
            field: "title".to_string(),
            message: "Title must be 200 characters or fewer".to_string(),
        });
    }
    if body.trim().is_empty() {
        errors.push(FieldError {
            field: "body".to_string(),
            message: "Body is required".to_string(),
        });
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

fn parse_post_type(raw: &str) -> Result<&'static str, ApiError> {
    match raw {
        TYPE_BLOG => Ok(TYPE_BLOG),
        TYPE_NEWS => Ok(TYPE_NEWS),
        _ => Err(ApiError::validation(vec![FieldError {
            field: "post_type".to_string(),
            message: "Post type must be \"blog\" or \"news\"".to_string(),
        }])),
    }
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/posts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub post_type: Option<String>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: Post,
    /// Set when the requested post type was downgraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/posts",
    tag = "Posts",
    security(("bearer" = [])),
    params(("slug" = String, Path, description = "Club slug")),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not a member", body = ApiErrorBody),
        (status = 404, description = "Club not found", body = ApiErrorBody),
    ),
)]
pub async fn create_post(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let club = club_by_slug(&state.db, &slug).await?;

    roles::require_role(&state.db, &club.id, &user_id, Role::Member).await?;

    let title = body.title.trim().to_string();
    validate_post_fields(&title, &body.body)?;

    let requested_type = parse_post_type(body.post_type.as_deref().unwrap_or(TYPE_BLOG))?;

    // The role check and the insert are separate queries, so the type is
    // re-derived from the caller's role at submit time rather than trusted
    // from the form.
    let post_type = if requested_type == TYPE_NEWS
        && !roles::can_publish(&state.db, &club.id, &user_id, TYPE_NEWS).await?
    {
        TYPE_BLOG
    } else {
        requested_type
    };

    let message = (post_type != requested_type).then(|| {
        "Only moderators and admins can publish news; posted as a blog entry instead.".to_string()
    });

    let now = Utc::now();
    let id = clubify_common::id::prefixed_ulid(clubify_common::id::prefix::POST);

    let mut conn = state.db.get().await?;

    let post: Post = diesel_async::RunQueryDsl::get_result(
        diesel::insert_into(posts::table)
            .values(NewPost {
                id: &id,
                club_id: &club.id,
                author_id: &user_id,
                title: &title,
                body: &body.body,
                post_type,
                is_published: body.is_published.unwrap_or(true),
                created_at: now,
                updated_at: now,
            })
            .returning(Post::as_returning()),
        &mut conn,
    )
    .await?;

    tracing::info!(post_id = %post.id, club_id = %club.id, post_type, "post created");

    // Pre-populate the summary cache off the request path. Losing the race
    // with an explicit summarize call is fine; both writers fill the same
    // still-empty slot.
    if state.config.summary_warm_cache {
        let warm_state = state.clone();
        let post_id = post.id.clone();
        let text = post.body.clone();
        tokio::spawn(async move {
            if let Err(e) = warm_summary_cache(&warm_state, &post_id, &text).await {
                tracing::warn!(post_id = %post_id, error = %e, "summary cache warm failed");
            }
        });
    }

    Ok((StatusCode::CREATED, Json(PostResponse { post, message })))
}

async fn warm_summary_cache(
    state: &AppState,
    post_id: &str,
    text: &str,
) -> Result<(), ApiError> {
    let outcome = state.summarizer.summarize(text).await;
    if outcome.fallback {
        // Truncations are never cached, so a later attempt can still
        // produce a real summary.
        return Ok(());
    }

    let mut conn = state.db.get().await?;

    diesel_async::RunQueryDsl::execute(
        diesel::update(
            posts::table
                .filter(posts::id.eq(post_id))
                .filter(posts::summary.is_null()),
        )
        .set(posts::summary.eq(&outcome.text)),
        &mut conn,
    )
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/posts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListPostsQuery {
    /// Filter by post type ("blog" or "news").
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub limit: Option<i64>,
    /// Post ID to page after, from a previous response.
    pub after: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostListResponse {
    pub data: Vec<Post>,
    pub has_more: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/clubs/{slug}/posts",
    tag = "Posts",
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("type" = Option<String>, Query, description = "Filter by post type"),
        ("limit" = Option<i64>, Query, description = "Page size, max 100"),
        ("after" = Option<String>, Query, description = "Cursor: post ID to page after"),
    ),
    responses(
        (status = 200, description = "Published posts, newest first", body = PostListResponse),
        (status = 404, description = "Club not found", body = ApiErrorBody),
    ),
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let club = club_by_slug(&state.db, &slug).await?;

    if let Some(ref t) = query.post_type {
        parse_post_type(t)?;
    }

    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let mut conn = state.db.get().await?;

    let mut q = posts::table
        .filter(posts::club_id.eq(&club.id))
        .filter(posts::is_published.eq(true))
        .order(posts::created_at.desc())
        .limit(limit + 1)
        .select(Post::as_select())
        .into_boxed();

    if let Some(ref t) = query.post_type {
        q = q.filter(posts::post_type.eq(t.clone()));
    }

    if let Some(ref after) = query.after {
        let cursor: Option<chrono::DateTime<Utc>> = diesel_async::RunQueryDsl::get_result(
            posts::table
                .filter(posts::id.eq(after))
                .select(posts::created_at),
            &mut conn,
        )
        .await
        .optional()?;

        if let Some(cursor) = cursor {
            q = q.filter(posts::created_at.lt(cursor));
        }
    }

    let mut data: Vec<Post> = diesel_async::RunQueryDsl::load(q, &mut conn).await?;

    let has_more = data.len() as i64 > limit;
    data.truncate(limit as usize);

    Ok(Json(PostListResponse { data, has_more }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/posts/:post_id
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/clubs/{slug}/posts/{post_id}",
    tag = "Posts",
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    responses(
        (status = 200, description = "Post detail with rendered body", body = PostDetailResponse),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
    headers: HeaderMap,
) -> Result<Json<PostDetailResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    // Drafts are visible to the author and club staff only; everyone else
    // gets the same 404 as a missing post.
    if !post.is_published {
        let viewer = maybe_user_id(&state, &headers).await;
        let allowed = match viewer {
            Some(ref uid) if *uid == post.author_id => true,
            Some(ref uid) => roles::get_membership(&state.db, &club.id, uid)
                .await?
                .map(|m| roles::role_of(&m) >= Role::Moderator)
                .unwrap_or(false),
            None => false,
        };
        if !allowed {
            return Err(ApiError::not_found("Post not found"));
        }
    }

    let mut conn = state.db.get().await?;

    let like_count: i64 = diesel_async::RunQueryDsl::get_result(
        likes::table
            .filter(likes::post_id.eq(&post.id))
            .count(),
        &mut conn,
    )
    .await?;

    let comment_count: i64 = diesel_async::RunQueryDsl::get_result(
        comments::table
            .filter(comments::post_id.eq(&post.id))
            .count(),
        &mut conn,
    )
    .await?;

    let body_html = render_markdown(&post.body);

    Ok(Json(PostDetailResponse {
        post,
        body_html,
        like_count,
        comment_count,
    }))
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/clubs/:slug/posts/:post_id
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub post_type: Option<String>,
    pub is_published: Option<bool>,
}

#[utoipa::path(
    patch,
    path = "/api/v1/clubs/{slug}/posts/{post_id}",
    tag = "Posts",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Validation failed", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not the author or a moderator", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn update_post(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    require_author_or_moderator(&state, &club, &post, &user_id).await?;

    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .unwrap_or(&post.title)
        .to_string();
    let new_body = body.body.as_deref().unwrap_or(&post.body).to_string();
    validate_post_fields(&title, &new_body)?;

    // Same submit-time rule as creation: the stored type reflects what the
    // editor is allowed to publish, not what the request claims.
    let requested_type = match body.post_type.as_deref() {
        Some(raw) => parse_post_type(raw)?,
        None => {
            if post.post_type == TYPE_NEWS {
                TYPE_NEWS
            } else {
                TYPE_BLOG
            }
        }
    };
    let post_type = if requested_type == TYPE_NEWS
        && !roles::can_publish(&state.db, &club.id, &user_id, TYPE_NEWS).await?
    {
        TYPE_BLOG
    } else {
        requested_type
    };
    let message = (post_type != requested_type).then(|| {
        "Only moderators and admins can publish news; saved as a blog entry instead.".to_string()
    });

    // A changed body invalidates the cached summary.
    let body_changed = new_body != post.body;

    let mut conn = state.db.get().await?;

    let updated: Post = diesel_async::RunQueryDsl::get_result(
        diesel::update(posts::table.find(&post.id)).set((
            posts::title.eq(&title),
            posts::body.eq(&new_body),
            posts::post_type.eq(post_type),
            posts::is_published.eq(body.is_published.unwrap_or(post.is_published)),
            posts::summary.eq(if body_changed {
                None
            } else {
                post.summary.clone()
            }),
            posts::updated_at.eq(Utc::now()),
        )),
        &mut conn,
    )
    .await?;

    Ok(Json(PostResponse {
        post: updated,
        message,
    }))
}

// ---------------------------------------------------------------------------
// DELETE /api/v1/clubs/:slug/posts/:post_id
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/api/v1/clubs/{slug}/posts/{post_id}",
    tag = "Posts",
    security(("bearer" = [])),
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not the author or a moderator", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_post(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
) -> Result<StatusCode, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    require_author_or_moderator(&state, &club, &post, &user_id).await?;

    let mut conn = state.db.get().await?;

    diesel_async::RunQueryDsl::execute(diesel::delete(posts::table.find(&post.id)), &mut conn)
        .await?;

    tracing::info!(post_id = %post.id, "post deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Authors may edit their own posts; moderators and admins may edit any
/// post in the club.
async fn require_author_or_moderator(
    state: &AppState,
    club: &Club,
    post: &Post,
    user_id: &str,
) -> Result<(), ApiError> {
    if post.author_id == user_id {
        return Ok(());
    }

    let membership = roles::get_membership(&state.db, &club.id, user_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("You must be a member of this club"))?;

    if roles::role_of(&membership) >= Role::Moderator {
        return Ok(());
    }

    Err(ApiError::forbidden(
        "Only the author or a moderator can modify this post",
    ))
}

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/posts/:post_id/summarize
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SummarizeQuery {
    /// "summarize" (default) or "original" to get the full text back.
    pub action: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
    /// True when the text is a truncated excerpt, not a model summary.
    pub fallback: bool,
    /// True when the summary was served from the stored cache.
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/clubs/{slug}/posts/{post_id}/summarize",
    tag = "Posts",
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
        ("action" = Option<String>, Query, description = "\"summarize\" or \"original\""),
    ),
    responses(
        (status = 200, description = "Summary or original text", body = SummaryResponse),
        (status = 400, description = "Unknown action", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn summarize_post(
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
    Query(query): Query<SummarizeQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    match query.action.as_deref().unwrap_or("summarize") {
        "original" => {
            return Ok(Json(SummaryResponse {
                summary: post.body,
                fallback: false,
                cached: false,
                message: None,
            }));
        }
        "summarize" => {}
        other => {
            return Err(ApiError::bad_request(format!("Unknown action: {other}")));
        }
    }

    // Cache hit: the stored summary is returned byte for byte, with no
    // backend call.
    if let Some(summary) = post.summary {
        return Ok(Json(SummaryResponse {
            summary,
            fallback: false,
            cached: true,
            message: None,
        }));
    }

    let outcome = state.summarizer.summarize(&post.body).await;

    if !outcome.fallback {
        let mut conn = state.db.get().await?;
        diesel_async::RunQueryDsl::execute(
            diesel::update(posts::table.find(&post.id)).set(posts::summary.eq(&outcome.text)),
            &mut conn,
        )
        .await?;
    }

    Ok(Json(SummaryResponse {
        summary: outcome.text,
        fallback: outcome.fallback,
        cached: false,
        message: outcome.detail,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/posts/:post_id/og-image
// ---------------------------------------------------------------------------

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[utoipa::path(
    get,
    path = "/api/v1/clubs/{slug}/posts/{post_id}/og-image",
    tag = "Posts",
    params(
        ("slug" = String, Path, description = "Club slug"),
        ("post_id" = String, Path, description = "Post ID"),
    ),
    responses(
        (status = 200, description = "SVG share card", content_type = "image/svg+xml"),
        (status = 404, description = "Post not found", body = ApiErrorBody),
    ),
)]
pub async fn og_image(
    State(state): State<AppState>,
    Path(path): Path<PostPath>,
) -> Result<Response, ApiError> {
    let club = club_by_slug(&state.db, &path.slug).await?;
    let post = post_in_club(&state.db, &club.id, &path.post_id).await?;

    let club_name = xml_escape(&truncate_label(&club.name, 40));
    let title = xml_escape(&truncate_label(&post.title, 70));
    let color = xml_escape(&club.color);

    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="630" viewBox="0 0 1200 630">
  <rect width="1200" height="630" fill="{color}"/>
  <rect x="40" y="40" width="1120" height="550" rx="24" fill="#ffffff" fill-opacity="0.85"/>
  <text x="90" y="160" font-family="Georgia, serif" font-size="36" fill="#4a4a4a">{club_name}</text>
  <text x="90" y="280" font-family="Georgia, serif" font-size="56" font-weight="bold" fill="#1a1a1a">{title}</text>
  <text x="90" y="540" font-family="Georgia, serif" font-size="28" fill="#6a6a6a">ClubiFy</text>
</svg>
"##
    );

    // The card only depends on post title and club styling, so a day of
    // client-side caching is safe.
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        svg,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_renders_basic_structure() {
        let html = render_markdown("# Heading\n\nSome **bold** text.");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_xml_escape_covers_markup_characters() {
        assert_eq!(
            xml_escape(r#"<Chess & "Friends">"#),
            "&lt;Chess &amp; &quot;Friends&quot;&gt;"
        );
    }

    #[test]
    fn test_truncate_label_char_based() {
        assert_eq!(truncate_label("short", 10), "short");
        let out = truncate_label(&"é".repeat(20), 10);
        assert_eq!(out.chars().count(), 11);
        assert!(out.ends_with('…'));
    }
}
