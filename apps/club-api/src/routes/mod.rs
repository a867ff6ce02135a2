pub mod auth;
pub mod clubs;
pub mod engagement;
pub mod health;
pub mod memberships;
pub mod posts;

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().merge(health::router()).nest(
        "/api/v1",
        auth::router()
            .merge(clubs::router())
            .merge(memberships::router())
            .merge(posts::router())
            .merge(engagement::router()),
    )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        auth::get_me,
        // Clubs
        clubs::create_club,
        clubs::list_clubs,
        clubs::get_club,
        clubs::update_club,
        // Memberships
        memberships::request_membership,
        memberships::list_members,
        memberships::list_requests,
        memberships::approve_request,
        memberships::reject_request,
        memberships::promote_member,
        memberships::demote_member,
        memberships::remove_member,
        // Posts
        posts::create_post,
        posts::list_posts,
        posts::get_post,
        posts::update_post,
        posts::delete_post,
        posts::summarize_post,
        posts::og_image,
        // Engagement
        engagement::toggle_like,
        engagement::toggle_bookmark,
        engagement::add_comment,
        engagement::list_comments,
        engagement::delete_comment,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Models
            crate::models::user::UserResponse,
            crate::models::club::Club,
            crate::models::membership::Membership,
            crate::models::membership::MemberEntry,
            crate::models::membership_request::MembershipRequest,
            crate::models::post::Post,
            crate::models::post::PostDetailResponse,
            crate::models::comment::Comment,
            // Route request/response types
            health::HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::SessionResponse,
            clubs::CreateClubRequest,
            clubs::UpdateClubRequest,
            clubs::ClubResponse,
            memberships::JoinResponse,
            memberships::MemberListResponse,
            memberships::RequestEntry,
            memberships::RequestListResponse,
            memberships::ReviewResponse,
            memberships::MemberUpdateResponse,
            posts::CreatePostRequest,
            posts::UpdatePostRequest,
            posts::PostResponse,
            posts::PostListResponse,
            posts::SummaryResponse,
            engagement::ToggleResponse,
            engagement::AddCommentRequest,
            engagement::CommentEntry,
            engagement::CommentListResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Auth", description = "Accounts and sessions"),
        (name = "Clubs", description = "Club management"),
        (name = "Memberships", description = "Membership requests and roles"),
        (name = "Posts", description = "Blog and news posts"),
        (name = "Engagement", description = "Likes, bookmarks, and comments"),
    )
)]
pub struct ApiDoc;
