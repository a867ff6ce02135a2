#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;

use club_api::config::Config;
use club_api::summarize::service::SummaryService;
use club_api::AppState;

/// Build the full application router wired to a test state, or `None` when
/// no database is configured (the suite then skips itself).
pub async fn try_test_app() -> Option<(Router, AppState)> {
    let env_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(env_path);

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    }

    let mut config = Config::from_env();
    config.database_url = with_test_db_suffix(&config.database_url);
    // Background cache warming would race with assertions.
    config.summary_warm_cache = false;

    let db = club_api::db::pool::connect(&config.database_url, config.db_pool_size).await;

    // No remote backend in tests, so summaries fall back deterministically.
    let summarizer = Arc::new(SummaryService::new(vec![]));

    let state = AppState {
        db,
        config: Arc::new(config),
        summarizer,
    };
    let app = club_api::routes::router().with_state(state.clone());

    Some((app, state))
}

/// Same rewrite the `club-migrate --test` flag applies, so the suite runs
/// against the migrated `_test` database.
fn with_test_db_suffix(database_url: &str) -> String {
    let (base, query) = match database_url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (database_url, None),
    };

    let Some((prefix, db_name)) = base.rsplit_once('/') else {
        return database_url.to_string();
    };
    if db_name.is_empty() || db_name.ends_with("_test") {
        return database_url.to_string();
    }

    let mut updated = format!("{prefix}/{db_name}_test");
    if let Some(query) = query {
        updated.push('?');
        updated.push_str(query);
    }
    updated
}

/// A username/club name that won't collide across test runs.
pub fn unique_name(prefix: &str) -> String {
    let tail = clubify_common::id::prefixed_ulid("t");
    format!("{prefix}_{}", tail[2..12].to_lowercase())
}

/// Register a fresh user and return (token, user_id).
pub async fn register_test_user(server: &TestServer, prefix: &str) -> (String, String) {
    let username = unique_name(prefix);
    let resp = server
        .post("/api/v1/auth/register")
        .json(&serde_json::json!({
            "username": username,
            "password": "correct-horse-battery",
            "display_name": "Test User",
        }))
        .await;
    resp.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = resp.json();
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Create a club as the token holder; returns the response body.
pub async fn create_test_club(
    server: &TestServer,
    token: &str,
    name: &str,
) -> serde_json::Value {
    let resp = server
        .post("/api/v1/clubs")
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&serde_json::json!({
            "name": name,
            "description": "A club for integration tests",
        }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    resp.json()
}

/// Submit a join request as `member_token` and approve it as `admin_token`.
pub async fn join_and_approve(
    server: &TestServer,
    admin_token: &str,
    member_token: &str,
    slug: &str,
) {
    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/join"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let request_id = resp.json::<serde_json::Value>()["request"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/requests/{request_id}/approve"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status_ok();
}

/// Create a post in a club; returns the response body.
pub async fn create_test_post(
    server: &TestServer,
    token: &str,
    slug: &str,
    title: &str,
    post_type: &str,
) -> serde_json::Value {
    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/posts"))
        .add_header(AUTHORIZATION, format!("Bearer {token}"))
        .json(&serde_json::json!({
            "title": title,
            "body": "Some body text for the post, long enough to be realistic.",
            "post_type": post_type,
        }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    resp.json()
}

/// Delete a test user (CASCADE removes sessions, memberships, posts).
pub async fn cleanup_user(db: &club_api::db::pool::DbPool, user_id: &str) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    let mut conn = db.get().await.expect("pool");
    diesel::delete(
        club_api::db::schema::users::table.filter(club_api::db::schema::users::id.eq(user_id)),
    )
    .execute(&mut conn)
    .await
    .ok();
}

/// Delete a test club (CASCADE removes memberships, requests, posts).
pub async fn cleanup_club(db: &club_api::db::pool::DbPool, club_id: &str) {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    let mut conn = db.get().await.expect("pool");
    diesel::delete(
        club_api::db::schema::clubs::table.filter(club_api::db::schema::clubs::id.eq(club_id)),
    )
    .execute(&mut conn)
    .await
    .ok();
}
