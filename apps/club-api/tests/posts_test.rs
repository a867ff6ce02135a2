mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/posts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn member_submitting_news_gets_a_blog_post() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (member_token, member_id) = common::register_test_user(&server, "scribe").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Press")).await;
    let slug = club["slug"].as_str().unwrap();

    common::join_and_approve(&server, &admin_token, &member_token, slug).await;

    let body = common::create_test_post(&server, &member_token, slug, "Big Scoop", "news").await;
    assert_eq!(body["post_type"], "blog");
    assert!(body["message"].as_str().unwrap().contains("moderators"));

    // A moderator keeps the news type.
    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/members/{member_id}/promote"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status_ok();

    let body = common::create_test_post(&server, &member_token, slug, "Real News", "news").await;
    assert_eq!(body["post_type"], "news");
    assert!(body.get("message").is_none());

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &member_id).await;
}

#[tokio::test]
async fn non_members_cannot_post() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (outsider_token, outsider_id) = common::register_test_user(&server, "outsider").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Closed")).await;
    let slug = club["slug"].as_str().unwrap();

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/posts"))
        .add_header(AUTHORIZATION, format!("Bearer {outsider_token}"))
        .json(&serde_json::json!({ "title": "Nope", "body": "text" }))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &outsider_id).await;
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/posts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_list_filters_by_type_and_paginates() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Gazette")).await;
    let slug = club["slug"].as_str().unwrap();

    for i in 0..3 {
        common::create_test_post(&server, &admin_token, slug, &format!("Blog {i}"), "blog").await;
    }
    common::create_test_post(&server, &admin_token, slug, "Announcement", "news").await;

    let resp = server.get(&format!("/api/v1/clubs/{slug}/posts?type=news")).await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["post_type"], "news");

    let resp = server.get(&format!("/api/v1/clubs/{slug}/posts?limit=2")).await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], true);

    let after = body["data"][1]["id"].as_str().unwrap();
    let resp = server
        .get(&format!("/api/v1/clubs/{slug}/posts?limit=2&after={after}"))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["has_more"], false);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/posts/:post_id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_detail_renders_markdown_and_counts() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Readers")).await;
    let slug = club["slug"].as_str().unwrap();

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/posts"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .json(&serde_json::json!({
            "title": "Formatted",
            "body": "# Minutes\n\nSome **important** notes.",
        }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let post_id = resp.json::<serde_json::Value>()["id"].as_str().unwrap().to_string();

    let resp = server
        .get(&format!("/api/v1/clubs/{slug}/posts/{post_id}"))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert!(body["body_html"].as_str().unwrap().contains("<h1>"));
    assert_eq!(body["like_count"], 0);
    assert_eq!(body["comment_count"], 0);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
}

#[tokio::test]
async fn unpublished_posts_are_hidden_from_the_public() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Drafts")).await;
    let slug = club["slug"].as_str().unwrap();

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/posts"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .json(&serde_json::json!({
            "title": "Draft",
            "body": "Not ready yet.",
            "is_published": false,
        }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let post_id = resp.json::<serde_json::Value>()["id"].as_str().unwrap().to_string();

    // Anonymous viewers see a 404; the author still sees the draft.
    let resp = server
        .get(&format!("/api/v1/clubs/{slug}/posts/{post_id}"))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);

    let resp = server
        .get(&format!("/api/v1/clubs/{slug}/posts/{post_id}"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status_ok();

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/clubs/:slug/posts/:post_id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_reapplies_the_news_rule() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (member_token, member_id) = common::register_test_user(&server, "editor").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Herald")).await;
    let slug = club["slug"].as_str().unwrap();

    common::join_and_approve(&server, &admin_token, &member_token, slug).await;

    let post = common::create_test_post(&server, &member_token, slug, "Mine", "blog").await;
    let post_id = post["id"].as_str().unwrap();

    // A plain member cannot upgrade their own post to news on edit.
    let resp = server
        .patch(&format!("/api/v1/clubs/{slug}/posts/{post_id}"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .json(&serde_json::json!({ "post_type": "news" }))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<serde_json::Value>()["post_type"], "blog");

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &member_id).await;
}

#[tokio::test]
async fn only_author_or_moderator_can_edit_or_delete() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (author_token, author_id) = common::register_test_user(&server, "author").await;
    let (other_token, other_id) = common::register_test_user(&server, "bystander").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Forum")).await;
    let slug = club["slug"].as_str().unwrap();

    common::join_and_approve(&server, &admin_token, &author_token, slug).await;
    common::join_and_approve(&server, &admin_token, &other_token, slug).await;

    let post = common::create_test_post(&server, &author_token, slug, "Owned", "blog").await;
    let post_id = post["id"].as_str().unwrap();

    let resp = server
        .delete(&format!("/api/v1/clubs/{slug}/posts/{post_id}"))
        .add_header(AUTHORIZATION, format!("Bearer {other_token}"))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);

    // Club staff can delete someone else's post.
    let resp = server
        .delete(&format!("/api/v1/clubs/{slug}/posts/{post_id}"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status(StatusCode::NO_CONTENT);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &author_id).await;
    common::cleanup_user(&state.db, &other_id).await;
}

// ---------------------------------------------------------------------------
// GET /api/v1/clubs/:slug/posts/:post_id/og-image
// ---------------------------------------------------------------------------

#[tokio::test]
async fn og_image_is_cacheable_svg() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Artists")).await;
    let slug = club["slug"].as_str().unwrap();

    let post = common::create_test_post(&server, &admin_token, slug, "Exhibit <& Co>", "blog").await;
    let post_id = post["id"].as_str().unwrap();

    let resp = server
        .get(&format!("/api/v1/clubs/{slug}/posts/{post_id}/og-image"))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.header("content-type"), "image/svg+xml");
    assert_eq!(resp.header("cache-control"), "public, max-age=86400");

    let svg = resp.text();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("Exhibit &lt;&amp; Co&gt;"));

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
}
