mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;

// ---------------------------------------------------------------------------
// POST /api/v1/clubs/:slug/join
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_creates_a_pending_request_once() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (member_token, member_id) = common::register_test_user(&server, "joiner").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Runners")).await;
    let slug = club["slug"].as_str().unwrap();

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/join"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await;
    resp.assert_status(StatusCode::CREATED);
    assert_eq!(resp.json::<serde_json::Value>()["request"]["status"], "pending");

    // A second submit is informational, not a new request.
    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/join"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert!(body["message"].as_str().unwrap().contains("already pending"));

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &member_id).await;
}

#[tokio::test]
async fn join_as_existing_member_is_a_no_op() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Bakers")).await;
    let slug = club["slug"].as_str().unwrap();

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/join"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert!(body["message"].as_str().unwrap().contains("already a member"));
    assert!(body.get("request").is_none());

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
}

// ---------------------------------------------------------------------------
// Approve / reject
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approve_creates_membership_and_is_not_repeatable() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (member_token, member_id) = common::register_test_user(&server, "applicant").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Chess")).await;
    let slug = club["slug"].as_str().unwrap();

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
    let body: serde_json::Value = resp.json();
    assert_eq!(body["request"]["status"], "approved");
    assert_eq!(body["request"]["reviewed_by"], admin_id);

    // The new member can now see the member list.
    let resp = server
        .get(&format!("/api/v1/clubs/{slug}/members"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await;
    resp.assert_status_ok();
    let members = resp.json::<serde_json::Value>()["data"]
        .as_array()
        .unwrap()
        .len();
    assert_eq!(members, 2);

    // Approving the same request again finds nothing pending.
    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/requests/{request_id}/approve"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &member_id).await;
}

#[tokio::test]
async fn rejected_applicant_can_request_again() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (member_token, member_id) = common::register_test_user(&server, "retry").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Choir")).await;
    let slug = club["slug"].as_str().unwrap();

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
        .post(&format!("/api/v1/clubs/{slug}/requests/{request_id}/reject"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<serde_json::Value>()["request"]["status"], "rejected");

    // Rejection does not block a fresh request.
    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/join"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await;
    resp.assert_status(StatusCode::CREATED);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &member_id).await;
}

#[tokio::test]
async fn request_review_requires_admin() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (member_token, member_id) = common::register_test_user(&server, "member").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Anglers")).await;
    let slug = club["slug"].as_str().unwrap();

    common::join_and_approve(&server, &admin_token, &member_token, slug).await;

    let resp = server
        .get(&format!("/api/v1/clubs/{slug}/requests"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &member_id).await;
}

// ---------------------------------------------------------------------------
// Promote / demote / remove
// ---------------------------------------------------------------------------

#[tokio::test]
async fn promote_and_demote_round_trip() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (member_token, member_id) = common::register_test_user(&server, "riser").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Coders")).await;
    let slug = club["slug"].as_str().unwrap();

    common::join_and_approve(&server, &admin_token, &member_token, slug).await;

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/members/{member_id}/promote"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<serde_json::Value>()["membership"]["role"], "moderator");

    // Promoting again is an informational no-op.
    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/members/{member_id}/promote"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<serde_json::Value>()["membership"]["role"], "moderator");

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/members/{member_id}/demote"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<serde_json::Value>()["membership"]["role"], "member");

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &member_id).await;
}

#[tokio::test]
async fn admins_are_protected_from_role_changes_and_removal() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Writers")).await;
    let slug = club["slug"].as_str().unwrap();

    let resp = server
        .post(&format!("/api/v1/clubs/{slug}/members/{admin_id}/demote"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    // Self-removal is refused before the admin check even applies.
    let resp = server
        .delete(&format!("/api/v1/clubs/{slug}/members/{admin_id}"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
}

#[tokio::test]
async fn admin_can_remove_a_member() {
    let Some((app, state)) = common::try_test_app().await else {
        return;
    };
    let server = TestServer::new(app).unwrap();

    let (admin_token, admin_id) = common::register_test_user(&server, "admin").await;
    let (member_token, member_id) = common::register_test_user(&server, "leaver").await;
    let club = common::create_test_club(&server, &admin_token, &common::unique_name("Hikers")).await;
    let slug = club["slug"].as_str().unwrap();

    common::join_and_approve(&server, &admin_token, &member_token, slug).await;

    let resp = server
        .delete(&format!("/api/v1/clubs/{slug}/members/{member_id}"))
        .add_header(AUTHORIZATION, format!("Bearer {admin_token}"))
        .await;
    resp.assert_status(StatusCode::NO_CONTENT);

    // The removed user no longer passes the member guard.
    let resp = server
        .get(&format!("/api/v1/clubs/{slug}/members"))
        .add_header(AUTHORIZATION, format!("Bearer {member_token}"))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);

    common::cleanup_club(&state.db, club["id"].as_str().unwrap()).await;
    common::cleanup_user(&state.db, &admin_id).await;
    common::cleanup_user(&state.db, &member_id).await;
}
