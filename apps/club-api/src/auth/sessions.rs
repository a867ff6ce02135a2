//! Opaque bearer session tokens backed by the `sessions` table.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::result::OptionalExtension;
use rand::Rng;

use crate::db::pool::DbPool;
use crate::db::schema::sessions;
use crate::error::ApiError;
use crate::models::session::NewSession;

const TOKEN_LEN: usize = 48;

fn generate_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Create a session for a user and return the bearer token.
pub async fn create_session(
    pool: &DbPool,
    user_id: &str,
    ttl_seconds: i64,
) -> Result<String, ApiError> {
    let token = generate_token();
    let session = NewSession {
        id: clubify_common::id::prefixed_ulid(clubify_common::id::prefix::SESSION),
        user_id: user_id.to_string(),
        token: token.clone(),
        expires_at: Utc::now() + Duration::seconds(ttl_seconds),
    };

    let mut conn = pool.get().await?;

    diesel_async::RunQueryDsl::execute(
        diesel::insert_into(sessions::table).values(&session),
        &mut conn,
    )
    .await?;

    Ok(token)
}

/// Resolve a bearer token to the owning user ID.
///
/// Returns `None` for unknown, revoked, or expired tokens.
pub async fn lookup_session(pool: &DbPool, token: &str) -> Result<Option<String>, ApiError> {
    let mut conn = pool.get().await?;

    let user_id: Option<String> = diesel_async::RunQueryDsl::get_result(
        sessions::table
            .filter(sessions::token.eq(token))
            .filter(sessions::revoked.eq(false))
            .filter(sessions::expires_at.gt(Utc::now()))
            .select(sessions::user_id),
        &mut conn,
    )
    .await
    .optional()?;

    Ok(user_id)
}

/// Revoke the session holding this token. Unknown tokens are a no-op.
pub async fn revoke_session(pool: &DbPool, token: &str) -> Result<(), ApiError> {
    let mut conn = pool.get().await?;

    diesel_async::RunQueryDsl::execute(
        diesel::update(sessions::table.filter(sessions::token.eq(token)))
            .set(sessions::revoked.eq(true)),
        &mut conn,
    )
    .await?;

    Ok(())
}
