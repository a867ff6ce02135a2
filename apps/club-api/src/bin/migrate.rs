//! Applies the embedded SQL migrations to the configured database.
//!
//! `cargo run -p club-api --bin club-migrate` migrates the database named by
//! `DATABASE_URL` (loaded from the environment or `.env`). Passing `--test`
//! retargets the same server at a `_test`-suffixed database, matching what
//! the integration suite connects to.

use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

fn main() {
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    let use_test_db = std::env::args().any(|arg| arg == "--test");
    let database_url = resolve_database_url(use_test_db);

    println!("Connecting to database...");
    let mut conn =
        PgConnection::establish(&database_url).expect("failed to connect to database");

    println!("Running pending migrations...");
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .expect("failed to run migrations");

    if applied.is_empty() {
        println!("No pending migrations.");
        return;
    }
    for migration in &applied {
        println!("  Applied: {migration}");
    }
    println!("{} migration(s) applied.", applied.len());
}

fn resolve_database_url(use_test_db: bool) -> String {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL env var is required");
    if use_test_db {
        with_test_db_suffix(&url)
    } else {
        url
    }
}

/// Rewrite `.../clubify` to `.../clubify_test`, preserving any query string.
/// Already-suffixed URLs pass through unchanged.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_appended_to_db_name() {
        assert_eq!(
            with_test_db_suffix("postgres://u:p@localhost:5432/clubify"),
            "postgres://u:p@localhost:5432/clubify_test"
        );
    }

    #[test]
    fn test_query_string_preserved() {
        assert_eq!(
            with_test_db_suffix("postgres://localhost/clubify?sslmode=disable"),
            "postgres://localhost/clubify_test?sslmode=disable"
        );
    }

    #[test]
    fn test_already_suffixed_left_alone() {
        assert_eq!(
            with_test_db_suffix("postgres://localhost/clubify_test"),
            "postgres://localhost/clubify_test"
        );
    }
}
