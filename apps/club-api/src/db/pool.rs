//! Async Postgres connection pooling.

use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

pub type DbPool = Pool<AsyncPgConnection>;

/// Build the connection pool the service runs on. `max_size` comes from
/// `Config::db_pool_size`; sizing it above the Postgres `max_connections`
/// budget just moves the queueing into the database.
pub async fn connect(database_url: &str, max_size: usize) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

    let pool = Pool::builder(manager)
        .max_size(max_size)
        .build()
        .expect("failed to build connection pool");

    tracing::info!(max_size, "database pool created");

    pool
}
