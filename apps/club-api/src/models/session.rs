use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::schema::sessions;

/// Insertable session row. Lookups select the owning `user_id` directly and
/// never load whole rows, so there is no queryable counterpart.
#[derive(Debug, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
