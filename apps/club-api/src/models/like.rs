use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::schema::likes;

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike<'a> {
    pub post_id: &'a str,
    pub user_id: &'a str,
    pub created_at: DateTime<Utc>,
}
