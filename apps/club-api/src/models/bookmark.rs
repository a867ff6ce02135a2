use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::schema::bookmarks;

#[derive(Debug, Insertable)]
#[diesel(table_name = bookmarks)]
pub struct NewBookmark<'a> {
    pub post_id: &'a str,
    pub user_id: &'a str,
    pub created_at: DateTime<Utc>,
}
