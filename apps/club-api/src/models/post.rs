use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::posts;

pub const TYPE_BLOG: &str = "blog";
pub const TYPE_NEWS: &str = "news";

#[derive(Debug, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: String,
    pub club_id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub post_type: String,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost<'a> {
    pub id: &'a str,
    pub club_id: &'a str,
    pub author_id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub post_type: &'a str,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post detail enriched with rendered body and engagement counts.
#[derive(Debug, Serialize, ToSchema)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: Post,
    pub body_html: String,
    pub like_count: i64,
    pub comment_count: i64,
}
