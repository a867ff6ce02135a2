use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::memberships;

#[derive(Debug, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Membership {
    pub club_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = memberships)]
pub struct NewMembership<'a> {
    pub club_id: &'a str,
    pub user_id: &'a str,
    pub role: &'a str,
    pub joined_at: DateTime<Utc>,
}

/// Member list entry enriched with user profile fields.
#[derive(Debug, Queryable, Serialize, ToSchema)]
pub struct MemberEntry {
    pub club_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub username: String,
    pub display_name: String,
}
