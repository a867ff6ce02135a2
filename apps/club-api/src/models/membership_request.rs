use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::membership_requests;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

#[derive(Debug, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = membership_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipRequest {
    pub id: String,
    pub club_id: String,
    pub user_id: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = membership_requests)]
pub struct NewMembershipRequest<'a> {
    pub id: &'a str,
    pub club_id: &'a str,
    pub user_id: &'a str,
    pub status: &'a str,
    pub requested_at: DateTime<Utc>,
}
