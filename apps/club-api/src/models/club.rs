use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::clubs;

/// Light pastel card colors, assigned at creation when the client does not
/// pick one.
pub const PASTEL_COLORS: [&str; 11] = [
    "#FFE5E5", // Light Pink
    "#E5F0FF", // Light Blue
    "#E5FFE5", // Light Green
    "#FFF5E5", // Light Orange
    "#F5E5FF", // Light Purple
    "#E5FFFF", // Light Cyan
    "#FFFFE5", // Light Yellow
    "#FFE5F5", // Light Magenta
    "#E5FFF0", // Light Mint
    "#FFF0E5", // Light Peach
    "#E5F5FF", // Light Sky
];

#[derive(Debug, Queryable, Selectable, Serialize, ToSchema)]
#[diesel(table_name = clubs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Club {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub color: String,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = clubs)]
pub struct NewClub<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
    pub color: &'a str,
    pub logo_url: Option<&'a str>,
    pub banner_url: Option<&'a str>,
    pub created_by: &'a str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = clubs)]
pub struct UpdateClub {
    pub description: Option<String>,
    pub logo_url: Option<Option<String>>,
    pub banner_url: Option<Option<String>>,
}
