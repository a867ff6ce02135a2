//! Role resolution and enforcement.
//!
//! One predicate (`get_membership` + `Role` comparison) and one enforcement
//! wrapper (`require_role`) cover every handler; there is no separate
//! decorator/mixin split. Roles are recomputed per request, never cached.

use diesel::prelude::*;
use diesel::result::OptionalExtension;

use crate::db::pool::DbPool;
use crate::db::schema::memberships;
use crate::error::ApiError;
use crate::models::membership::Membership;

/// Club role, ordered by privilege: member < moderator < admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Member,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "member" => Some(Role::Member),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get a user's membership in a club, or `None` when they are not a member.
pub async fn get_membership(
    pool: &DbPool,
    club_id: &str,
    user_id: &str,
) -> Result<Option<Membership>, ApiError> {
    let mut conn = pool.get().await?;

    let membership: Option<Membership> = diesel_async::RunQueryDsl::get_result(
        memberships::table
            .find((club_id, user_id))
            .select(Membership::as_select()),
        &mut conn,
    )
    .await
    .optional()?;

    Ok(membership)
}

/// The role held by a membership row. Unknown stored values rank as plain
/// member rather than erroring.
pub fn role_of(membership: &Membership) -> Role {
    Role::parse(&membership.role).unwrap_or(Role::Member)
}

/// Require the caller to hold at least `minimum` in the club.
///
/// Returns the membership so handlers can reuse it without a second lookup.
pub async fn require_role(
    pool: &DbPool,
    club_id: &str,
    user_id: &str,
    minimum: Role,
) -> Result<Membership, ApiError> {
    let membership = get_membership(pool, club_id, user_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("You must be a member of this club"))?;

    if role_of(&membership) >= minimum {
        return Ok(membership);
    }

    Err(match minimum {
        Role::Moderator => ApiError::forbidden("You must be a moderator or admin of this club"),
        Role::Admin => ApiError::forbidden("You must be an admin of this club"),
        Role::Member => ApiError::forbidden("You must be a member of this club"),
    })
}

/// Check whether a user may publish the given post type in a club.
/// Blog posts take any membership; news takes moderator or admin.
pub async fn can_publish(
    pool: &DbPool,
    club_id: &str,
    user_id: &str,
    post_type: &str,
) -> Result<bool, ApiError> {
    let Some(membership) = get_membership(pool, club_id, user_id).await? else {
        return Ok(false);
    };

    if post_type == crate::models::post::TYPE_NEWS {
        Ok(role_of(&membership) >= Role::Moderator)
    } else {
        Ok(true)
    }
}
