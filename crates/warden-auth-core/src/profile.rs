//! User row to public profile

use warden_db::UserRow;
use warden_types::{Role, UserId, UserProfile};

/// Public fields of a user row
pub fn profile_from_row(row: &UserRow) -> UserProfile {
    let role = row.role.parse::<Role>().unwrap_or_else(|_| {
        tracing::warn!(user_id = row.id, role = %row.role, "Unknown role, treating as member");
        Role::Member
    });

    UserProfile {
        id: UserId(row.id),
        email: row.email.clone(),
        username: row.username.clone(),
        role,
        is_active: row.is_active,
        is_admin: row.is_admin,
        daily_quota: row.daily_quota,
        created_at: row.created_at,
    }
}
