//! User domain type.

use chrono::{DateTime, Utc};

use bookbazar_core::{Email, UserId};

use super::session::CurrentUser;

/// A customer or staff account. The email is the login identifier.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
        }
    }
}
