//! Profile repository.

use sqlx::PgPool;

use bookbazar_core::UserId;

use super::RepositoryError;
use crate::models::{Profile, ProfileUpdate};

const PROFILE_COLUMNS: &str = "user_id, first_name, last_name, phone, birthdate, profile_photo, \
     newsletter, order_updates, promotions, language, currency, favorite_genres, \
     stripe_customer_id, one_click_purchasing";

/// A profile with its owner's email, for the admin list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileWithEmail {
    #[sqlx(flatten)]
    pub profile: Profile,
    pub email: String,
}

/// Bulk actions from the admin profile list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileAction {
    EnableNewsletter,
    DisableNewsletter,
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's profile, created with defaults if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user: UserId) -> Result<Profile, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r"
            INSERT INTO storefront.user_profile (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(user)
        .fetch_one(self.pool)
        .await?;
        Ok(profile)
    }

    /// Save the editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        user: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE storefront.user_profile SET
                first_name = $2, last_name = $3, phone = $4, birthdate = $5,
                newsletter = $6, order_updates = $7, promotions = $8,
                language = $9, currency = $10, favorite_genres = $11, updated_at = NOW()
            WHERE user_id = $1
            ",
        )
        .bind(user)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(update.birthdate)
        .bind(update.newsletter)
        .bind(update.order_updates)
        .bind(update.promotions)
        .bind(update.language)
        .bind(update.currency)
        .bind(&update.favorite_genres)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Replace or clear the stored photo path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_photo(&self, user: UserId, path: Option<&str>) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE storefront.user_profile SET profile_photo = $2, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user)
        .bind(path)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remember a Stripe customer and turn on one-click purchasing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_stripe_customer(
        &self,
        user: UserId,
        customer_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE storefront.user_profile
            SET stripe_customer_id = $2, one_click_purchasing = TRUE, updated_at = NOW()
            WHERE user_id = $1
            ",
        )
        .bind(user)
        .bind(customer_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Every profile with its email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(&self) -> Result<Vec<ProfileWithEmail>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProfileWithEmail>(
            r"
            SELECT p.user_id, p.first_name, p.last_name, p.phone, p.birthdate, p.profile_photo,
                   p.newsletter, p.order_updates, p.promotions, p.language, p.currency,
                   p.favorite_genres, p.stripe_customer_id, p.one_click_purchasing,
                   u.email
            FROM storefront.user_profile p
            JOIN storefront.user u ON u.id = p.user_id
            ORDER BY u.email
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Apply an admin action; returns the number of profiles changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn apply_action(
        &self,
        action: ProfileAction,
        ids: &[i32],
    ) -> Result<u64, RepositoryError> {
        let on = matches!(action, ProfileAction::EnableNewsletter);
        let result = sqlx::query(
            "UPDATE storefront.user_profile SET newsletter = $2, updated_at = NOW() WHERE user_id = ANY($1)",
        )
        .bind(ids)
        .bind(on)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
