//! Address repository.
//!
//! A partial unique index allows one default per user and address type, so
//! making an address the default always clears the old one first, inside
//! the same transaction.

use sqlx::{PgConnection, PgPool};

use bookbazar_core::{AddressId, AddressType, UserId};

use super::RepositoryError;
use crate::models::{Address, NewAddress};

const ADDRESS_COLUMNS: &str = "id, user_id, street_address, apartment_address, country, \
     zip_code, address_type, is_default, created_at";

/// An address with its owner's email, for the admin list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AddressWithOwner {
    #[sqlx(flatten)]
    pub address: Address,
    pub user_email: String,
}

/// Bulk actions from the admin address list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressAction {
    SetDefault,
    UnsetDefault,
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All of a user's addresses, defaults first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address WHERE user_id = $1
             ORDER BY is_default DESC, created_at DESC"
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(addresses)
    }

    /// Get an address by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(address)
    }

    /// The user's default address of a type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn default_for(
        &self,
        user: UserId,
        kind: AddressType,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address
             WHERE user_id = $1 AND address_type = $2 AND is_default"
        ))
        .bind(user)
        .bind(kind)
        .fetch_optional(self.pool)
        .await?;
        Ok(address)
    }

    /// Insert an address; if it is a default, the previous default is cleared.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn create(
        &self,
        user: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if address.is_default {
            clear_default(&mut tx, user, address.address_type).await?;
        }

        let created = sqlx::query_as::<_, Address>(&format!(
            r"
            INSERT INTO storefront.address
                (user_id, street_address, apartment_address, country, zip_code,
                 address_type, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user)
        .bind(&address.street_address)
        .bind(&address.apartment_address)
        .bind(&address.country)
        .bind(&address.zip_code)
        .bind(address.address_type)
        .bind(address.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Make one of the user's addresses the default for its type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn set_default(&self, user: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let kind = sqlx::query_scalar::<_, AddressType>(
            "SELECT address_type FROM storefront.address WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        clear_default(&mut tx, user, kind).await?;
        sqlx::query("UPDATE storefront.address SET is_default = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn delete(&self, user: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.address WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Every address with its owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_list(&self) -> Result<Vec<AddressWithOwner>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressWithOwner>(
            r"
            SELECT a.id, a.user_id, a.street_address, a.apartment_address, a.country,
                   a.zip_code, a.address_type, a.is_default, a.created_at,
                   u.email AS user_email
            FROM storefront.address a
            JOIN storefront.user u ON u.id = a.user_id
            ORDER BY a.created_at DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Apply an admin action; returns the number of addresses changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn apply_action(
        &self,
        action: AddressAction,
        ids: &[i32],
    ) -> Result<u64, RepositoryError> {
        match action {
            AddressAction::UnsetDefault => {
                let result = sqlx::query(
                    "UPDATE storefront.address SET is_default = FALSE WHERE id = ANY($1)",
                )
                .bind(ids)
                .execute(self.pool)
                .await?;
                Ok(result.rows_affected())
            }
            AddressAction::SetDefault => {
                let mut tx = self.pool.begin().await?;
                let mut changed = 0;
                for &id in ids {
                    let owner = sqlx::query_as::<_, (UserId, AddressType)>(
                        "SELECT user_id, address_type FROM storefront.address WHERE id = $1",
                    )
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
                    let Some((user, kind)) = owner else {
                        continue;
                    };
                    clear_default(&mut tx, user, kind).await?;
                    changed += sqlx::query(
                        "UPDATE storefront.address SET is_default = TRUE WHERE id = $1",
                    )
                    .bind(id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                }
                tx.commit().await?;
                Ok(changed)
            }
        }
    }
}

async fn clear_default(
    conn: &mut PgConnection,
    user: UserId,
    kind: AddressType,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE storefront.address SET is_default = FALSE
         WHERE user_id = $1 AND address_type = $2 AND is_default",
    )
    .bind(user)
    .bind(kind)
    .execute(conn)
    .await?;
    Ok(())
}
