//! Billing and shipping addresses.

use chrono::{DateTime, Utc};

use bookbazar_core::{AddressId, AddressType, UserId};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street_address: String,
    pub apartment_address: String,
    pub country: String,
    pub zip_code: String,
    pub address_type: AddressType,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Single-line rendering for summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut line = self.street_address.clone();
        if !self.apartment_address.is_empty() {
            line.push_str(", ");
            line.push_str(&self.apartment_address);
        }
        line.push_str(&format!(", {} {}", self.zip_code, self.country));
        line
    }

    /// Copy of this address under another type, not marked default.
    #[must_use]
    pub fn as_new(&self, address_type: AddressType) -> NewAddress {
        NewAddress {
            street_address: self.street_address.clone(),
            apartment_address: self.apartment_address.clone(),
            country: self.country.clone(),
            zip_code: self.zip_code.clone(),
            address_type,
            is_default: false,
        }
    }
}

/// A validated address ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub street_address: String,
    pub apartment_address: String,
    pub country: String,
    pub zip_code: String,
    pub address_type: AddressType,
    pub is_default: bool,
}
