//! Customer profile.

use chrono::NaiveDate;

use bookbazar_core::{DisplayCurrency, Email, Language, UserId};

/// Per-user profile and preferences, created with the account.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub profile_photo: Option<String>,
    pub newsletter: bool,
    pub order_updates: bool,
    pub promotions: bool,
    pub language: Language,
    pub currency: DisplayCurrency,
    pub favorite_genres: String,
    pub stripe_customer_id: Option<String>,
    pub one_click_purchasing: bool,
}

impl Profile {
    /// First and last name, falling back to the first name, then the email.
    #[must_use]
    pub fn full_name(&self, email: &Email) -> String {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        match (first.is_empty(), last.is_empty()) {
            (false, false) => format!("{first} {last}"),
            (false, true) => first.to_owned(),
            _ => email.display_name_fallback(),
        }
    }

    /// Name used in greetings.
    #[must_use]
    pub fn display_name(&self, email: &Email) -> String {
        let first = self.first_name.trim();
        if first.is_empty() {
            email.display_name_fallback()
        } else {
            first.to_owned()
        }
    }

    /// Saved Stripe customer, when one-click purchasing is on.
    #[must_use]
    pub fn one_click_customer(&self) -> Option<&str> {
        self.stripe_customer_id
            .as_deref()
            .filter(|_| self.one_click_purchasing)
    }
}

/// Editable profile fields, validated by the profile form.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub newsletter: bool,
    pub order_updates: bool,
    pub promotions: bool,
    pub language: Language,
    pub currency: DisplayCurrency,
    pub favorite_genres: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(first: &str, last: &str) -> Profile {
        Profile {
            user_id: UserId::new(1),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            phone: None,
            birthdate: None,
            profile_photo: None,
            newsletter: true,
            order_updates: true,
            promotions: false,
            language: Language::default(),
            currency: DisplayCurrency::default(),
            favorite_genres: String::new(),
            stripe_customer_id: None,
            one_click_purchasing: false,
        }
    }

    #[test]
    fn test_full_name_fallbacks() {
        let email = Email::parse("jane.doe@example.com").unwrap();
        assert_eq!(profile("Jane", "Doe").full_name(&email), "Jane Doe");
        assert_eq!(profile("Jane", "").full_name(&email), "Jane");
        assert_eq!(profile("", "Doe").full_name(&email), "Jane.Doe");
        assert_eq!(profile("", "").display_name(&email), "Jane.Doe");
    }

    #[test]
    fn test_one_click_customer_requires_flag() {
        let mut p = profile("", "");
        p.stripe_customer_id = Some("cus_123".to_owned());
        assert_eq!(p.one_click_customer(), None);
        p.one_click_purchasing = true;
        assert_eq!(p.one_click_customer(), Some("cus_123"));
    }
}
