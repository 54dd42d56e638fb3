//! Form payloads and their validation.
//!
//! Each form is a `Deserialize` struct holding the raw submitted strings.
//! `validate` turns it into typed values or a [`FieldErrors`] that the page
//! re-renders next to the offending inputs.

pub mod account;
pub mod admin;
pub mod catalog;
pub mod checkout;

pub use account::{ContactForm, LoginForm, PasswordChangeForm, ProfileForm, RegisterForm};
pub use admin::{BookRowsForm, BulkAction, CouponCreateForm};
pub use catalog::{AuthorForm, CategoryForm, ProductForm, ProductSearchForm, ReviewForm};
pub use checkout::{AddressForm, CheckoutForm, CouponForm, PaymentForm, RefundForm};

/// Message for a required input left blank.
pub const REQUIRED: &str = "This field is required";

/// Per-field validation messages, in the order they were found.
///
/// Errors not tied to one input use the field name `__all__`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    /// Key for form-wide errors.
    pub const FORM: &'static str = "__all__";

    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push((field, message.into()));
    }

    /// First message for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Form-wide messages.
    #[must_use]
    pub fn form(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(f, _)| *f == Self::FORM)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    /// Every `(field, message)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field failed.
    pub fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trimmed text, or `None` when blank.
#[must_use]
pub fn non_blank(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

/// HTML checkboxes submit `on` when ticked and nothing otherwise.
#[must_use]
pub fn checked(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "false" && v != "0")
}

/// Trimmed text that must be at least `min` characters long.
pub(crate) fn min_chars(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
    min: usize,
    message: &str,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else if value.chars().count() < min {
        errors.add(field, message);
    }
    value.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");
        errors.add(FieldErrors::FORM, "whole form");
        assert_eq!(errors.get("email"), Some("first"));
        assert_eq!(errors.get("name"), None);
        assert_eq!(errors.form(), vec!["whole form"]);
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn test_checkbox_values() {
        assert!(checked(Some("on")));
        assert!(checked(Some("true")));
        assert!(!checked(None));
        assert!(!checked(Some("")));
        assert!(!checked(Some("false")));
    }

    #[test]
    fn test_min_chars_reports_blank_as_required() {
        let mut errors = FieldErrors::new();
        let v = min_chars(&mut errors, "name", "   ", 2, "too short");
        assert_eq!(v, "");
        assert_eq!(errors.get("name"), Some(REQUIRED));

        let mut errors = FieldErrors::new();
        min_chars(&mut errors, "name", " a ", 2, "too short");
        assert_eq!(errors.get("name"), Some("too short"));
    }
}
