//! Registration, login, profile, and contact forms.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use bookbazar_core::{DisplayCurrency, Email, Language};

use super::{FieldErrors, REQUIRED, checked, min_chars, non_blank};
use crate::models::{Profile, ProfileUpdate};
use crate::services::auth::MIN_PASSWORD_LENGTH;

const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

fn password_too_short() -> String {
    format!("This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters.")
}

fn parse_email(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<Email> {
    if raw.trim().is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match Email::parse(raw) {
        Ok(email) => Some(email),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

fn new_password_pair(
    errors: &mut FieldErrors,
    first: &str,
    second: &str,
    first_field: &'static str,
    second_field: &'static str,
) {
    if first.is_empty() {
        errors.add(first_field, REQUIRED);
    } else if first.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(first_field, password_too_short());
    }
    if second.is_empty() {
        errors.add(second_field, REQUIRED);
    } else if first != second {
        errors.add(second_field, PASSWORD_MISMATCH);
    }
}

/// Sign-up form.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegisterForm {
    /// # Errors
    ///
    /// Returns field errors for a bad email or password pair.
    pub fn validate(&self) -> Result<Email, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = parse_email(&mut errors, "email", &self.email);
        new_password_pair(
            &mut errors,
            &self.password1,
            &self.password2,
            "password1",
            "password2",
        );
        match email {
            Some(email) => errors.finish(email),
            None => Err(errors),
        }
    }
}

/// Sign-in form. `next` carries the page that required login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Password change for a signed-in user.
#[derive(Debug, Default, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

impl PasswordChangeForm {
    /// Checks presence, length, and confirmation; the old password is
    /// verified against the stored hash by the handler.
    ///
    /// # Errors
    ///
    /// Returns field errors for missing or mismatched passwords.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.old_password.is_empty() {
            errors.add("old_password", REQUIRED);
        }
        new_password_pair(
            &mut errors,
            &self.new_password1,
            &self.new_password2,
            "new_password1",
            "new_password2",
        );
        errors.finish(())
    }
}

/// Profile edit fields, collected from a multipart body.
#[derive(Debug, Default, Clone)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub birthdate: String,
    pub newsletter: Option<String>,
    pub order_updates: Option<String>,
    pub promotions: Option<String>,
    pub language: String,
    pub currency: String,
    pub favorite_genres: String,
    pub remove_photo: Option<String>,
}

impl ProfileForm {
    /// Set a field from a multipart text part. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "first_name" => self.first_name = value,
            "last_name" => self.last_name = value,
            "phone" => self.phone = value,
            "birthdate" => self.birthdate = value,
            "newsletter" => self.newsletter = Some(value),
            "order_updates" => self.order_updates = Some(value),
            "promotions" => self.promotions = Some(value),
            "language" => self.language = value,
            "currency" => self.currency = value,
            "favorite_genres" => self.favorite_genres = value,
            "remove_photo" => self.remove_photo = Some(value),
            _ => {}
        }
    }

    /// Pre-fill from the stored profile for the edit page.
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        let flag = |on: bool| on.then(|| "on".to_owned());
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone: profile.phone.clone().unwrap_or_default(),
            birthdate: profile
                .birthdate
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            newsletter: flag(profile.newsletter),
            order_updates: flag(profile.order_updates),
            promotions: flag(profile.promotions),
            language: profile.language.as_str().to_owned(),
            currency: profile.currency.as_str().to_owned(),
            favorite_genres: profile.favorite_genres.clone(),
            remove_photo: None,
        }
    }

    #[must_use]
    pub fn remove_photo(&self) -> bool {
        checked(self.remove_photo.as_deref())
    }

    /// Validate against `today`, which the age check needs.
    ///
    /// # Errors
    ///
    /// Returns field errors for long names, short phone numbers, implausible
    /// birthdates, or unknown preference codes.
    pub fn validate(&self, today: NaiveDate) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = self.first_name.trim().to_owned();
        if first_name.chars().count() > 30 {
            errors.add("first_name", "Ensure this value has at most 30 characters.");
        }
        let last_name = self.last_name.trim().to_owned();
        if last_name.chars().count() > 30 {
            errors.add("last_name", "Ensure this value has at most 30 characters.");
        }

        let phone = non_blank(&self.phone).map(str::to_owned);
        if let Some(ref phone) = phone
            && phone.chars().filter(char::is_ascii_digit).count() < 10
        {
            errors.add(
                "phone",
                "Please enter a valid phone number with at least 10 digits.",
            );
        }

        let birthdate = match non_blank(&self.birthdate) {
            None => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => {
                    let age = age_on(date, today);
                    if age < 13 {
                        errors.add(
                            "birthdate",
                            "You must be at least 13 years old to use this service.",
                        );
                    } else if age > 120 {
                        errors.add("birthdate", "Please enter a valid birthdate.");
                    }
                    Some(date)
                }
                Err(_) => {
                    errors.add("birthdate", "Enter a valid date.");
                    None
                }
            },
        };

        let language = non_blank(&self.language)
            .map_or(Ok(Language::default()), |v| v.parse())
            .unwrap_or_else(|_| {
                errors.add("language", "Select a valid choice.");
                Language::default()
            });
        let currency = non_blank(&self.currency)
            .map_or(Ok(DisplayCurrency::default()), |v| v.parse())
            .unwrap_or_else(|_| {
                errors.add("currency", "Select a valid choice.");
                DisplayCurrency::default()
            });

        errors.finish(ProfileUpdate {
            first_name,
            last_name,
            phone,
            birthdate,
            newsletter: checked(self.newsletter.as_deref()),
            order_updates: checked(self.order_updates.as_deref()),
            promotions: checked(self.promotions.as_deref()),
            language,
            currency,
            favorite_genres: self.favorite_genres.trim().to_owned(),
        })
    }
}

/// Whole years between `birth` and `today`.
fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let had_birthday = (today.month(), today.day()) >= (birth.month(), birth.day());
    today.year() - birth.year() - i32::from(!had_birthday)
}

/// Contact page form.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// A validated contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    /// # Errors
    ///
    /// Returns field errors for short fields or a bad email.
    pub fn validate(&self) -> Result<ContactMessage, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = min_chars(
            &mut errors,
            "name",
            &self.name,
            2,
            "Name must be at least 2 characters long.",
        );
        let email = parse_email(&mut errors, "email", &self.email);
        let subject = min_chars(
            &mut errors,
            "subject",
            &self.subject,
            5,
            "Subject must be at least 5 characters long.",
        );
        let message = min_chars(
            &mut errors,
            "message",
            &self.message,
            10,
            "Message must be at least 10 characters long.",
        );
        match email {
            Some(email) => errors.finish(ContactMessage {
                name,
                email,
                subject,
                message,
            }),
            None => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_register_requires_matching_passwords() {
        let form = RegisterForm {
            email: "reader@example.com".to_owned(),
            password1: "correct horse".to_owned(),
            password2: "correct horsf".to_owned(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("password2"), Some(PASSWORD_MISMATCH));
    }

    #[test]
    fn test_register_rejects_short_password() {
        let form = RegisterForm {
            email: "reader@example.com".to_owned(),
            password1: "short".to_owned(),
            password2: "short".to_owned(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("password1"));
        assert!(!errors.has("password2"));
    }

    #[test]
    fn test_register_accepts_valid_input() {
        let form = RegisterForm {
            email: "Reader@Example.COM".to_owned(),
            password1: "long enough pass".to_owned(),
            password2: "long enough pass".to_owned(),
        };
        assert_eq!(form.validate().unwrap().as_str(), "Reader@example.com");
    }

    #[test]
    fn test_age_counts_birthday() {
        assert_eq!(age_on(date(2000, 6, 15), date(2013, 6, 14)), 12);
        assert_eq!(age_on(date(2000, 6, 15), date(2013, 6, 15)), 13);
    }

    #[test]
    fn test_profile_birthdate_bounds() {
        let today = date(2026, 1, 1);
        let mut form = ProfileForm {
            birthdate: "2020-01-01".to_owned(),
            ..ProfileForm::default()
        };
        assert_eq!(
            form.validate(today).unwrap_err().get("birthdate"),
            Some("You must be at least 13 years old to use this service.")
        );

        form.birthdate = "1890-01-01".to_owned();
        assert_eq!(
            form.validate(today).unwrap_err().get("birthdate"),
            Some("Please enter a valid birthdate.")
        );

        form.birthdate = "1990-05-20".to_owned();
        assert_eq!(form.validate(today).unwrap().birthdate, Some(date(1990, 5, 20)));
    }

    #[test]
    fn test_profile_phone_needs_ten_digits() {
        let today = date(2026, 1, 1);
        let mut form = ProfileForm {
            phone: "+1 (555) 123".to_owned(),
            ..ProfileForm::default()
        };
        assert!(form.validate(today).unwrap_err().has("phone"));

        form.phone = "+1 (555) 123-4567".to_owned();
        assert_eq!(
            form.validate(today).unwrap().phone.as_deref(),
            Some("+1 (555) 123-4567")
        );
    }

    #[test]
    fn test_profile_checkboxes_and_defaults() {
        let mut form = ProfileForm::default();
        form.set("newsletter", "on".to_owned());
        form.set("language", "fr".to_owned());
        let update = form.validate(date(2026, 1, 1)).unwrap();
        assert!(update.newsletter);
        assert!(!update.order_updates);
        assert_eq!(update.language, Language::French);
        assert_eq!(update.currency, DisplayCurrency::default());
    }

    #[test]
    fn test_contact_minimum_lengths() {
        let form = ContactForm {
            name: "A".to_owned(),
            email: "not-an-email".to_owned(),
            subject: "Hi".to_owned(),
            message: "Short".to_owned(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("name"),
            Some("Name must be at least 2 characters long.")
        );
        assert!(errors.has("email"));
        assert_eq!(
            errors.get("subject"),
            Some("Subject must be at least 5 characters long.")
        );
        assert_eq!(
            errors.get("message"),
            Some("Message must be at least 10 characters long.")
        );
    }
}
