//! Checkout, payment, coupon, address, and refund forms.

use serde::Deserialize;

use bookbazar_core::{AddressType, CouponCodeError, Email, PaymentOption, normalize_coupon_code};

use super::{FieldErrors, REQUIRED, checked, min_chars, non_blank};
use crate::models::NewAddress;

/// Upper-case ISO 3166 alpha-2 code, or `None` if the input is not one.
fn country_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    (code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase())).then_some(code)
}

const MIN_STREET_CHARS: usize = 5;
const MIN_ZIP_CHARS: usize = 3;
const SHORT_STREET: &str = "Street address must be at least 5 characters long.";
const SHORT_ZIP: &str = "Zip code must be at least 3 characters long.";

/// Where the order ships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShippingChoice {
    UseDefault,
    New(NewAddress),
}

/// Which address is billed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingChoice {
    SameAsShipping,
    UseDefault,
    New(NewAddress),
}

/// A validated checkout submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub shipping: ShippingChoice,
    pub billing: BillingChoice,
    pub payment_option: PaymentOption,
}

/// The checkout page form.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub shipping_address2: String,
    #[serde(default)]
    pub shipping_country: String,
    #[serde(default)]
    pub shipping_zip_code: String,
    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub billing_address2: String,
    #[serde(default)]
    pub billing_country: String,
    #[serde(default)]
    pub billing_zip_code: String,
    pub same_billing_address: Option<String>,
    pub set_default_shipping: Option<String>,
    pub use_default_shipping: Option<String>,
    pub set_default_billing: Option<String>,
    pub use_default_billing: Option<String>,
    pub payment_option: Option<String>,
}

impl CheckoutForm {
    /// # Errors
    ///
    /// Returns "This field is required" for every address field the chosen
    /// options leave unfilled, and an error for a bad payment option.
    pub fn validate(&self) -> Result<CheckoutPlan, FieldErrors> {
        let mut errors = FieldErrors::new();

        let shipping = if checked(self.use_default_shipping.as_deref()) {
            Some(ShippingChoice::UseDefault)
        } else {
            address_block(
                &mut errors,
                ["shipping_address", "shipping_country", "shipping_zip_code"],
                [
                    &self.shipping_address,
                    &self.shipping_address2,
                    &self.shipping_country,
                    &self.shipping_zip_code,
                ],
                AddressType::Shipping,
                checked(self.set_default_shipping.as_deref()),
            )
            .map(ShippingChoice::New)
        };

        let billing = if checked(self.same_billing_address.as_deref()) {
            Some(BillingChoice::SameAsShipping)
        } else if checked(self.use_default_billing.as_deref()) {
            Some(BillingChoice::UseDefault)
        } else {
            address_block(
                &mut errors,
                ["billing_address", "billing_country", "billing_zip_code"],
                [
                    &self.billing_address,
                    &self.billing_address2,
                    &self.billing_country,
                    &self.billing_zip_code,
                ],
                AddressType::Billing,
                checked(self.set_default_billing.as_deref()),
            )
            .map(BillingChoice::New)
        };

        let payment_option = match self.payment_option.as_deref().and_then(non_blank) {
            None => {
                errors.add("payment_option", REQUIRED);
                None
            }
            Some(code) => code.parse::<PaymentOption>().map_or_else(
                |_| {
                    errors.add("payment_option", "Invalid payment option selected");
                    None
                },
                Some,
            ),
        };

        match (shipping, billing, payment_option) {
            (Some(shipping), Some(billing), Some(payment_option)) => errors.finish(CheckoutPlan {
                shipping,
                billing,
                payment_option,
            }),
            _ => Err(errors),
        }
    }
}

/// Validate one street/apartment/country/zip group of the checkout form.
fn address_block(
    errors: &mut FieldErrors,
    fields: [&'static str; 3],
    values: [&str; 4],
    address_type: AddressType,
    is_default: bool,
) -> Option<NewAddress> {
    let [street_field, country_field, zip_field] = fields;
    let [street, apartment, country, zip] = values;

    let street = match non_blank(street) {
        None => {
            errors.add(street_field, REQUIRED);
            None
        }
        Some(street) if street.chars().count() < MIN_STREET_CHARS => {
            errors.add(street_field, SHORT_STREET);
            None
        }
        street => street,
    };
    let country = match non_blank(country) {
        None => {
            errors.add(country_field, REQUIRED);
            None
        }
        Some(raw) => {
            let code = country_code(raw);
            if code.is_none() {
                errors.add(country_field, "Select a valid country.");
            }
            code
        }
    };
    let zip = match non_blank(zip) {
        None => {
            errors.add(zip_field, REQUIRED);
            None
        }
        Some(zip) if zip.chars().count() < MIN_ZIP_CHARS => {
            errors.add(zip_field, SHORT_ZIP);
            None
        }
        zip => zip,
    };

    Some(NewAddress {
        street_address: street?.to_owned(),
        apartment_address: apartment.trim().to_owned(),
        country: country?,
        zip_code: zip?.to_owned(),
        address_type,
        is_default,
    })
}

/// How the customer wants to pay on the Stripe page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInstruction {
    /// Card token from Stripe.js, absent when paying with the saved card.
    pub token: Option<String>,
    /// Keep the card for next time.
    pub save: bool,
    /// Charge the saved customer's default card.
    pub use_default: bool,
}

/// The Stripe payment form. Field names follow Stripe.js conventions.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentForm {
    #[serde(rename = "stripeToken")]
    pub stripe_token: Option<String>,
    pub save: Option<String>,
    pub use_default: Option<String>,
}

impl PaymentForm {
    /// Returns `None` when neither a token nor the saved card was chosen.
    #[must_use]
    pub fn validate(&self) -> Option<PaymentInstruction> {
        let token = self
            .stripe_token
            .as_deref()
            .and_then(non_blank)
            .map(str::to_owned);
        let use_default = checked(self.use_default.as_deref());
        if token.is_none() && !use_default {
            return None;
        }
        Some(PaymentInstruction {
            token,
            save: checked(self.save.as_deref()),
            use_default,
        })
    }
}

/// Promo code entry on the order summary page.
#[derive(Debug, Default, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
}

impl CouponForm {
    /// The code, trimmed and upper-cased.
    ///
    /// # Errors
    ///
    /// Returns the length rule the code breaks.
    pub fn validate(&self) -> Result<String, CouponCodeError> {
        normalize_coupon_code(&self.code)
    }
}

/// Add-address form on the account page.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub apartment_address: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub address_type: String,
    pub default: Option<String>,
}

impl AddressForm {
    /// # Errors
    ///
    /// Returns field errors for a short street or zip, or bad codes.
    pub fn validate(&self) -> Result<NewAddress, FieldErrors> {
        let mut errors = FieldErrors::new();

        let street = self.street_address.trim();
        if street.is_empty() {
            errors.add("street_address", "Street address is required.");
        } else if street.chars().count() < MIN_STREET_CHARS {
            errors.add("street_address", SHORT_STREET);
        }

        let country = country_code(&self.country);
        if country.is_none() {
            errors.add("country", "Select a valid country.");
        }

        let zip = non_blank(&self.zip_code).unwrap_or("00000");
        if zip.chars().count() < MIN_ZIP_CHARS {
            errors.add("zip_code", SHORT_ZIP);
        }

        let address_type = self.address_type.trim().parse::<AddressType>();
        if address_type.is_err() {
            errors.add("address_type", "Select a valid choice.");
        }

        match (country, address_type) {
            (Some(country), Ok(address_type)) => errors.finish(NewAddress {
                street_address: street.to_owned(),
                apartment_address: self.apartment_address.trim().to_owned(),
                country,
                zip_code: zip.to_owned(),
                address_type,
                is_default: checked(self.default.as_deref()),
            }),
            _ => Err(errors),
        }
    }
}

/// Refund request form.
#[derive(Debug, Default, Deserialize)]
pub struct RefundForm {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub email: String,
}

impl RefundForm {
    /// # Errors
    ///
    /// Returns field errors for a short reason or bad email.
    pub fn validate(&self) -> Result<(String, Email), FieldErrors> {
        let mut errors = FieldErrors::new();
        let reason = min_chars(
            &mut errors,
            "reason",
            &self.reason,
            10,
            "Please tell us a little more (at least 10 characters).",
        );
        let email = if self.email.trim().is_empty() {
            errors.add("email", REQUIRED);
            None
        } else {
            Email::parse(&self.email)
                .map_err(|e| errors.add("email", e.to_string()))
                .ok()
        };
        match email {
            Some(email) => errors.finish((reason, email)),
            None => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled_shipping() -> CheckoutForm {
        CheckoutForm {
            shipping_address: "12 Paper Lane".to_owned(),
            shipping_country: "us".to_owned(),
            shipping_zip_code: "10001".to_owned(),
            payment_option: Some("S".to_owned()),
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn test_billing_required_unless_same_or_default() {
        let errors = filled_shipping().validate().unwrap_err();
        assert_eq!(errors.get("billing_address"), Some(REQUIRED));
        assert_eq!(errors.get("billing_country"), Some(REQUIRED));
        assert_eq!(errors.get("billing_zip_code"), Some(REQUIRED));
        assert!(!errors.has("shipping_address"));
    }

    #[test]
    fn test_checkout_addresses_follow_account_rules() {
        let form = CheckoutForm {
            shipping_address: "Elm".to_owned(),
            shipping_zip_code: "12".to_owned(),
            billing_address: "4 Elm Street".to_owned(),
            billing_country: "gb".to_owned(),
            billing_zip_code: "N1".to_owned(),
            ..filled_shipping()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("shipping_address"), Some(SHORT_STREET));
        assert_eq!(errors.get("shipping_zip_code"), Some(SHORT_ZIP));
        assert_eq!(errors.get("billing_zip_code"), Some(SHORT_ZIP));
        assert!(!errors.has("billing_address"));
        assert!(!errors.has("shipping_country"));
    }

    #[test]
    fn test_same_billing_copies_shipping() {
        let form = CheckoutForm {
            same_billing_address: Some("on".to_owned()),
            set_default_shipping: Some("on".to_owned()),
            ..filled_shipping()
        };
        let plan = form.validate().unwrap();
        assert_eq!(plan.billing, BillingChoice::SameAsShipping);
        assert_eq!(plan.payment_option, PaymentOption::Stripe);
        let ShippingChoice::New(address) = plan.shipping else {
            panic!("expected a new shipping address");
        };
        assert_eq!(address.country, "US");
        assert_eq!(address.address_type, AddressType::Shipping);
        assert!(address.is_default);
    }

    #[test]
    fn test_default_addresses_skip_field_checks() {
        let form = CheckoutForm {
            use_default_shipping: Some("on".to_owned()),
            use_default_billing: Some("on".to_owned()),
            payment_option: Some("P".to_owned()),
            ..CheckoutForm::default()
        };
        let plan = form.validate().unwrap();
        assert_eq!(plan.shipping, ShippingChoice::UseDefault);
        assert_eq!(plan.billing, BillingChoice::UseDefault);
        assert_eq!(plan.payment_option, PaymentOption::PayPal);
    }

    #[test]
    fn test_payment_option_required() {
        let form = CheckoutForm {
            payment_option: None,
            same_billing_address: Some("on".to_owned()),
            ..filled_shipping()
        };
        assert_eq!(form.validate().unwrap_err().get("payment_option"), Some(REQUIRED));

        let form = CheckoutForm {
            payment_option: Some("X".to_owned()),
            same_billing_address: Some("on".to_owned()),
            ..filled_shipping()
        };
        assert!(form.validate().unwrap_err().has("payment_option"));
    }

    #[test]
    fn test_payment_needs_token_or_default() {
        assert_eq!(PaymentForm::default().validate(), None);

        let form = PaymentForm {
            stripe_token: Some("tok_visa".to_owned()),
            save: Some("on".to_owned()),
            use_default: None,
        };
        let instruction = form.validate().unwrap();
        assert_eq!(instruction.token.as_deref(), Some("tok_visa"));
        assert!(instruction.save);

        let form = PaymentForm {
            stripe_token: Some("  ".to_owned()),
            save: None,
            use_default: Some("on".to_owned()),
        };
        assert_eq!(form.validate().unwrap().token, None);
    }

    #[test]
    fn test_short_coupon_code() {
        let form = CouponForm {
            code: "ab".to_owned(),
        };
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Promo code must be at least 4 characters long."
        );
    }

    #[test]
    fn test_address_form_rules() {
        let form = AddressForm {
            street_address: "Elm".to_owned(),
            country: "Germany".to_owned(),
            zip_code: "12".to_owned(),
            address_type: "S".to_owned(),
            ..AddressForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get("street_address"),
            Some("Street address must be at least 5 characters long.")
        );
        assert!(errors.has("country"));
        assert_eq!(
            errors.get("zip_code"),
            Some("Zip code must be at least 3 characters long.")
        );

        let form = AddressForm {
            street_address: " 4 Elm Street ".to_owned(),
            country: "de".to_owned(),
            address_type: "B".to_owned(),
            default: Some("on".to_owned()),
            ..AddressForm::default()
        };
        let address = form.validate().unwrap();
        assert_eq!(address.street_address, "4 Elm Street");
        assert_eq!(address.zip_code, "00000");
        assert_eq!(address.country, "DE");
        assert!(address.is_default);
    }

    #[test]
    fn test_refund_form() {
        let form = RefundForm {
            reason: "damaged".to_owned(),
            email: "reader@example.com".to_owned(),
        };
        assert!(form.validate().unwrap_err().has("reason"));

        let form = RefundForm {
            reason: "The cover arrived torn in half.".to_owned(),
            email: "reader@example.com".to_owned(),
        };
        let (reason, email) = form.validate().unwrap();
        assert!(reason.starts_with("The cover"));
        assert_eq!(email.as_str(), "reader@example.com");
    }
}
