//! Stripe API client for customers, saved cards, and charges.
//!
//! Only the handful of form-encoded endpoints the payment page needs are
//! covered. Checkout code talks to [`PaymentGateway`] so it can run against
//! a fake in tests.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use bookbazar_core::Email;

use crate::config::StripeConfig;

/// Charges are always taken in US dollars.
pub const CURRENCY: &str = "usd";

/// Saved cards shown on the payment page.
pub const SAVED_CARD_LIMIT: usize = 3;

/// Errors from the payment gateway, grouped the way the payment page reports them.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The card was declined; carries the gateway's message for the shopper.
    #[error("card error: {0}")]
    Card(String),

    /// Too many requests to the gateway.
    #[error("rate limited by gateway")]
    RateLimit,

    /// The request had invalid parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The API key was rejected.
    #[error("gateway authentication failed")]
    Authentication,

    /// The gateway could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// Any other error reported by the gateway.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Something outside the gateway taxonomy (bad response, client setup).
    #[error("unexpected payment error: {0}")]
    Unexpected(String),
}

impl PaymentError {
    /// Text flashed to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Card(message) => message.clone(),
            Self::RateLimit => "Rate limit error".to_string(),
            Self::InvalidRequest(_) => "Invalid parameters".to_string(),
            Self::Authentication => "Not authenticated".to_string(),
            Self::Network(_) => "Network error".to_string(),
            Self::Gateway(_) => {
                "Something went wrong. You were not charged. Please try again.".to_string()
            }
            Self::Unexpected(_) => "A serious error occurred. We have been notified.".to_string(),
        }
    }

    /// Whether this error points at our side rather than the shopper's card.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Authentication | Self::InvalidRequest(_) | Self::Unexpected(_)
        )
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Network(err.to_string())
        } else {
            Self::Unexpected(err.to_string())
        }
    }
}

/// Where a charge draws money from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeSource<'a> {
    /// The default card of a saved customer.
    Customer(&'a str),
    /// A one-time card token from Stripe.js.
    Token(&'a str),
}

/// A successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
}

/// A card saved on a customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SavedCard {
    pub id: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub last4: String,
    #[serde(default)]
    pub exp_month: u32,
    #[serde(default)]
    pub exp_year: u32,
}

/// Operations the payment flow needs from a gateway.
pub trait PaymentGateway: Send + Sync {
    /// Create a customer and return its id.
    fn create_customer(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<String, PaymentError>> + Send;

    /// Attach a card token to a customer as a new source.
    fn attach_source(
        &self,
        customer_id: &str,
        token: &str,
    ) -> impl Future<Output = Result<(), PaymentError>> + Send;

    /// List up to [`SAVED_CARD_LIMIT`] cards of a customer.
    fn list_cards(
        &self,
        customer_id: &str,
    ) -> impl Future<Output = Result<Vec<SavedCard>, PaymentError>> + Send;

    /// Charge `amount_cents` in [`CURRENCY`].
    fn charge(
        &self,
        amount_cents: i64,
        source: ChargeSource<'_>,
    ) -> impl Future<Output = Result<Charge, PaymentError>> + Send;
}

/// Stripe REST client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: Url,
}

impl StripeClient {
    /// Create a new Stripe client authenticating with the secret key.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| PaymentError::Unexpected(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Unexpected(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PaymentError> {
        self.api_base
            .join(path)
            .map_err(|e| PaymentError::Unexpected(format!("bad endpoint {path}: {e}")))
    }

    /// POST a form and decode the JSON response.
    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, PaymentError> {
        let response = self.client.post(self.endpoint(path)?).form(form).send().await?;
        decode(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PaymentError> {
        let response = self.client.get(self.endpoint(path)?).query(query).send().await?;
        decode(response).await
    }
}

impl PaymentGateway for StripeClient {
    async fn create_customer(&self, email: &Email) -> Result<String, PaymentError> {
        #[derive(Deserialize)]
        struct Customer {
            id: String,
        }

        let customer: Customer = self
            .post_form("/v1/customers", &[("email", email.as_str())])
            .await?;
        tracing::info!(customer_id = %customer.id, "Stripe customer created");
        Ok(customer.id)
    }

    async fn attach_source(&self, customer_id: &str, token: &str) -> Result<(), PaymentError> {
        let path = format!("/v1/customers/{}/sources", urlencoding::encode(customer_id));
        let _: serde_json::Value = self.post_form(&path, &[("source", token)]).await?;
        Ok(())
    }

    async fn list_cards(&self, customer_id: &str) -> Result<Vec<SavedCard>, PaymentError> {
        #[derive(Deserialize)]
        struct CardList {
            data: Vec<SavedCard>,
        }

        let path = format!("/v1/customers/{}/sources", urlencoding::encode(customer_id));
        let limit = SAVED_CARD_LIMIT.to_string();
        let list: CardList = self
            .get(&path, &[("object", "card"), ("limit", &limit)])
            .await?;
        Ok(list.data)
    }

    async fn charge(&self, amount_cents: i64, source: ChargeSource<'_>) -> Result<Charge, PaymentError> {
        let amount = amount_cents.to_string();
        let mut form = vec![("amount", amount.as_str()), ("currency", CURRENCY)];
        match source {
            ChargeSource::Customer(id) => form.push(("customer", id)),
            ChargeSource::Token(token) => form.push(("source", token)),
        }

        let charge: Charge = self.post_form("/v1/charges", &form).await?;
        tracing::info!(charge_id = %charge.id, amount_cents, "Stripe charge created");
        Ok(charge)
    }
}

/// Decode a successful response or map a Stripe error body.
async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, PaymentError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(error_from_response(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| PaymentError::Unexpected(format!("bad response: {e}")))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<String>,
}

/// Map an HTTP error status and Stripe's JSON error body to [`PaymentError`].
fn error_from_response(status: u16, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| format!("HTTP {status}"));

    match (status, parsed.as_ref().map(|e| e.error.kind.as_str())) {
        (429, _) | (_, Some("rate_limit_error")) => PaymentError::RateLimit,
        (401, _) | (_, Some("authentication_error")) => PaymentError::Authentication,
        (_, Some("card_error")) => PaymentError::Card(message),
        (_, Some("invalid_request_error")) => PaymentError::InvalidRequest(message),
        (_, Some(_)) => PaymentError::Gateway(message),
        (_, None) => PaymentError::Unexpected(message),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_card_error_keeps_gateway_message() {
        let body = r#"{"error":{"type":"card_error","code":"card_declined","message":"Your card was declined."}}"#;
        let err = error_from_response(402, body);
        assert!(matches!(err, PaymentError::Card(_)));
        assert_eq!(err.user_message(), "Your card was declined.");
    }

    #[test]
    fn test_status_codes_win_over_body() {
        assert!(matches!(error_from_response(429, "{}"), PaymentError::RateLimit));
        assert!(matches!(
            error_from_response(401, r#"{"error":{"type":"invalid_request_error","message":"No API key provided."}}"#),
            PaymentError::Authentication
        ));
    }

    #[test]
    fn test_error_taxonomy_flash_texts() {
        let invalid = error_from_response(
            400,
            r#"{"error":{"type":"invalid_request_error","message":"Missing required param: amount."}}"#,
        );
        assert_eq!(invalid.user_message(), "Invalid parameters");

        let api = error_from_response(500, r#"{"error":{"type":"api_error","message":"boom"}}"#);
        assert_eq!(
            api.user_message(),
            "Something went wrong. You were not charged. Please try again."
        );

        let garbage = error_from_response(502, "<html>bad gateway</html>");
        assert_eq!(
            garbage.user_message(),
            "A serious error occurred. We have been notified."
        );

        assert_eq!(PaymentError::Network("reset".into()).user_message(), "Network error");
        assert_eq!(PaymentError::Authentication.user_message(), "Not authenticated");
        assert_eq!(PaymentError::RateLimit.user_message(), "Rate limit error");
    }

    #[test]
    fn test_saved_card_decodes_partial_fields() {
        let card: SavedCard =
            serde_json::from_str(r#"{"id":"card_1","object":"card","brand":"Visa","last4":"4242","exp_month":8,"exp_year":2030}"#)
                .unwrap();
        assert_eq!(card.last4, "4242");
        let bare: SavedCard = serde_json::from_str(r#"{"id":"card_2"}"#).unwrap();
        assert!(bare.brand.is_empty());
    }

    #[test]
    fn test_endpoint_joins_base() {
        let config = StripeConfig {
            secret_key: secrecy::SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            publishable_key: "pk_test".to_string(),
            api_base: Url::parse("http://127.0.0.1:12111").unwrap(),
        };
        let client = StripeClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/v1/charges").unwrap().as_str(),
            "http://127.0.0.1:12111/v1/charges"
        );
    }
}
