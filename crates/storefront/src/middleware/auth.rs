//! Authentication extractors.
//!
//! Login-required pages redirect anonymous visitors to
//! `/users/login?next=<path>`; staff pages answer 403 to everyone else.

use axum::{
    extract::FromRequestParts,
    http::{Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use url::Url;

use crate::db::users::UserRepository;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn wishlist(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when a page needs a login.
pub enum AuthRejection {
    /// Redirect to the login page, coming back to `next` afterwards.
    RedirectToLogin { next: String },
    /// No session layer on this route.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login URL that returns to `next`.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("/users/login?next={}", urlencoding::encode(next))
}

/// The `next` target if it is a local path, else `/`.
///
/// Rejects absolute and scheme-relative URLs so the login form cannot be
/// used as an open redirect.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.contains(['\r', '\n']) =>
        {
            path
        }
        _ => "/",
    }
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Where to return after login.
///
/// Form posts cannot be replayed as a GET, so they go back to the page the
/// form was on (from `Referer`) or to `/`.
fn requested_path(parts: &Parts) -> String {
    if parts.method == Method::GET || parts.method == Method::HEAD {
        return parts
            .uri
            .path_and_query()
            .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());
    }
    parts
        .headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| Url::parse(referer).ok())
        .map_or_else(
            || "/".to_string(),
            |referer| match referer.query() {
                Some(query) => format!("{}?{query}", referer.path()),
                None => referer.path().to_string(),
            },
        )
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if parts.extensions.get::<Session>().is_none() {
            return Err(AuthRejection::Unauthorized);
        }
        session_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AuthRejection::RedirectToLogin {
                next: requested_path(parts),
            })
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Extractor for staff-only pages.
///
/// The staff flag is re-read from the database so a demotion takes effect
/// without waiting for the session to expire.
pub struct RequireStaff(pub CurrentUser);

/// Error returned for staff pages.
pub enum StaffRejection {
    Login(AuthRejection),
    Forbidden,
    Unavailable,
}

impl IntoResponse for StaffRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login(rejection) => rejection.into_response(),
            Self::Forbidden => crate::error::AppError::Forbidden("staff only".to_string()).into_response(),
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = StaffRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state)
            .await
            .map_err(StaffRejection::Login)?;

        let stored = UserRepository::new(state.pool())
            .get_by_id(user.id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Staff check failed");
                StaffRejection::Unavailable
            })?;

        match stored {
            Some(u) if u.is_staff && u.is_active => Ok(Self(user)),
            _ => {
                tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-staff access denied");
                Err(StaffRejection::Forbidden)
            }
        }
    }
}

/// Store the logged-in user in the session, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the logged-in user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/order-summary")), "/order-summary");
        assert_eq!(safe_next(Some("/products?page=2")), "/products?page=2");
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("")), "/");
        assert_eq!(safe_next(None), "/");
    }

    fn request_parts(method: Method, uri: &str, referer: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(referer) = referer {
            builder = builder.header(header::REFERER, referer);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_get_returns_to_requested_page() {
        let parts = request_parts(Method::GET, "/wishlist?page=2", None);
        assert_eq!(requested_path(&parts), "/wishlist?page=2");
    }

    #[test]
    fn test_post_returns_to_referring_page() {
        let parts = request_parts(
            Method::POST,
            "/add-to-cart/dune",
            Some("http://localhost:3000/product/dune?tab=reviews"),
        );
        assert_eq!(requested_path(&parts), "/product/dune?tab=reviews");

        let parts = request_parts(Method::POST, "/add-to-cart/dune", None);
        assert_eq!(requested_path(&parts), "/");
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(
            login_url("/products?page=2"),
            "/users/login?next=%2Fproducts%3Fpage%3D2"
        );
    }
}
