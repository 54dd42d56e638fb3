//! Per-page context shared by every rendered template.
//!
//! `base.html` shows the signed-in user, the cart badge, pending flash
//! messages and the category sidebar. Handlers take a [`PageContext`] and
//! call [`PageContext::layout`] right before rendering, so flashes queued
//! during the request are included.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tower_sessions::Session;

use crate::db::carts::CartRepository;
use crate::models::{CategoryLink, CurrentUser, FlashLevel, FlashMessage, session_keys};
use crate::services::flash;
use crate::state::AppState;

/// Data every page layout needs.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub user: Option<CurrentUser>,
    pub is_staff: bool,
    pub cart_count: i64,
    pub flashes: Vec<FlashMessage>,
    pub categories: Arc<Vec<CategoryLink>>,
}

impl Layout {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn user_email(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.email.as_str())
    }
}

/// Extractor giving handlers the session, the current user and the state.
pub struct PageContext {
    pub session: Session,
    pub user: Option<CurrentUser>,
    pub state: AppState,
}

impl PageContext {
    /// Queue a flash message for the next rendered page.
    pub async fn flash(&self, level: FlashLevel, text: impl Into<String>) {
        flash::push(&self.session, level, text).await;
    }

    /// Build the layout, draining pending flash messages.
    ///
    /// Sidebar or badge lookups that fail are logged and rendered empty.
    pub async fn layout(&self) -> Layout {
        let cart_count = match &self.user {
            Some(user) => CartRepository::new(self.state.pool())
                .line_count(user.id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to count cart items");
                    0
                }),
            None => 0,
        };

        let categories = self
            .state
            .catalog()
            .categories(self.state.pool())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load sidebar categories");
                Arc::default()
            });

        Layout {
            is_staff: self.user.as_ref().is_some_and(|u| u.is_staff),
            user: self.user.clone(),
            cart_count,
            flashes: flash::take(&self.session).await,
            categories,
        }
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "session layer missing"))?;
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        Ok(Self {
            session,
            user,
            state: state.clone(),
        })
    }
}
