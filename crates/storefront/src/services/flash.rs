//! One-shot flash messages kept in the session.

use tower_sessions::Session;

use crate::models::{FlashLevel, FlashMessage, session_keys};

/// Queue a message for the next rendered page.
///
/// Session failures are logged; a lost flash never fails the request.
pub async fn push(session: &Session, level: FlashLevel, text: impl Into<String>) {
    let mut messages = read(session).await;
    messages.push(FlashMessage {
        level,
        text: text.into(),
    });
    if let Err(e) = session.insert(session_keys::FLASH_MESSAGES, &messages).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

pub async fn info(session: &Session, text: impl Into<String>) {
    push(session, FlashLevel::Info, text).await;
}

pub async fn success(session: &Session, text: impl Into<String>) {
    push(session, FlashLevel::Success, text).await;
}

pub async fn warning(session: &Session, text: impl Into<String>) {
    push(session, FlashLevel::Warning, text).await;
}

pub async fn error(session: &Session, text: impl Into<String>) {
    push(session, FlashLevel::Error, text).await;
}

/// Drain all pending messages.
pub async fn take(session: &Session) -> Vec<FlashMessage> {
    match session
        .remove::<Vec<FlashMessage>>(session_keys::FLASH_MESSAGES)
        .await
    {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}

async fn read(session: &Session) -> Vec<FlashMessage> {
    session
        .get::<Vec<FlashMessage>>(session_keys::FLASH_MESSAGES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_push_appends_and_take_drains() {
        let session = session();
        success(&session, "Coupon applied successfully!").await;
        warning(&session, "Rate limit error").await;

        let messages = take(&session).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].level, FlashLevel::Success);
        assert_eq!(messages[1].text, "Rate limit error");

        assert!(take(&session).await.is_empty());
    }

    #[test]
    fn test_levels_serialize_lowercase() {
        let json = serde_json::to_string(&FlashMessage {
            level: FlashLevel::Error,
            text: "x".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"level":"error","text":"x"}"#);
    }
}
