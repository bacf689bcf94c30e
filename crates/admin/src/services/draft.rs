//! Intervention form drafts, one per browser session. Last write wins.

use chrono::{DateTime, Utc};
use sav_core::auth::keys;
use sav_core::models::InterventionDraft;
use tower_sessions::Session;

/// Saved draft, or an empty one when nothing is stored or it cannot be read.
pub async fn load(session: &Session) -> InterventionDraft {
    match session.get::<InterventionDraft>(keys::INTERVENTION_DRAFT).await {
        Ok(draft) => draft.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read intervention draft");
            InterventionDraft::default()
        }
    }
}

/// Replace the draft. An empty draft clears it.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save(
    session: &Session,
    mut draft: InterventionDraft,
    now: DateTime<Utc>,
) -> Result<InterventionDraft, tower_sessions::session::Error> {
    if draft.is_empty() {
        clear(session).await?;
        return Ok(InterventionDraft::default());
    }
    draft.saved_at = Some(now);
    session.insert(keys::INTERVENTION_DRAFT, &draft).await?;
    Ok(draft)
}

/// Drop the draft.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<InterventionDraft>(keys::INTERVENTION_DRAFT)
        .await?;
    Ok(())
}

/// Drop the draft once its intervention is saved. A failure is only
/// logged since the intervention already exists.
pub async fn discard(session: &Session) {
    if let Err(e) = clear(session).await {
        tracing::warn!(error = %e, "Failed to clear intervention draft");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tower_sessions::session::{Id, Record};
    use tower_sessions::{MemoryStore, SessionStore, session_store};

    use super::*;

    /// Session backend that refuses every operation.
    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn save(&self, _record: &Record) -> session_store::Result<()> {
            Err(session_store::Error::Backend("down".to_string()))
        }

        async fn load(&self, _id: &Id) -> session_store::Result<Option<Record>> {
            Err(session_store::Error::Backend("down".to_string()))
        }

        async fn delete(&self, _id: &Id) -> session_store::Result<()> {
            Err(session_store::Error::Backend("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let now = Utc::now();

        let first = InterventionDraft {
            description: "Ne s'allume plus".to_string(),
            ..InterventionDraft::default()
        };
        let second = InterventionDraft {
            description: "Sifflement permanent".to_string(),
            ..InterventionDraft::default()
        };
        save(&session, first, now).await.unwrap();
        save(&session, second, now).await.unwrap();

        let loaded = load(&session).await;
        assert_eq!(loaded.description, "Sifflement permanent");
        assert_eq!(loaded.saved_at, Some(now));
    }

    #[tokio::test]
    async fn test_saving_empty_draft_clears() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let draft = InterventionDraft {
            description: "x".to_string(),
            ..InterventionDraft::default()
        };
        save(&session, draft, Utc::now()).await.unwrap();
        save(&session, InterventionDraft::default(), Utc::now())
            .await
            .unwrap();
        assert!(load(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_discard_swallows_session_errors() {
        let session = Session::new(Some(Id::default()), Arc::new(BrokenStore), None);
        assert!(clear(&session).await.is_err());
        discard(&session).await;
    }
}
