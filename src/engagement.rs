use crate::database::models::{ContentKind, ContentRecord};
use crate::database::repositories::{ContentRepository, LikeRepository};
use crate::database::Database;
use crate::error::{EngineError, EngineResult};
use crate::fanout::{ChangeBus, ChangeKind};
use crate::identity::Actor;
use crate::moderation;
use crate::utils::now_utc_iso;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owns the engagement store: like edges, denormalized counters, and the
/// content rows the external publishing flow registers with us. Every
/// counter mutation is a relative delta applied inside one transaction,
/// never a read-modify-write of a previously fetched value.
#[derive(Clone)]
pub struct EngagementService {
    database: Database,
    bus: ChangeBus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    pub likes_count: i64,
    pub comments_count: i64,
    pub views_count: i64,
    pub viewer_has_liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterContentInput {
    pub id: Option<String>,
    pub kind: ContentKind,
    pub author_id: String,
    #[serde(default)]
    pub published: bool,
}

impl EngagementService {
    pub fn new(database: Database, bus: ChangeBus) -> Self {
        Self { database, bus }
    }

    /// Flips the caller's like edge for a published content item. Edge
    /// insert/delete and the counter delta commit together, so two
    /// concurrent toggles from the same user serialize to exactly one
    /// edge state.
    pub fn toggle_like(&self, actor: Option<&Actor>, content_id: &str) -> EngineResult<LikeOutcome> {
        let actor = moderation::require_actor(actor)?;

        let outcome = self
            .database
            .with_transaction(|repos| {
                let contents = repos.contents();
                let content = contents
                    .get(content_id)?
                    .filter(|record| record.published)
                    .ok_or_else(|| {
                        anyhow::Error::new(EngineError::not_found(format!(
                            "no published content {content_id}"
                        )))
                    })?;

                let likes = repos.likes();
                let liked = if likes.exists(&actor.user_id, content_id)? {
                    likes.delete(&actor.user_id, content_id)?;
                    contents.apply_likes_delta(content_id, -1)?;
                    false
                } else {
                    likes.insert(&actor.user_id, content_id, &now_utc_iso())?;
                    contents.apply_likes_delta(content_id, 1)?;
                    true
                };

                let likes_count = content.likes_count + if liked { 1 } else { -1 };
                Ok(LikeOutcome { liked, likes_count })
            })
            .map_err(EngineError::from_anyhow)?;

        self.bus.publish(content_id, ChangeKind::CountersChanged);
        Ok(outcome)
    }

    /// Unconditional view increment; every page view counts.
    pub fn record_view(&self, content_id: &str) -> EngineResult<i64> {
        let views = self
            .database
            .with_repositories(|repos| repos.contents().increment_views(content_id))
            .map_err(EngineError::from_anyhow)?
            .ok_or_else(|| {
                EngineError::not_found(format!("no published content {content_id}"))
            })?;

        self.bus.publish(content_id, ChangeKind::CountersChanged);
        Ok(views)
    }

    pub fn get_aggregate(
        &self,
        viewer: Option<&Actor>,
        content_id: &str,
    ) -> EngineResult<Aggregate> {
        self.database
            .with_repositories(|repos| {
                let content = repos.contents().get(content_id)?.ok_or_else(|| {
                    anyhow::Error::new(EngineError::not_found(format!(
                        "no such content {content_id}"
                    )))
                })?;
                let viewer_has_liked = match viewer {
                    Some(actor) => repos.likes().exists(&actor.user_id, content_id)?,
                    None => false,
                };
                Ok(Aggregate {
                    likes_count: content.likes_count,
                    comments_count: content.comments_count,
                    views_count: content.views_count,
                    viewer_has_liked,
                })
            })
            .map_err(EngineError::from_anyhow)
    }

    /// Collaborator hook for the publishing flow. Counters always start at
    /// zero regardless of what the caller supplies.
    pub fn register_content(&self, input: RegisterContentInput) -> EngineResult<ContentRecord> {
        let record = ContentRecord {
            id: input.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            kind: input.kind,
            author_id: input.author_id,
            published: input.published,
            likes_count: 0,
            comments_count: 0,
            views_count: 0,
            created_at: now_utc_iso(),
        };
        self.database
            .with_repositories(|repos| repos.contents().create(&record))
            .map_err(EngineError::from_anyhow)?;
        Ok(record)
    }

    /// Collaborator hook for content deletion: cascades like edges and
    /// comments away with the content row, then retires its fan-out
    /// channel so subscribers observe a closed stream.
    pub fn purge_content(&self, content_id: &str) -> EngineResult<()> {
        let removed = self
            .database
            .with_transaction(|repos| repos.contents().delete(content_id))
            .map_err(EngineError::from_anyhow)?;
        if !removed {
            return Err(EngineError::not_found(format!(
                "no such content {content_id}"
            )));
        }
        self.bus.retire(content_id);
        tracing::info!(content_id, "purged content and cascaded engagement rows");
        Ok(())
    }

}
