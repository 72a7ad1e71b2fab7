use crate::database::models::{CommentRecord, CommentStatus};
use crate::database::repositories::{CommentRepository, ContentRepository};
use crate::database::Database;
use crate::error::{EngineError, EngineResult};
use crate::fanout::{ChangeBus, ChangeKind};
use crate::identity::{Actor, SharedIdentityProvider};
use crate::moderation;
use crate::utils::now_utc_iso;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Depth-1 comment tree over content items, with the moderation gate in
/// front of every write and the shadow-ban filter in front of every read.
#[derive(Clone)]
pub struct CommentService {
    database: Database,
    identity: SharedIdentityProvider,
    bus: ChangeBus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub content_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

impl CommentView {
    fn from_record(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            content_id: record.content_id,
            parent_id: record.parent_id,
            author_id: record.author_id,
            body: record.body,
            created_at: record.created_at,
        }
    }
}

/// One top-level comment with its direct replies, oldest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitCommentInput {
    pub parent_id: Option<String>,
    pub body: String,
}

impl CommentService {
    pub fn new(database: Database, identity: SharedIdentityProvider, bus: ChangeBus) -> Self {
        Self {
            database,
            identity,
            bus,
        }
    }

    pub fn submit_comment(
        &self,
        actor: Option<&Actor>,
        content_id: &str,
        input: SubmitCommentInput,
    ) -> EngineResult<CommentView> {
        let actor = moderation::require_actor(actor)?;
        moderation::ensure_may_comment(actor)?;
        if input.body.trim().is_empty() {
            return Err(EngineError::invalid("comment body may not be empty"));
        }

        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            content_id: content_id.to_string(),
            parent_id: input.parent_id.clone(),
            author_id: actor.user_id.clone(),
            body: input.body,
            created_at: now_utc_iso(),
            status: CommentStatus::Visible,
        };

        self.database
            .with_transaction(|repos| {
                let contents = repos.contents();
                contents
                    .get(content_id)?
                    .filter(|content| content.published)
                    .ok_or_else(|| {
                        anyhow::Error::new(EngineError::not_found(format!(
                            "no published content {content_id}"
                        )))
                    })?;

                if let Some(parent_id) = record.parent_id.as_deref() {
                    let comments = repos.comments();
                    let parent = comments.get(parent_id)?.ok_or_else(|| {
                        anyhow::Error::new(EngineError::not_found(format!(
                            "parent comment {parent_id} no longer exists"
                        )))
                    })?;
                    if parent.parent_id.is_some() {
                        return Err(EngineError::invalid(
                            "replies cannot be nested deeper than one level",
                        )
                        .into());
                    }
                    if parent.content_id != content_id {
                        return Err(EngineError::invalid(
                            "parent comment belongs to a different content item",
                        )
                        .into());
                    }
                }

                repos.comments().create(&record)?;
                contents.apply_comments_delta(content_id, 1)?;
                Ok(())
            })
            .map_err(EngineError::from_anyhow)?;

        self.bus.publish(content_id, ChangeKind::CommentsChanged);
        Ok(CommentView::from_record(record))
    }

    /// Visible comments as a depth-1 tree: top-level newest-first, replies
    /// oldest-first. Comments by currently shadow-banned authors are
    /// filtered here, at read time, without touching the stored rows.
    pub fn list_comments(&self, content_id: &str) -> EngineResult<Vec<CommentThread>> {
        let rows = self
            .database
            .with_repositories(|repos| {
                repos.contents().get(content_id)?.ok_or_else(|| {
                    anyhow::Error::new(EngineError::not_found(format!(
                        "no such content {content_id}"
                    )))
                })?;
                repos.comments().list_visible_for_content(content_id)
            })
            .map_err(EngineError::from_anyhow)?;

        let banned = self.banned_authors(&rows)?;
        let rows: Vec<CommentRecord> = rows
            .into_iter()
            .filter(|row| !banned.contains(&row.author_id))
            .collect();

        let mut replies_by_parent: HashMap<String, Vec<CommentView>> = HashMap::new();
        let mut top_level = Vec::new();
        for row in rows {
            match row.parent_id.clone() {
                Some(parent_id) => replies_by_parent
                    .entry(parent_id)
                    .or_default()
                    .push(CommentView::from_record(row)),
                None => top_level.push(CommentView::from_record(row)),
            }
        }

        // Rows arrive oldest-first; top-level renders newest-first.
        top_level.reverse();
        Ok(top_level
            .into_iter()
            .map(|comment| {
                let replies = replies_by_parent.remove(&comment.id).unwrap_or_default();
                CommentThread { comment, replies }
            })
            .collect())
    }

    /// Admin hard-remove. A deleted top-level comment takes its replies
    /// with it; the counter drops by the number of visible rows removed,
    /// in the same transaction. Returns that number.
    pub fn delete_comment(&self, actor: Option<&Actor>, comment_id: &str) -> EngineResult<i64> {
        let actor = moderation::require_actor(actor)?;
        moderation::ensure_admin(actor)?;

        let (content_id, removed_visible) = self
            .database
            .with_transaction(|repos| {
                let comments = repos.comments();
                let comment = comments.get(comment_id)?.ok_or_else(|| {
                    anyhow::Error::new(EngineError::not_found(
                        "that comment no longer exists".to_string(),
                    ))
                })?;
                let (_, removed_visible) = comments.delete_with_replies(comment_id)?;
                if removed_visible > 0 {
                    repos
                        .contents()
                        .apply_comments_delta(&comment.content_id, -removed_visible)?;
                }
                Ok((comment.content_id, removed_visible))
            })
            .map_err(EngineError::from_anyhow)?;

        self.bus.publish(&content_id, ChangeKind::CommentsChanged);
        tracing::info!(comment_id, removed = removed_visible, admin = %actor.user_id, "comment deleted");
        Ok(removed_visible)
    }

    /// Admin soft-remove: `visible -> hidden`, terminal. Idempotent on an
    /// already-hidden comment.
    pub fn hide_comment(&self, actor: Option<&Actor>, comment_id: &str) -> EngineResult<()> {
        let actor = moderation::require_actor(actor)?;
        moderation::ensure_admin(actor)?;

        let content_id = self
            .database
            .with_transaction(|repos| {
                let comments = repos.comments();
                let comment = comments.get(comment_id)?.ok_or_else(|| {
                    anyhow::Error::new(EngineError::not_found(
                        "that comment no longer exists".to_string(),
                    ))
                })?;
                if comment.status == CommentStatus::Hidden {
                    return Ok(None);
                }
                comments.set_status(comment_id, CommentStatus::Hidden)?;
                repos.contents().apply_comments_delta(&comment.content_id, -1)?;
                Ok(Some(comment.content_id))
            })
            .map_err(EngineError::from_anyhow)?;

        if let Some(content_id) = content_id {
            self.bus.publish(&content_id, ChangeKind::CommentsChanged);
        }
        Ok(())
    }

    fn banned_authors(&self, rows: &[CommentRecord]) -> EngineResult<HashSet<String>> {
        let authors: HashSet<&str> = rows.iter().map(|row| row.author_id.as_str()).collect();
        let mut banned = HashSet::new();
        for author in authors {
            let is_banned = self
                .identity
                .is_shadow_banned(author)
                .map_err(|err| EngineError::Unavailable(format!("identity provider: {err}")))?;
            if is_banned {
                banned.insert(author.to_string());
            }
        }
        Ok(banned)
    }
}
