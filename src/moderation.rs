use crate::database::repositories::CommentRepository;
use crate::database::Database;
use crate::error::{EngineError, EngineResult};
use crate::fanout::{ChangeBus, ChangeKind};
use crate::identity::{Actor, SharedIdentityProvider};

/// Write-time gate: no identity means the request never reaches the store.
pub fn require_actor(actor: Option<&Actor>) -> EngineResult<&Actor> {
    actor.ok_or(EngineError::Unauthenticated)
}

pub fn ensure_admin(actor: &Actor) -> EngineResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(EngineError::forbidden("admin privileges required"))
    }
}

/// Shadow-banned actors are rejected outright at submission time, with the
/// reason stated. Read-time filtering is handled separately so a ban
/// applied later still suppresses earlier comments.
pub fn ensure_may_comment(actor: &Actor) -> EngineResult<()> {
    if actor.shadow_banned {
        Err(EngineError::forbidden(
            "your account is restricted from commenting",
        ))
    } else {
        Ok(())
    }
}

#[derive(Clone)]
pub struct ModerationService {
    database: Database,
    identity: SharedIdentityProvider,
    bus: ChangeBus,
}

impl ModerationService {
    pub fn new(database: Database, identity: SharedIdentityProvider, bus: ChangeBus) -> Self {
        Self {
            database,
            identity,
            bus,
        }
    }

    /// Flips the shadow-ban flag on the identity provider, then nudges
    /// every content item the target has commented on so open
    /// subscriptions re-pull their comment lists.
    pub fn set_shadow_ban(
        &self,
        actor: Option<&Actor>,
        target_user_id: &str,
        banned: bool,
    ) -> EngineResult<()> {
        let actor = require_actor(actor)?;
        ensure_admin(actor)?;

        let known = self
            .identity
            .set_shadow_banned(target_user_id, banned)
            .map_err(|err| EngineError::Unavailable(format!("identity provider: {err}")))?;
        if !known {
            return Err(EngineError::not_found(format!(
                "no such user {target_user_id}"
            )));
        }
        tracing::info!(target_user_id, banned, admin = %actor.user_id, "shadow ban updated");

        let touched = self
            .database
            .with_repositories(|repos| repos.comments().content_ids_for_author(target_user_id))
            .map_err(EngineError::from_anyhow)?;
        for content_id in touched {
            self.bus.publish(&content_id, ChangeKind::CommentsChanged);
        }
        Ok(())
    }
}
