use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// The authenticated caller as supplied by the identity provider.
/// Read freshly per request; never cached across requests, so a ban
/// applied mid-session takes effect on the next call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
    #[serde(default)]
    pub shadow_banned: bool,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// External collaborator contract: supplies identity and shadow-ban state,
/// and accepts shadow-ban mutations from admin actions.
pub trait IdentityProvider: Send + Sync {
    fn actor(&self, user_id: &str) -> Result<Option<Actor>>;
    fn is_shadow_banned(&self, user_id: &str) -> Result<bool>;
    /// Returns false when the user is unknown to the provider.
    fn set_shadow_banned(&self, user_id: &str, banned: bool) -> Result<bool>;
}

pub type SharedIdentityProvider = Arc<dyn IdentityProvider>;

/// In-memory directory used by the server binary and tests. Stands in for
/// the real identity service; seedable from a JSON array of actors.
#[derive(Default)]
pub struct InMemoryDirectory {
    actors: RwLock<HashMap<String, Actor>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read identity seed {}", path.display()))?;
        let actors: Vec<Actor> =
            serde_json::from_str(&raw).context("identity seed is not a JSON array of actors")?;
        let directory = Self::new();
        for actor in actors {
            directory.upsert(actor);
        }
        Ok(directory)
    }

    pub fn upsert(&self, actor: Actor) {
        self.actors
            .write()
            .expect("identity directory lock poisoned")
            .insert(actor.user_id.clone(), actor);
    }
}

impl IdentityProvider for InMemoryDirectory {
    fn actor(&self, user_id: &str) -> Result<Option<Actor>> {
        let guard = self
            .actors
            .read()
            .map_err(|_| anyhow::anyhow!("identity directory lock poisoned"))?;
        Ok(guard.get(user_id).cloned())
    }

    fn is_shadow_banned(&self, user_id: &str) -> Result<bool> {
        Ok(self
            .actor(user_id)?
            .map(|actor| actor.shadow_banned)
            .unwrap_or(false))
    }

    fn set_shadow_banned(&self, user_id: &str, banned: bool) -> Result<bool> {
        let mut guard = self
            .actors
            .write()
            .map_err(|_| anyhow::anyhow!("identity directory lock poisoned"))?;
        match guard.get_mut(user_id) {
            Some(actor) => {
                actor.shadow_banned = banned;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
