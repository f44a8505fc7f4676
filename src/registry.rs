//! Process-wide mapping from user id to workspace and conversation
//! session, with lifecycle rules: create-on-demand, replace on new
//! ingest, drop on delete.

use std::collections::HashMap;

use crate::{
    data_dir::DataDir,
    error::Result,
    session::ConversationSession,
    user_id::UserId,
    workspace::UserWorkspace,
};

/// Per-user session table plus the single "active" user, which is the
/// one a delete must not pull the storage out from under.
pub struct SessionRegistry {
    dirs: DataDir,
    sessions: HashMap<UserId, ConversationSession>,
    active: Option<UserId>,
}

impl SessionRegistry {
    pub fn new(dirs: DataDir) -> Self {
        Self {
            dirs,
            sessions: HashMap::new(),
            active: None,
        }
    }

    /// Validate the raw user id and hand back its workspace. No disk
    /// access happens here; directories are created on first ingest.
    pub fn resolve(&self, raw: &str) -> Result<UserWorkspace> {
        let user = UserId::new(raw)?;
        Ok(UserWorkspace::new(self.dirs.clone(), user))
    }

    /// Install a session for the user, replacing any previous one, and
    /// mark the user active.
    pub fn set_active_session(
        &mut self,
        user: UserId,
        session: ConversationSession,
    ) {
        self.active = Some(user.clone());
        self.sessions.insert(user, session);
    }

    pub fn session_mut(
        &mut self,
        user: &UserId,
    ) -> Option<&mut ConversationSession> {
        self.sessions.get_mut(user)
    }

    pub fn active_user(&self) -> Option<&UserId> {
        self.active.as_ref()
    }

    /// Drop the registry entry and, if it was the active one, the active
    /// marker. Called after a workspace delete succeeded, and before
    /// rebinding a user's index so the old session releases its handle
    /// on the persisted database.
    pub fn remove(&mut self, user: &UserId) {
        self.sessions.remove(user);
        if self.active.as_ref() == Some(user) {
            self.active = None;
        }
    }
}
