//! Registry of concurrently open sessions
//!
//! Sessions stack: the most recently activated one receives input routing.
//! Closing the active session reactivates the previous survivor, so nested
//! galleries unwind in reverse opening order.

use crate::events::GalleryEvent;
use crate::session::{GallerySession, SessionId};
use std::collections::BTreeMap;

/// Owner of every open gallery session
#[derive(Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<u64, GallerySession>,
    /// Activation order, most recent last
    activation: Vec<u64>,
    next_id: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an identifier for a session about to be built
    pub fn allocate_id(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId(self.next_id)
    }

    /// Take ownership of a session and make it the active one
    pub fn register(&mut self, mut session: GallerySession) -> SessionId {
        let id = session.id();
        tracing::debug!(session = id.0, "Registering session");
        session.emit(GalleryEvent::Activate { session: id });
        self.activation.retain(|&s| s != id.0);
        self.activation.push(id.0);
        self.sessions.insert(id.0, session);
        id
    }

    pub fn get(&self, id: SessionId) -> Option<&GallerySession> {
        self.sessions.get(&id.0)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut GallerySession> {
        self.sessions.get_mut(&id.0)
    }

    /// Identifier of the most recently activated session
    pub fn active_id(&self) -> Option<SessionId> {
        self.activation.last().map(|&id| SessionId(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut GallerySession> {
        let id = *self.activation.last()?;
        self.sessions.get_mut(&id)
    }

    /// Move an open session to the top of the activation stack
    pub fn activate(&mut self, id: SessionId) -> bool {
        if !self.sessions.contains_key(&id.0) {
            return false;
        }
        if self.active_id() == Some(id) {
            return true;
        }
        self.activation.retain(|&s| s != id.0);
        self.activation.push(id.0);
        if let Some(session) = self.sessions.get_mut(&id.0) {
            session.emit(GalleryEvent::Activate { session: id });
        }
        true
    }

    /// Drop finished sessions; when the active one went away, the previous
    /// survivor is reactivated. Returns the newly active session, if any.
    pub fn reap(&mut self) -> Option<SessionId> {
        let was_active = self.active_id();

        let finished: Vec<u64> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.is_finished())
            .map(|(&id, _)| id)
            .collect();
        for id in finished {
            tracing::debug!(session = id, "Reaping finished session");
            self.sessions.remove(&id);
            self.activation.retain(|&s| s != id);
        }

        let now_active = self.active_id();
        if now_active != was_active {
            if let Some(id) = now_active {
                if let Some(session) = self.sessions.get_mut(&id.0) {
                    session.emit(GalleryEvent::Activate { session: id });
                }
            }
        }
        now_active
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
