//! In-memory session storage with an indexed room lookup.
//!
//! Sessions are keyed by the host's user identifier. A secondary index maps
//! each live room code to its host so guests can find a room without scanning
//! every session.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};

use crate::{errors::RoomResult, management::UserSession, utils};

pub struct SessionRegistry {
    /// Primary: host identifier -> session
    sessions: DashMap<String, Arc<UserSession>>,
    /// Secondary: room code -> host identifier
    room_index: DashMap<String, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            room_index: DashMap::new(),
        }
    }

    /// Returns the user's session, building it with `factory` if there is none.
    ///
    /// The check and the insert happen under the user's entry lock, so the
    /// factory runs at most once per user even under concurrent calls. The
    /// factory receives a room code that is already reserved in the index.
    /// The boolean is `true` when a session was created.
    pub fn get_or_create<F>(&self, user: &str, factory: F) -> RoomResult<(Arc<UserSession>, bool)>
    where
        F: FnOnce(String) -> RoomResult<UserSession>,
    {
        match self.sessions.entry(user.to_string()) {
            Entry::Occupied(entry) => Ok((entry.get().clone(), false)),
            Entry::Vacant(entry) => {
                let code = self.reserve_room_code(user);

                let session = match factory(code.clone()) {
                    Ok(session) => Arc::new(session),
                    Err(e) => {
                        self.room_index.remove(&code);
                        return Err(e);
                    }
                };

                entry.insert(session.clone());
                Ok((session, true))
            }
        }
    }

    /// Claims a fresh room code for `user` in the index.
    fn reserve_room_code(&self, user: &str) -> String {
        loop {
            let code = utils::generate_room_code(utils::ROOM_CODE_LENGTH);
            if let Entry::Vacant(slot) = self.room_index.entry(code.clone()) {
                slot.insert(user.to_string());
                return code;
            }
        }
    }

    pub fn lookup_by_user(&self, user: &str) -> Option<Arc<UserSession>> {
        self.sessions.get(user).map(|s| s.value().clone())
    }

    /// Finds the session owning `room_code` together with its host.
    pub fn lookup_by_room(&self, room_code: &str) -> Option<(String, Arc<UserSession>)> {
        let host = self.room_index.get(room_code).map(|h| h.value().clone())?;
        let session = self.lookup_by_user(&host)?;

        // the session may have been replaced between the two reads
        if session.room_code() != room_code {
            return None;
        }

        Some((host, session))
    }

    /// Drops the session and its room code. Ownership must be checked by the caller.
    pub fn remove(&self, user: &str) -> Option<Arc<UserSession>> {
        let (_, session) = self.sessions.remove(user)?;
        self.room_index
            .remove_if(&session.room_code(), |_, host| host == user);
        Some(session)
    }

    /// Removes every session idle for longer than `max_idle_secs`.
    ///
    /// Returns the removed room codes.
    pub fn evict_idle(&self, now: i64, max_idle_secs: i64) -> Vec<String> {
        let idle: Vec<String> = self
            .sessions
            .iter()
            .filter(|s| now - s.value().last_active() > max_idle_secs)
            .map(|s| s.key().clone())
            .collect();

        idle.iter()
            .filter_map(|user| {
                // re-check under the entry lock, the session may have been used meanwhile
                let (_, session) = self
                    .sessions
                    .remove_if(user, |_, s| now - s.last_active() > max_idle_secs)?;
                let code = session.room_code();
                self.room_index.remove_if(&code, |_, host| host == user);
                Some(code)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
