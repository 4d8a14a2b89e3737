use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::{
    management::{Room, TokenCell},
    types::PkceLogin,
};

/// Everything bound to one host: their room, their Spotify token and the
/// login they may have in progress.
pub struct UserSession {
    host: String,
    room: Mutex<Room>,
    token: TokenCell,
    pending_login: Mutex<Option<PkceLogin>>,
    last_active: AtomicI64,
}

impl UserSession {
    pub fn new(host: &str, room: Room, now: i64) -> Self {
        Self {
            host: host.to_string(),
            room: Mutex::new(room),
            token: TokenCell::default(),
            pending_login: Mutex::new(None),
            last_active: AtomicI64::new(now),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Locks the room. Never hold the guard across an `.await`.
    pub fn room(&self) -> MutexGuard<'_, Room> {
        self.room.lock()
    }

    /// Copy of the room code without keeping the lock.
    pub fn room_code(&self) -> String {
        self.room.lock().identifier().to_string()
    }

    pub fn token(&self) -> &TokenCell {
        &self.token
    }

    pub fn begin_login(&self, login: PkceLogin) {
        *self.pending_login.lock() = Some(login);
    }

    /// Takes the pending login if `state` matches it.
    ///
    /// A mismatching state leaves the pending login in place.
    pub fn take_login(&self, state: &str) -> Option<PkceLogin> {
        let mut pending = self.pending_login.lock();
        match pending.as_ref() {
            Some(login) if login.state == state => pending.take(),
            _ => None,
        }
    }

    pub fn touch(&self, now: i64) {
        self.last_active.fetch_max(now, Ordering::Relaxed);
    }

    pub fn last_active(&self) -> i64 {
        self.last_active.load(Ordering::Relaxed)
    }
}
