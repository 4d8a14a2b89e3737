use crate::management::{Room, UserSession};

/// The host is whoever created the session, compared by identifier value.
pub fn is_host(session: &UserSession, user: &str) -> bool {
    session.host() == user
}

pub fn can_control_playback(room: &Room, is_host: bool) -> bool {
    room.guest_can_pause() || is_host
}

pub fn can_modify_settings(is_host: bool) -> bool {
    is_host
}
