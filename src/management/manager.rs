use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::Settings,
    errors::{RoomError, RoomResult},
    info,
    management::{
        Playback, Room, SessionRegistry, SkipDecision, TokenManager, TokenStatus, UserSession,
        VoteOutcome, privilege,
    },
    spotify::PlaybackApi,
    success,
    types::{Device, PkceLogin, RoomView, SearchSongResult, SongContext, first_artist},
    utils,
};

/// Result of a vote-or-skip request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// The track was skipped and the votes cleared
    Skipped { needed: u32 },
    Voted { tally: usize, needed: u32 },
    /// The caller had already voted on this song; nothing changed
    AlreadyVoted { tally: usize, needed: u32 },
    /// Another request is executing the skip right now
    Pending { tally: usize, needed: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStart {
    Redirect(String),
    AlreadyAuthenticated,
}

/// Entry point for every room action.
///
/// Resolves the session behind a user or a room code, checks what the caller
/// may do, mutates the room and asks [`Playback`] to talk to Spotify.
pub struct RoomManager {
    registry: Arc<SessionRegistry>,
    playback: Playback,
    room_idle_timeout_secs: i64,
}

impl RoomManager {
    pub fn new(
        registry: Arc<SessionRegistry>,
        api: Arc<dyn PlaybackApi>,
        token_refresh_skew_secs: i64,
        room_idle_timeout_secs: i64,
    ) -> Self {
        let tokens = TokenManager::new(api.clone(), token_refresh_skew_secs);

        Self {
            registry,
            playback: Playback::new(api, tokens),
            room_idle_timeout_secs,
        }
    }

    pub fn from_settings(api: Arc<dyn PlaybackApi>, settings: &Settings) -> Self {
        Self::new(
            Arc::new(SessionRegistry::new()),
            api,
            settings.token_refresh_skew_secs,
            settings.room_idle_timeout_secs,
        )
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Opens a room for `user`, or updates the settings of the room they already host.
    pub fn create_room(
        &self,
        user: &str,
        votes_to_skip: u32,
        guest_can_pause: bool,
    ) -> RoomResult<RoomView> {
        let now = utils::now_timestamp();
        self.evict_idle(now);

        let (session, created) = self.registry.get_or_create(user, |code| {
            let room = Room::new(code, guest_can_pause, votes_to_skip, Utc::now())?;
            Ok(UserSession::new(user, room, now))
        })?;
        session.touch(now);

        let mut room = session.room();
        if created {
            info!(
                "Room {} created (votes to skip: {}, guests can pause: {})",
                room.identifier(),
                votes_to_skip,
                guest_can_pause
            );
        } else if privilege::can_modify_settings(privilege::is_host(&session, user)) {
            room.apply_settings(votes_to_skip, guest_can_pause)?;
            info!("Room {} settings updated", room.identifier());
        }

        Ok(view(&room, true))
    }

    /// The room hosted by `user`, if any.
    pub fn my_room(&self, user: &str) -> RoomResult<RoomView> {
        let session = self
            .registry
            .lookup_by_user(user)
            .ok_or_else(|| RoomError::session_not_found(user))?;
        session.touch(utils::now_timestamp());

        let room = session.room();
        Ok(view(&room, true))
    }

    pub fn get_room(&self, user: &str, room_code: &str) -> RoomResult<RoomView> {
        let session = self.room_session(room_code)?;
        let is_host = privilege::is_host(&session, user);

        let room = session.room();
        Ok(view(&room, is_host))
    }

    pub fn check_ownership(&self, user: &str, room_code: &str) -> RoomResult<bool> {
        let session = self.room_session(room_code)?;
        Ok(privilege::is_host(&session, user))
    }

    /// Closes the room. Only its host may do this.
    pub fn leave_room(&self, user: &str, room_code: &str) -> RoomResult<()> {
        let session = self.room_session(room_code)?;
        if !privilege::is_host(&session, user) {
            return Err(RoomError::Forbidden("only the host can close the room"));
        }

        self.registry.remove(user);
        info!("Room {} closed by its host", room_code);
        Ok(())
    }

    /// The host skips right away; a guest adds a vote, which skips once the
    /// tally reaches the room's threshold.
    pub async fn vote_or_skip(&self, user: &str, room_code: &str) -> RoomResult<SkipOutcome> {
        let session = self.room_session(room_code)?;
        if session.token().current().await.is_none() {
            return Err(RoomError::NotAuthenticated);
        }

        let is_host = privilege::is_host(&session, user);
        let decision = {
            let mut room = session.room();
            let already_voted = !is_host
                && matches!(
                    room.cast_vote(user, Utc::now()),
                    VoteOutcome::AlreadyVoted { .. }
                );

            // a repeated vote still triggers a skip that failed earlier
            match room.evaluate_skip(is_host) {
                SkipDecision::Voting { tally, needed } if already_voted => {
                    return Ok(SkipOutcome::AlreadyVoted { tally, needed });
                }
                decision => decision,
            }
        };

        match decision {
            SkipDecision::Skip => match self.playback.skip_next(session.token()).await {
                Ok(()) => {
                    let needed = {
                        let mut room = session.room();
                        room.complete_skip();
                        room.votes_to_skip()
                    };
                    success!(
                        "Room {}: track skipped{}",
                        room_code,
                        if is_host { " by the host" } else { " by vote" }
                    );
                    Ok(SkipOutcome::Skipped { needed })
                }
                Err(e) => {
                    session.room().abort_skip();
                    Err(e)
                }
            },
            SkipDecision::Voting { tally, needed } => Ok(SkipOutcome::Voted { tally, needed }),
            SkipDecision::InFlight => {
                let room = session.room();
                Ok(SkipOutcome::Pending {
                    tally: room.tally(),
                    needed: room.votes_to_skip(),
                })
            }
        }
    }

    /// Pauses if the room is playing, resumes otherwise. Returns the new playing state.
    pub async fn toggle_playback(&self, user: &str, room_code: &str) -> RoomResult<bool> {
        let session = self.room_session(room_code)?;
        let is_host = privilege::is_host(&session, user);

        let target = {
            let mut room = session.room();
            if !privilege::can_control_playback(&room, is_host) {
                return Err(RoomError::Forbidden(
                    "guests are not allowed to pause in this room",
                ));
            }

            match room.begin_toggle() {
                Some(target) => target,
                // the toggle in flight already heads where this one would
                None => return Ok(!room.currently_playing()),
            }
        };

        let result = if target {
            self.playback.resume(session.token()).await
        } else {
            self.playback.pause(session.token()).await
        };

        session
            .room()
            .finish_toggle(result.as_ref().ok().map(|_| target));
        result.map(|_| target)
    }

    /// Goes back to the previous track. Host only.
    pub async fn rollback(&self, user: &str, room_code: &str) -> RoomResult<()> {
        let session = self.room_session(room_code)?;
        if !privilege::is_host(&session, user) {
            return Err(RoomError::Forbidden("only the host can go back a track"));
        }

        self.playback.skip_previous(session.token()).await?;
        // the song is about to change, stale votes must not carry over
        session.room().on_song_change(None);
        Ok(())
    }

    pub async fn search(&self, room_code: &str, query: &str) -> RoomResult<Vec<SearchSongResult>> {
        let session = self.room_session(room_code)?;
        let tracks = self.playback.search_tracks(session.token(), query).await?;

        Ok(tracks.into_iter().map(SearchSongResult::from).collect())
    }

    pub async fn enqueue_track(&self, room_code: &str, track_uri: &str) -> RoomResult<()> {
        let session = self.room_session(room_code)?;
        self.playback
            .enqueue_track(session.token(), track_uri)
            .await?;

        info!("Room {}: queued {}", room_code, track_uri);
        Ok(())
    }

    /// Devices of the caller's own Spotify account.
    pub async fn list_devices(&self, user: &str) -> RoomResult<Vec<Device>> {
        let session = self.own_session(user)?;
        self.playback.list_devices(session.token()).await
    }

    pub async fn force_device(&self, user: &str, device_id: &str) -> RoomResult<()> {
        let session = self.own_session(user)?;
        self.playback
            .transfer_playback(session.token(), device_id)
            .await
    }

    /// What the room's host is playing, keeping the room's song and playing
    /// state in sync with Spotify. `None` when nothing is playing.
    pub async fn current_song(&self, room_code: &str) -> RoomResult<Option<SongContext>> {
        let session = self.room_session(room_code)?;
        let Some(snapshot) = self.playback.current_playback(session.token()).await? else {
            session.room().set_currently_playing(false);
            return Ok(None);
        };

        let mut room = session.room();
        room.set_currently_playing(snapshot.is_playing);

        let Some(track) = snapshot.item else {
            return Ok(None);
        };

        let song_id = track.id.clone().unwrap_or_else(|| track.uri.clone());
        room.observe_song(song_id);

        Ok(Some(SongContext {
            artist: first_artist(&track),
            song_duration: track.duration_ms,
            current_progress: snapshot.progress_ms.unwrap_or_default(),
            current_img_url: track.album.images.first().map(|i| i.url.clone()),
            song_title: track.name,
            playing_status: snapshot.is_playing,
            current_votes: room.tally(),
            needed_votes_to_skip: room.votes_to_skip(),
        }))
    }

    /// Starts the Spotify login for the room's host.
    pub async fn begin_login(&self, user: &str, room_code: &str) -> RoomResult<LoginStart> {
        let session = self.room_session(room_code)?;
        if !privilege::is_host(&session, user) {
            return Err(RoomError::Forbidden("only the host can connect Spotify"));
        }

        let status = session
            .token()
            .status(utils::now_timestamp(), self.playback.tokens().skew_secs())
            .await;
        if matches!(status, TokenStatus::Valid | TokenStatus::ExpiringSoon) {
            return Ok(LoginStart::AlreadyAuthenticated);
        }

        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);
        let state = utils::generate_oauth_state();

        let url = self.playback.api().authorize_url(&code_challenge, &state)?;
        session.begin_login(PkceLogin {
            code_verifier,
            state,
        });

        Ok(LoginStart::Redirect(url))
    }

    /// Finishes the login started by [`RoomManager::begin_login`]. Returns the room code.
    pub async fn complete_login(&self, user: &str, code: &str, state: &str) -> RoomResult<String> {
        let session = self.own_session(user)?;
        let login = session
            .take_login(state)
            .ok_or(RoomError::InvalidLoginState("no login in progress for this state"))?;

        let token = self
            .playback
            .tokens()
            .exchange_code(code, &login.code_verifier)
            .await?;
        session.token().install(token).await;

        let room_code = session.room_code();
        success!("Room {} connected to Spotify", room_code);
        Ok(room_code)
    }

    pub async fn auth_status(&self, room_code: &str) -> RoomResult<TokenStatus> {
        let session = self.room_session(room_code)?;
        Ok(session
            .token()
            .status(utils::now_timestamp(), self.playback.tokens().skew_secs())
            .await)
    }

    /// Drops rooms nobody touched within the idle timeout. Zero disables it.
    pub fn evict_idle(&self, now: i64) -> usize {
        if self.room_idle_timeout_secs <= 0 {
            return 0;
        }

        let evicted = self.registry.evict_idle(now, self.room_idle_timeout_secs);
        for code in &evicted {
            info!("Room {} evicted after being idle", code);
        }
        evicted.len()
    }

    fn room_session(&self, room_code: &str) -> RoomResult<Arc<UserSession>> {
        let code = utils::normalize_room_code(room_code);
        let (_, session) = self
            .registry
            .lookup_by_room(&code)
            .ok_or_else(|| RoomError::room_not_found(&code))?;

        session.touch(utils::now_timestamp());
        Ok(session)
    }

    fn own_session(&self, user: &str) -> RoomResult<Arc<UserSession>> {
        let session = self
            .registry
            .lookup_by_user(user)
            .ok_or_else(|| RoomError::session_not_found(user))?;

        session.touch(utils::now_timestamp());
        Ok(session)
    }
}

fn view(room: &Room, is_host: bool) -> RoomView {
    RoomView {
        room_identifier: room.identifier().to_string(),
        guest_can_pause: room.guest_can_pause(),
        votes_to_skip: room.votes_to_skip(),
        created_at: room.created_at(),
        current_song_id: room.current_song_id().map(str::to_string),
        currently_playing: room.currently_playing(),
        current_votes: room.tally(),
        is_host,
    }
}
