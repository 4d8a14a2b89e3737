use chrono::{DateTime, Utc};

use crate::errors::{RoomError, RoomResult};

/// One guest's request to skip a particular song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub voter: String,
    pub song_id: Option<String>,
    pub cast_at: DateTime<Utc>,
}

/// Where a room is in the vote-to-skip cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteState {
    /// No votes for the current song
    Idle,
    /// Some votes, threshold not reached
    Voting,
    /// A skip has been decided and is being executed
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Counted { tally: usize },
    /// The voter already voted on this song, nothing changed
    AlreadyVoted { tally: usize },
    /// A skip is running; the vote would be cleared with the skipped song
    SkipInFlight { tally: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDecision {
    /// Caller must execute the skip, then report back with
    /// [`Room::complete_skip`] or [`Room::abort_skip`].
    Skip,
    Voting { tally: usize, needed: u32 },
    /// Another request already decided to skip this song
    InFlight,
}

/// A listening room: its settings, what is playing, and the votes against it.
///
/// A room is always accessed through its session's lock; none of these
/// methods block or await.
#[derive(Debug, Clone)]
pub struct Room {
    identifier: String,
    guest_can_pause: bool,
    votes_to_skip: u32,
    created_at: DateTime<Utc>,
    current_song_id: Option<String>,
    currently_playing: bool,
    votes: Vec<Vote>,
    skip_in_flight: bool,
    toggle_in_flight: bool,
}

impl Room {
    pub fn new(
        identifier: String,
        guest_can_pause: bool,
        votes_to_skip: u32,
        created_at: DateTime<Utc>,
    ) -> RoomResult<Self> {
        validate_votes_to_skip(votes_to_skip)?;

        Ok(Self {
            identifier,
            guest_can_pause,
            votes_to_skip,
            created_at,
            current_song_id: None,
            currently_playing: false,
            votes: Vec::new(),
            skip_in_flight: false,
            toggle_in_flight: false,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn guest_can_pause(&self) -> bool {
        self.guest_can_pause
    }

    pub fn votes_to_skip(&self) -> u32 {
        self.votes_to_skip
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn current_song_id(&self) -> Option<&str> {
        self.current_song_id.as_deref()
    }

    pub fn currently_playing(&self) -> bool {
        self.currently_playing
    }

    pub fn set_currently_playing(&mut self, playing: bool) {
        self.currently_playing = playing;
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn tally(&self) -> usize {
        self.votes.len()
    }

    pub fn state(&self) -> VoteState {
        if self.skip_in_flight {
            VoteState::Resolved
        } else if self.votes.is_empty() {
            VoteState::Idle
        } else {
            VoteState::Voting
        }
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.votes
            .iter()
            .any(|v| v.voter == voter && v.song_id == self.current_song_id)
    }

    /// Records a vote against the current song, at most one per voter.
    pub fn cast_vote(&mut self, voter: &str, now: DateTime<Utc>) -> VoteOutcome {
        if self.skip_in_flight {
            return VoteOutcome::SkipInFlight { tally: self.tally() };
        }
        if self.has_voted(voter) {
            return VoteOutcome::AlreadyVoted { tally: self.tally() };
        }

        self.votes.push(Vote {
            voter: voter.to_string(),
            song_id: self.current_song_id.clone(),
            cast_at: now,
        });

        VoteOutcome::Counted { tally: self.tally() }
    }

    /// Decides whether the current song should be skipped.
    ///
    /// The host skips unconditionally. Otherwise the vote that brings the
    /// tally to `votes_to_skip` triggers the skip.
    pub fn evaluate_skip(&mut self, requester_is_host: bool) -> SkipDecision {
        if self.skip_in_flight {
            return SkipDecision::InFlight;
        }

        let tally = self.tally();
        if requester_is_host || tally >= self.votes_to_skip as usize {
            self.skip_in_flight = true;
            return SkipDecision::Skip;
        }

        SkipDecision::Voting {
            tally,
            needed: self.votes_to_skip,
        }
    }

    /// The skip went through: the next song starts with a clean slate.
    ///
    /// Which song plays next is unknown until Spotify reports it, see
    /// [`Room::observe_song`].
    pub fn complete_skip(&mut self) {
        self.skip_in_flight = false;
        self.votes.clear();
        self.current_song_id = None;
    }

    /// The skip failed upstream; votes stay so the next vote can retry.
    pub fn abort_skip(&mut self) {
        self.skip_in_flight = false;
    }

    /// Returns `true` if the song actually changed.
    pub fn on_song_change(&mut self, new_song_id: Option<String>) -> bool {
        let changed = self.current_song_id != new_song_id;
        self.current_song_id = new_song_id;
        self.votes.clear();
        changed
    }

    /// Records the song Spotify reports as playing.
    ///
    /// Votes cast while the song was unknown were meant for this song and are
    /// kept. Returns `true` if the song changed.
    pub fn observe_song(&mut self, song_id: String) -> bool {
        match self.current_song_id.as_deref() {
            Some(current) if current == song_id => false,
            Some(_) => self.on_song_change(Some(song_id)),
            None => {
                for vote in self.votes.iter_mut().filter(|v| v.song_id.is_none()) {
                    vote.song_id = Some(song_id.clone());
                }
                self.current_song_id = Some(song_id);
                true
            }
        }
    }

    /// Claims the play/pause toggle and returns the state to switch to.
    ///
    /// `None` while another toggle is still waiting on Spotify. The caller
    /// must report back with [`Room::finish_toggle`].
    pub fn begin_toggle(&mut self) -> Option<bool> {
        if self.toggle_in_flight {
            return None;
        }
        self.toggle_in_flight = true;
        Some(!self.currently_playing)
    }

    /// `playing` is the new state if the toggle went through, `None` if it failed.
    pub fn finish_toggle(&mut self, playing: Option<bool>) {
        self.toggle_in_flight = false;
        if let Some(playing) = playing {
            self.currently_playing = playing;
        }
    }

    pub fn apply_settings(&mut self, votes_to_skip: u32, guest_can_pause: bool) -> RoomResult<()> {
        validate_votes_to_skip(votes_to_skip)?;

        self.votes_to_skip = votes_to_skip;
        self.guest_can_pause = guest_can_pause;
        Ok(())
    }
}

fn validate_votes_to_skip(votes_to_skip: u32) -> RoomResult<()> {
    if votes_to_skip == 0 {
        return Err(RoomError::InvalidSettings(
            "votesToSkip must be at least 1".to_string(),
        ));
    }
    Ok(())
}
