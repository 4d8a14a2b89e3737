mod common;

use std::sync::{Arc, atomic::Ordering};

use common::{GUEST_1, GUEST_2, GUEST_3, HOST, MockSpotify, manager, open_room, playing};
use spotiroom::{
    errors::RoomError,
    management::{LoginStart, RoomManager, SessionRegistry, SkipOutcome, TokenStatus},
    spotify::ApiError,
    utils,
};

#[tokio::test]
async fn test_votes_reach_threshold_and_skip() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    let outcome = manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::Voted { tally: 1, needed: 2 });
    assert_eq!(MockSpotify::count(&api.skip_calls), 0);

    let outcome = manager.vote_or_skip(GUEST_2, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::Skipped { needed: 2 });
    assert_eq!(MockSpotify::count(&api.skip_calls), 1);

    let room = manager.get_room(GUEST_1, &code).unwrap();
    assert_eq!(room.current_votes, 0);
}

#[tokio::test]
async fn test_revote_after_skip() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    manager.vote_or_skip(GUEST_2, &code).await.unwrap();

    let outcome = manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::Voted { tally: 1, needed: 2 });
}

#[tokio::test]
async fn test_duplicate_vote_is_not_counted() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 3, false).await;

    manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    let outcome = manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::AlreadyVoted { tally: 1, needed: 3 });
}

#[tokio::test]
async fn test_host_skips_immediately() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 5, false).await;

    manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    let outcome = manager.vote_or_skip(HOST, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::Skipped { needed: 5 });
    assert_eq!(MockSpotify::count(&api.skip_calls), 1);
    assert_eq!(manager.get_room(HOST, &code).unwrap().current_votes, 0);
}

#[tokio::test]
async fn test_vote_requires_authenticated_room() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = manager
        .create_room(HOST, 2, false)
        .unwrap()
        .room_identifier;

    let result = manager.vote_or_skip(GUEST_1, &code).await;
    assert!(matches!(result, Err(RoomError::NotAuthenticated)));
    assert_eq!(manager.get_room(GUEST_1, &code).unwrap().current_votes, 0);
}

#[tokio::test]
async fn test_failed_skip_keeps_votes() {
    let api = MockSpotify::new();
    api.fail_skip.store(true, Ordering::SeqCst);
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    let result = manager.vote_or_skip(GUEST_2, &code).await;
    assert!(matches!(result, Err(RoomError::UpstreamFailure(_))));
    assert_eq!(manager.get_room(HOST, &code).unwrap().current_votes, 2);

    api.fail_skip.store(false, Ordering::SeqCst);
    let outcome = manager.vote_or_skip(GUEST_3, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::Skipped { needed: 2 });
}

#[tokio::test]
async fn test_repeat_voter_retries_failed_skip() {
    let api = MockSpotify::new();
    api.fail_skip.store(true, Ordering::SeqCst);
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    assert!(manager.vote_or_skip(GUEST_2, &code).await.is_err());

    api.fail_skip.store(false, Ordering::SeqCst);
    let outcome = manager.vote_or_skip(GUEST_2, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::Skipped { needed: 2 });
    assert_eq!(MockSpotify::count(&api.skip_calls), 1);
}

#[tokio::test]
async fn test_vote_after_skip_survives_song_poll() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    *api.playback.lock() = Some(playing("song-a"));
    manager.current_song(&code).await.unwrap();
    manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    let outcome = manager.vote_or_skip(GUEST_2, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::Skipped { needed: 2 });

    *api.playback.lock() = Some(playing("song-b"));
    let outcome = manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::Voted { tally: 1, needed: 2 });

    let song = manager.current_song(&code).await.unwrap().expect("song");
    assert_eq!(song.current_votes, 1);

    let outcome = manager.vote_or_skip(GUEST_1, &code).await.unwrap();
    assert_eq!(outcome, SkipOutcome::AlreadyVoted { tally: 1, needed: 2 });
}

#[tokio::test]
async fn test_idle_player_resets_playing_state() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    assert!(manager.toggle_playback(HOST, &code).await.unwrap());

    // nothing is playing any more, e.g. the host closed Spotify
    assert!(manager.current_song(&code).await.unwrap().is_none());
    assert!(!manager.get_room(HOST, &code).unwrap().currently_playing);

    assert!(manager.toggle_playback(HOST, &code).await.unwrap());
    assert_eq!(MockSpotify::count(&api.resume_calls), 2);
    assert_eq!(MockSpotify::count(&api.pause_calls), 0);
}

#[tokio::test]
async fn test_failed_toggle_releases_claim() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    api.reject_tokens.store(2, Ordering::SeqCst);
    assert!(manager.toggle_playback(HOST, &code).await.is_err());
    assert!(!manager.get_room(HOST, &code).unwrap().currently_playing);

    assert!(manager.toggle_playback(HOST, &code).await.unwrap());
    assert_eq!(MockSpotify::count(&api.resume_calls), 1);
}

#[tokio::test]
async fn test_guest_cannot_toggle_playback() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    let result = manager.toggle_playback(GUEST_1, &code).await;
    assert!(matches!(result, Err(RoomError::Forbidden(_))));
    assert_eq!(MockSpotify::count(&api.player_calls), 0);

    assert!(manager.toggle_playback(HOST, &code).await.unwrap());
    assert_eq!(MockSpotify::count(&api.resume_calls), 1);
    assert!(!manager.toggle_playback(HOST, &code).await.unwrap());
    assert_eq!(MockSpotify::count(&api.pause_calls), 1);
}

#[tokio::test]
async fn test_guest_can_toggle_when_allowed() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, true).await;

    assert!(manager.toggle_playback(GUEST_1, &code).await.unwrap());
    assert!(manager.get_room(GUEST_1, &code).unwrap().currently_playing);
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_and_retried_once() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    api.reject_tokens.store(1, Ordering::SeqCst);
    manager.toggle_playback(HOST, &code).await.unwrap();

    assert_eq!(MockSpotify::count(&api.refresh_calls), 1);
    assert_eq!(MockSpotify::count(&api.player_calls), 2);
    assert_eq!(*api.seen_tokens.lock(), vec!["access-0", "access-1"]);
}

#[tokio::test]
async fn test_second_rejection_is_an_upstream_failure() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    api.reject_tokens.store(2, Ordering::SeqCst);
    let result = manager.toggle_playback(HOST, &code).await;

    assert!(matches!(
        result,
        Err(RoomError::UpstreamFailure(ApiError::Unauthorized))
    ));
    assert_eq!(MockSpotify::count(&api.player_calls), 2);
    assert!(!manager.get_room(HOST, &code).unwrap().currently_playing);
}

#[tokio::test]
async fn test_rollback_is_host_only() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    let result = manager.rollback(GUEST_1, &code).await;
    assert!(matches!(result, Err(RoomError::Forbidden(_))));

    manager.rollback(HOST, &code).await.unwrap();
    assert_eq!(MockSpotify::count(&api.previous_calls), 1);
}

#[tokio::test]
async fn test_unknown_room() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());

    assert!(matches!(
        manager.get_room(GUEST_1, "ZZZZZ"),
        Err(RoomError::NotFound { .. })
    ));
    assert!(matches!(
        manager.vote_or_skip(GUEST_1, "ZZZZZ").await,
        Err(RoomError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_room_code_is_case_insensitive() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    let room = manager.get_room(GUEST_1, &code.to_lowercase()).unwrap();
    assert_eq!(room.room_identifier, code);
    assert!(!room.is_host);
    assert!(manager.get_room(HOST, &code).unwrap().is_host);
}

#[tokio::test]
async fn test_create_room_twice_updates_settings() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());

    let first = manager.create_room(HOST, 2, false).unwrap();
    let second = manager.create_room(HOST, 4, true).unwrap();

    assert_eq!(first.room_identifier, second.room_identifier);
    assert_eq!(second.votes_to_skip, 4);
    assert!(second.guest_can_pause);
    assert_eq!(manager.registry().len(), 1);
}

#[tokio::test]
async fn test_create_room_rejects_zero_threshold() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());

    let result = manager.create_room(HOST, 0, false);
    assert!(matches!(result, Err(RoomError::InvalidSettings(_))));
    assert!(manager.registry().is_empty());
}

#[tokio::test]
async fn test_my_room_and_ownership() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());

    assert!(matches!(
        manager.my_room(HOST),
        Err(RoomError::NotFound { .. })
    ));

    let code = open_room(&manager, 2, false).await;
    assert_eq!(manager.my_room(HOST).unwrap().room_identifier, code);
    assert!(manager.check_ownership(HOST, &code).unwrap());
    assert!(!manager.check_ownership(GUEST_1, &code).unwrap());
}

#[tokio::test]
async fn test_only_host_can_leave() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    assert!(matches!(
        manager.leave_room(GUEST_1, &code),
        Err(RoomError::Forbidden(_))
    ));

    manager.leave_room(HOST, &code).unwrap();
    assert!(matches!(
        manager.get_room(GUEST_1, &code),
        Err(RoomError::NotFound { .. })
    ));
    assert!(manager.registry().is_empty());
}

#[tokio::test]
async fn test_current_song_tracks_song_changes() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 3, false).await;

    assert!(manager.current_song(&code).await.unwrap().is_none());

    *api.playback.lock() = Some(playing("song-1"));
    manager.current_song(&code).await.unwrap();
    manager.vote_or_skip(GUEST_1, &code).await.unwrap();

    // polling the same song keeps the votes
    let song = manager.current_song(&code).await.unwrap().expect("song");
    assert_eq!(song.current_votes, 1);
    assert_eq!(song.needed_votes_to_skip, 3);
    assert_eq!(song.artist, "Test Artist");
    assert_eq!(song.current_progress, 42_000);
    assert!(song.playing_status);
    assert_eq!(
        song.current_img_url.as_deref(),
        Some("https://images.example/large")
    );

    *api.playback.lock() = Some(playing("song-2"));
    let song = manager.current_song(&code).await.unwrap().expect("song");
    assert_eq!(song.current_votes, 0);

    let room = manager.get_room(GUEST_1, &code).unwrap();
    assert_eq!(room.current_song_id.as_deref(), Some("song-2"));
    assert!(room.currently_playing);
}

#[tokio::test]
async fn test_search_and_enqueue() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = open_room(&manager, 2, false).await;

    let results = manager.search(&code, "daft").await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].song_name, "daft one");
    assert_eq!(results[0].artist_name, "Test Artist");
    assert_eq!(results[0].song_href, "spotify:track:track-1");
    assert_eq!(
        results[0].picture_uri.as_deref(),
        Some("https://images.example/small")
    );

    manager
        .enqueue_track(&code, "spotify:track:track-1")
        .await
        .unwrap();
    assert_eq!(MockSpotify::count(&api.enqueue_calls), 1);
}

#[tokio::test]
async fn test_devices_belong_to_the_caller() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    open_room(&manager, 2, false).await;

    assert!(matches!(
        manager.list_devices(GUEST_1).await,
        Err(RoomError::NotFound { .. })
    ));

    let devices = manager.list_devices(HOST).await.unwrap();
    assert_eq!(devices.len(), 1);

    manager.force_device(HOST, "device-1").await.unwrap();
    assert_eq!(MockSpotify::count(&api.transfer_calls), 1);
}

#[tokio::test]
async fn test_login_flow() {
    let api = MockSpotify::new();
    let manager = manager(api.clone());
    let code = manager
        .create_room(HOST, 2, false)
        .unwrap()
        .room_identifier;
    assert_eq!(
        manager.auth_status(&code).await.unwrap(),
        TokenStatus::Unauthenticated
    );

    assert!(matches!(
        manager.begin_login(GUEST_1, &code).await,
        Err(RoomError::Forbidden(_))
    ));

    let LoginStart::Redirect(url) = manager.begin_login(HOST, &code).await.unwrap() else {
        panic!("expected a login redirect");
    };
    let state = url
        .split("state=")
        .nth(1)
        .expect("url carries the state")
        .to_string();

    assert!(matches!(
        manager.complete_login(HOST, "good-code", "forged").await,
        Err(RoomError::InvalidLoginState(_))
    ));

    let room_code = manager
        .complete_login(HOST, "good-code", &state)
        .await
        .unwrap();
    assert_eq!(room_code, code);
    assert_eq!(MockSpotify::count(&api.exchange_calls), 1);
    assert_eq!(
        manager.auth_status(&code).await.unwrap(),
        TokenStatus::Valid
    );

    assert_eq!(
        manager.begin_login(HOST, &code).await.unwrap(),
        LoginStart::AlreadyAuthenticated
    );
}

#[tokio::test]
async fn test_idle_rooms_are_evicted() {
    let api = MockSpotify::new();
    let manager = RoomManager::new(Arc::new(SessionRegistry::new()), api, 10, 60);
    let code = manager
        .create_room(HOST, 2, false)
        .unwrap()
        .room_identifier;

    assert_eq!(manager.evict_idle(utils::now_timestamp()), 0);
    assert_eq!(manager.evict_idle(utils::now_timestamp() + 120), 1);
    assert!(matches!(
        manager.get_room(GUEST_1, &code),
        Err(RoomError::NotFound { .. })
    ));
}
