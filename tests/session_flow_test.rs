use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use pulse::app::{App, Config};
use pulse::player::seed_playlist;
use pulse::room::{RoomEvent, RoomKind, RoomPhase};
use pulse::vibe::{VibeAnalysis, VibeError, VibeSource, VibeUpdate};
use pulse::visualizer::{SampleBuffer, CEILING, FLOOR};
use pulse::{RepeatMode, Track};

/// Annotator stub that answers instantly for every track except one id,
/// which it stalls on. Lets tests race a slow request against a fast one.
struct StallingSource {
    stall_id: &'static str,
}

#[async_trait]
impl VibeSource for StallingSource {
    async fn analyze(&self, track: &Track) -> Result<VibeAnalysis, VibeError> {
        if track.id == self.stall_id {
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        Ok(VibeAnalysis {
            mood: format!("mood-{}", track.id),
            color_palette: vec!["#101010".to_string()],
            description: "steady".to_string(),
            energy_level: 5,
        })
    }

    async fn lyrics(&self, track: &Track) -> Result<String, VibeError> {
        Ok(format!("lyrics-{}", track.id))
    }
}

struct FailingSource;

#[async_trait]
impl VibeSource for FailingSource {
    async fn analyze(&self, _track: &Track) -> Result<VibeAnalysis, VibeError> {
        Err(VibeError::Malformed("offline".to_string()))
    }

    async fn lyrics(&self, _track: &Track) -> Result<String, VibeError> {
        Err(VibeError::Malformed("offline".to_string()))
    }
}

fn new_app(source: Arc<dyn VibeSource>) -> (App, mpsc::Receiver<VibeUpdate>, mpsc::Receiver<RoomEvent>) {
    let (vibe_tx, vibe_rx) = mpsc::channel(32);
    let (room_tx, room_rx) = mpsc::channel(32);
    let app = App::new(Config::default(), seed_playlist(), source, vibe_tx, room_tx);
    (app, vibe_rx, room_rx)
}

#[tokio::test]
async fn superseded_mood_request_never_lands() {
    let (mut app, mut vibe_rx, _room_rx) =
        new_app(Arc::new(StallingSource { stall_id: "1" }));
    let mut rng = StdRng::seed_from_u64(7);

    // The opening track stalls; skipping forward supersedes that request.
    app.request_mood();
    app.next_track(&mut rng);
    let current = app.player.current_track().map(|t| t.id.clone()).unwrap();
    assert_ne!(current, "1");

    let update = tokio::time::timeout(Duration::from_secs(2), vibe_rx.recv())
        .await
        .ok()
        .flatten()
        .unwrap();
    assert_eq!(update.track_id(), current);
    assert!(app.apply_vibe_update(update));
    assert_eq!(app.vibe().unwrap().mood, format!("mood-{}", current));

    // The stalled request was aborted, so nothing else arrives.
    let extra = tokio::time::timeout(Duration::from_millis(400), vibe_rx.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn stale_update_for_previous_track_is_dropped() {
    let (mut app, _vibe_rx, _room_rx) = new_app(Arc::new(FailingSource));
    let mut rng = StdRng::seed_from_u64(3);
    app.next_track(&mut rng);

    let stale = VibeUpdate::Mood {
        track_id: "1".to_string(),
        vibe: VibeAnalysis::fallback(),
    };
    assert!(!app.apply_vibe_update(stale));
    assert!(app.vibe().is_none());
}

#[tokio::test]
async fn failed_annotator_falls_back_without_erroring() {
    let source = FailingSource;
    let track = seed_playlist().remove(0);
    let vibe = pulse::vibe::resolve_vibe(&source, &track).await;
    assert_eq!(vibe, VibeAnalysis::fallback());
    assert_eq!(vibe.energy_level, 8);

    let lyrics = pulse::vibe::resolve_lyrics(&source, &track).await;
    assert_eq!(lyrics, pulse::vibe::LYRICS_FALLBACK);
}

#[tokio::test]
async fn room_join_flow_resolves_through_events() {
    let (mut app, _vibe_rx, mut room_rx) = new_app(Arc::new(FailingSource));

    // Short codes are ignored outright.
    assert!(!app.join_room(RoomKind::Couple, "AB"));
    assert_eq!(app.room.phase(), RoomPhase::Idle);

    assert!(app.join_room(RoomKind::Couple, "NEON"));
    assert_eq!(app.room.phase(), RoomPhase::Joining);

    let event = tokio::time::timeout(Duration::from_secs(3), room_rx.recv())
        .await
        .ok()
        .flatten()
        .unwrap();
    match event {
        RoomEvent::JoinResolved { kind } => app.room.complete_join(kind),
        other => panic!("unexpected event: {:?}", other),
    }

    assert_eq!(app.room.phase(), RoomPhase::Joined);
    assert_eq!(app.room.members().len(), 2);
    // The server greeting is already in the log.
    assert_eq!(app.room.messages().len(), 1);
    assert_eq!(app.room.messages()[0].user, "SERVER");

    assert!(app.room.send_message("hello"));
    assert_eq!(app.room.messages()[1].user, "You");

    app.leave_room();
    assert_eq!(app.room.phase(), RoomPhase::Idle);
    assert!(app.room.messages().is_empty());
}

#[tokio::test]
async fn transport_sync_banner_expires_by_generation() {
    let (mut app, _vibe_rx, mut room_rx) = new_app(Arc::new(FailingSource));
    assert!(app.join_room(RoomKind::Group, "WAVE"));
    let joined = tokio::time::timeout(Duration::from_secs(3), room_rx.recv())
        .await
        .ok()
        .flatten()
        .unwrap();
    if let RoomEvent::JoinResolved { kind } = joined {
        app.room.complete_join(kind);
    }

    app.toggle_play();
    assert!(app.room.sync_status().is_some());

    // Two quick actions in a row: only the newest banner's expiry counts.
    app.toggle_play();
    let first = tokio::time::timeout(Duration::from_secs(2), room_rx.recv())
        .await
        .ok()
        .flatten()
        .unwrap();
    if let RoomEvent::SyncExpired { generation } = first {
        app.room.expire_sync(generation);
    }
    // The first banner's expiry is stale; the second one still shows.
    assert!(app.room.sync_status().is_some());

    let second = tokio::time::timeout(Duration::from_secs(2), room_rx.recv())
        .await
        .ok()
        .flatten()
        .unwrap();
    if let RoomEvent::SyncExpired { generation } = second {
        app.room.expire_sync(generation);
    }
    assert!(app.room.sync_status().is_none());
}

#[test]
fn repeat_and_shuffle_session() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut player = pulse::Player::new(seed_playlist());
    player.toggle_play();
    assert!(player.is_playing());

    // Repeat-all wraps from the last track back to the first.
    player.cycle_repeat();
    assert_eq!(player.repeat(), RepeatMode::All);
    player.next(&mut rng);
    player.next(&mut rng);
    player.next(&mut rng);
    assert_eq!(player.current_track().unwrap().id, "1");

    // Shuffle never re-picks the current track.
    player.toggle_shuffle();
    for _ in 0..50 {
        let before = player.current_track().unwrap().id.clone();
        player.next(&mut rng);
        assert_ne!(player.current_track().unwrap().id, before);
    }
}

#[test]
fn paused_samples_settle_at_the_floor_and_playing_stays_bounded() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut buffer = SampleBuffer::new(&mut rng);

    for _ in 0..500 {
        buffer.tick(true, &mut rng);
        for &v in buffer.samples() {
            assert!((FLOOR..=CEILING).contains(&v));
        }
    }

    for _ in 0..500 {
        buffer.tick(false, &mut rng);
    }
    assert!(buffer.max_distance_from_floor() < 0.1);

    // Resuming perturbs the flatline again.
    buffer.tick(true, &mut rng);
    assert!(buffer.max_distance_from_floor() > 0.0);
}
