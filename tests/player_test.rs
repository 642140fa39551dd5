mod common;

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, put},
};
use beat_aggregator::{
    clock::{CancelToken, Canceller},
    countdown::{CountdownConfig, CountdownEvent, await_completion},
    error::Error,
    spotify::player::{
        PollPolicy, is_eligible, playback_plan, playback_queue, select_device, start_playback,
    },
    types::{Device, PlaybackPlan, TrackMetadata, TrackUri},
};
use common::{RecordingClock, authorized_session, serve};
use serde_json::{Value, json};

fn device(id: Option<&str>, kind: &str, restricted: bool) -> Device {
    Device {
        id: id.map(str::to_string),
        name: format!("{kind} device"),
        is_active: false,
        is_restricted: restricted,
        kind: kind.to_string(),
    }
}

fn policy(max_attempts: Option<u32>) -> PollPolicy {
    PollPolicy {
        device_type: "Computer".to_string(),
        interval: Duration::from_secs(15),
        max_attempts,
    }
}

#[derive(Clone, Default)]
struct Player {
    polls: Arc<AtomicUsize>,
    /// Polls answered with an empty list before the computer shows up.
    empty_polls: usize,
    plays: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn devices(State(player): State<Player>) -> Json<Value> {
    let poll = player.polls.fetch_add(1, Ordering::SeqCst);
    if poll < player.empty_polls {
        return Json(json!({"devices": [
            {"id": "phone", "name": "Phone", "is_active": true, "is_restricted": false, "type": "Smartphone"},
            {"id": "locked", "name": "Locked", "is_active": false, "is_restricted": true, "type": "Computer"}
        ]}));
    }
    Json(json!({"devices": [
        {"id": "phone", "name": "Phone", "is_active": true, "is_restricted": false, "type": "Smartphone"},
        {"id": "desk", "name": "Desk", "is_active": false, "is_restricted": false, "type": "Computer"}
    ]}))
}

async fn play(
    State(player): State<Player>,
    Query(params): Query<std::collections::HashMap<String, String>>,
    Json(body): Json<Value>,
) -> StatusCode {
    player
        .plays
        .lock()
        .unwrap()
        .push((params.get("device_id").cloned(), body));
    StatusCode::NO_CONTENT
}

async fn tracks(Query(params): Query<std::collections::HashMap<String, String>>) -> Json<Value> {
    let tracks: Vec<Value> = params
        .get("ids")
        .map(|ids| ids.split(',').map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .map(|id| {
            json!({
                "id": id,
                "uri": format!("spotify:track:{id}"),
                "name": format!("Track {id}"),
                "duration_ms": 2000,
            })
        })
        .collect();
    Json(json!({ "tracks": tracks }))
}

async fn player_server(empty_polls: usize) -> (String, Player) {
    let player = Player {
        empty_polls,
        ..Player::default()
    };
    let app = Router::new()
        .route("/v1/me/player/devices", get(devices))
        .route("/v1/me/player/play", put(play))
        .route("/v1/tracks", get(tracks))
        .with_state(player.clone());
    (serve(app).await, player)
}

#[test]
fn test_device_filter() {
    assert!(is_eligible(&device(Some("a"), "Computer", false), "Computer"));
    assert!(!is_eligible(&device(Some("a"), "Computer", true), "Computer"));
    assert!(!is_eligible(&device(Some("a"), "Smartphone", false), "Computer"));
    assert!(!is_eligible(&device(None, "Computer", false), "Computer"));
}

#[tokio::test]
async fn test_eligible_device_is_returned_without_waiting() {
    let (base, player) = player_server(0).await;
    let clock = Arc::new(RecordingClock::default());
    let session = authorized_session(&base, clock.clone());

    let mut empty = Vec::new();
    let selected = select_device(
        &session,
        &policy(None),
        &CancelToken::never(),
        &mut |attempt| empty.push(attempt),
    )
    .await
    .unwrap();

    assert_eq!(selected.id.as_deref(), Some("desk"));
    assert_eq!(player.polls.load(Ordering::SeqCst), 1);
    assert!(clock.sleeps().is_empty());
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_polls_until_device_appears() {
    let (base, player) = player_server(3).await;
    let clock = Arc::new(RecordingClock::default());
    let session = authorized_session(&base, clock.clone());

    let mut empty = Vec::new();
    let selected = select_device(
        &session,
        &policy(None),
        &CancelToken::never(),
        &mut |attempt| empty.push(attempt),
    )
    .await
    .unwrap();

    assert_eq!(selected.id.as_deref(), Some("desk"));
    assert_eq!(player.polls.load(Ordering::SeqCst), 4);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(15); 3]);
    assert_eq!(empty, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_keeps_polling_without_eligible_device() {
    let (base, player) = player_server(usize::MAX).await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));

    let result = tokio::time::timeout(
        Duration::from_millis(300),
        select_device(&session, &policy(None), &CancelToken::never(), &mut |_| {}),
    )
    .await;

    assert!(result.is_err());
    assert!(player.polls.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn test_polling_stops_on_cancel() {
    let (base, player) = player_server(usize::MAX).await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));

    let canceller = Canceller::new();
    let token = canceller.token();
    let result = select_device(&session, &policy(None), &token, &mut |attempt| {
        if attempt == 2 {
            canceller.cancel();
        }
    })
    .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(player.polls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_polling_gives_up_after_max_attempts() {
    let (base, player) = player_server(usize::MAX).await;
    let clock = Arc::new(RecordingClock::default());
    let session = authorized_session(&base, clock.clone());

    let result = select_device(&session, &policy(Some(3)), &CancelToken::never(), &mut |_| {}).await;

    assert!(matches!(result, Err(Error::DeviceUnavailable { attempts: 3 })));
    assert_eq!(player.polls.load(Ordering::SeqCst), 3);
    assert_eq!(clock.sleeps().len(), 2);
}

#[tokio::test]
async fn test_start_playback_sends_priming_track_first() {
    let (base, player) = player_server(0).await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));
    let priming = TrackUri::from_id("prime");
    let uris = vec![TrackUri::from_id("a"), TrackUri::from_id("b")];

    start_playback(
        &session,
        &uris,
        &device(Some("desk"), "Computer", false),
        Some(&priming),
    )
    .await
    .unwrap();

    let plays = player.plays.lock().unwrap().clone();
    assert_eq!(plays.len(), 1);
    assert_eq!(plays[0].0.as_deref(), Some("desk"));
    assert_eq!(
        plays[0].1,
        json!({"uris": ["spotify:track:prime", "spotify:track:a", "spotify:track:b"]})
    );
}

#[tokio::test]
async fn test_device_without_id_cannot_play() {
    let (base, player) = player_server(0).await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));

    let result = start_playback(
        &session,
        &[TrackUri::from_id("a")],
        &device(None, "Computer", false),
        None,
    )
    .await;

    assert!(result.is_err());
    assert!(player.plays.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_plan_covers_the_whole_queue() {
    let (base, _) = player_server(0).await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));
    let priming = TrackUri::from_id("prime");

    let plan = playback_plan(&session, &[TrackUri::from_id("a")], Some(&priming))
        .await
        .unwrap();

    assert_eq!(
        plan.tracks().iter().map(|t| t.uri.clone()).collect::<Vec<_>>(),
        playback_queue(&[TrackUri::from_id("a")], Some(&priming))
    );
    assert_eq!(plan.total_ms(), 4000);
}

fn plan(durations: &[u64]) -> PlaybackPlan {
    PlaybackPlan::new(
        durations
            .iter()
            .enumerate()
            .map(|(i, duration_ms)| TrackMetadata {
                id: format!("t{i}"),
                uri: TrackUri::from_id(&format!("t{i}")),
                name: format!("Track {i}"),
                duration_ms: *duration_ms,
            })
            .collect(),
    )
}

#[tokio::test]
async fn test_countdown_follows_the_plan() {
    let clock = RecordingClock::default();
    let plan = plan(&[1500, 2500, 1200]);
    let config = CountdownConfig {
        tick: Duration::from_secs(1),
        margin: Duration::from_secs(2),
    };

    let mut now_playing = Vec::new();
    let mut ticks = Vec::new();
    let summary = await_completion(&clock, &plan, config, &CancelToken::never(), |event| {
        match event {
            CountdownEvent::NowPlaying { index, track } => {
                assert_eq!(track.uri, plan.tracks()[index].uri);
                now_playing.push(index);
            }
            CountdownEvent::Tick { tick, total, .. } => {
                assert_eq!(total, Duration::from_millis(7200));
                ticks.push(tick);
            }
        }
    })
    .await
    .unwrap();

    // ceil((1500 + 2500 + 1200 + 2000) / 1000)
    assert_eq!(summary.ticks, 8);
    assert_eq!(summary.track_changes, 2);
    assert_eq!(now_playing, vec![0, 1, 2]);
    assert_eq!(ticks, (1..=8).collect::<Vec<u64>>());
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 8]);
}

#[tokio::test]
async fn test_countdown_stops_when_cancelled() {
    let clock = RecordingClock::default();
    let plan = plan(&[1500]);
    let canceller = Canceller::new();
    canceller.cancel();

    let result = await_completion(
        &clock,
        &plan,
        CountdownConfig::default(),
        &canceller.token(),
        |_| {},
    )
    .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(clock.sleeps().is_empty());
}
