mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use beat_aggregator::{error::Error, spotify::analysis::aggregate, types::TrackUri};
use common::{RecordingClock, authorized_session, serve};
use serde_json::json;

#[derive(Clone, Default)]
struct Requests(Arc<Mutex<Vec<String>>>);

async fn analysis(State(requests): State<Requests>, Path(id): Path<String>) -> Response {
    requests.0.lock().unwrap().push(id.clone());
    if id == "broken" {
        return (StatusCode::NOT_FOUND, "analysis not found").into_response();
    }
    Json(json!({"track": {"id": id}, "beats": [{"start": 0.25, "duration": 0.5}]})).into_response()
}

async fn analysis_server() -> (String, Requests) {
    let requests = Requests::default();
    let app = Router::new()
        .route("/v1/audio-analysis/{id}", get(analysis))
        .with_state(requests.clone());
    (serve(app).await, requests)
}

fn ids(values: &[&str]) -> Vec<TrackUri> {
    values.iter().map(|v| TrackUri::from_id(v)).collect()
}

#[tokio::test]
async fn test_one_report_per_id_in_order() {
    let (base, requests) = analysis_server().await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));

    let mut progress = Vec::new();
    let reports = aggregate(&session, &ids(&["a", "b", "c"]), None, |index, report| {
        progress.push((index, report.uri.clone()));
    })
    .await
    .unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(*requests.0.lock().unwrap(), vec!["a", "b", "c"]);
    for (report, id) in reports.iter().zip(["a", "b", "c"]) {
        assert_eq!(report.uri, TrackUri::from_id(id));
        assert_eq!(report.analysis["track"]["id"], id);
        assert!(report.name.is_none());
    }
    assert_eq!(
        progress.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[tokio::test]
async fn test_names_are_attached_when_known() {
    let (base, _) = analysis_server().await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));

    let names = HashMap::from([(TrackUri::from_id("a"), "Song A".to_string())]);
    let reports = aggregate(&session, &ids(&["a", "b"]), Some(&names), |_, _| {})
        .await
        .unwrap();

    assert_eq!(reports[0].name.as_deref(), Some("Song A"));
    assert!(reports[1].name.is_none());
}

#[tokio::test]
async fn test_empty_input_makes_no_requests() {
    let (base, requests) = analysis_server().await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));

    let reports = aggregate(&session, &[], None, |_, _| {}).await.unwrap();

    assert!(reports.is_empty());
    assert!(requests.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_first_failure_aborts() {
    let (base, requests) = analysis_server().await;
    let session = authorized_session(&base, Arc::new(RecordingClock::default()));

    let mut seen = 0;
    let err = aggregate(&session, &ids(&["a", "broken", "c"]), None, |_, _| seen += 1)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FatalApi { status, .. } if status == StatusCode::NOT_FOUND));
    assert_eq!(seen, 1);
    assert_eq!(*requests.0.lock().unwrap(), vec!["a", "broken"]);
}
