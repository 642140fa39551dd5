#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use beat_aggregator::{
    clock::Clock,
    management::SecretManager,
    session::{Endpoints, Session},
    spotify::client::{RateLimitedClient, RetryPolicy},
    types::Credentials,
};

/// Clock that records every requested sleep and returns at once.
#[derive(Debug, Default)]
pub struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Serves `app` on an ephemeral port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn policy() -> RetryPolicy {
    RetryPolicy {
        max_rate_limit_retries: Some(10),
        max_server_error_retries: 2,
        server_error_backoff: Duration::from_secs(10),
    }
}

pub fn session_with(
    base: &str,
    clock: Arc<RecordingClock>,
    policy: RetryPolicy,
    secret_file: &str,
) -> Session {
    Session::new(
        RateLimitedClient::new(clock, policy),
        Endpoints::new(format!("{base}/v1"), base),
        SecretManager::new(secret_file),
    )
}

/// Session against `base` that is already authorized.
pub fn authorized_session(base: &str, clock: Arc<RecordingClock>) -> Session {
    let session = session_with(base, clock, policy(), "/nonexistent/spotify.json");
    session.store_credentials(credentials()).unwrap();
    session
}

pub fn credentials() -> Credentials {
    Credentials {
        access_token: "test-access-token".to_string(),
        token_type: "Bearer".to_string(),
        scope: String::new(),
        expires_in: 3600,
        refresh_token: "test-refresh-token".to_string(),
    }
}
