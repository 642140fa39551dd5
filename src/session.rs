//! Per-run session context.
//!
//! A [`Session`] is created once at startup and handed to every component
//! call. It owns the HTTP client, the endpoints, the lazily loaded client
//! secret and the credentials produced by authorization. Nothing in the
//! crate keeps process-wide state.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use tokio::sync::OnceCell;

use crate::{
    clock::{Clock, TokioClock},
    config,
    error::{Error, Result},
    management::SecretManager,
    spotify::client::{RateLimitedClient, RetryPolicy},
    types::{ClientSecret, Credentials},
};

/// Base URLs of the two remote services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Web API root including the version prefix, e.g. `https://api.spotify.com/v1`
    pub api_url: String,
    /// Accounts service root, e.g. `https://accounts.spotify.com`
    pub accounts_url: String,
}

impl Endpoints {
    pub fn new(api_url: impl Into<String>, accounts_url: impl Into<String>) -> Self {
        Self {
            api_url: trim_slash(api_url.into()),
            accounts_url: trim_slash(accounts_url.into()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::spotify_apiurl(), config::spotify_accounts_url())
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.accounts_url)
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_url)
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

pub struct Session {
    client: RateLimitedClient,
    endpoints: Endpoints,
    secrets: SecretManager,
    secret: OnceCell<ClientSecret>,
    credentials: OnceCell<Credentials>,
}

impl Session {
    pub fn new(client: RateLimitedClient, endpoints: Endpoints, secrets: SecretManager) -> Self {
        Self {
            client,
            endpoints,
            secrets,
            secret: OnceCell::new(),
            credentials: OnceCell::new(),
        }
    }

    /// Session wired to the configured endpoints and the wall clock.
    pub fn from_env() -> Self {
        Self::with_clock(Arc::new(TokioClock), config::retry_policy())
    }

    pub fn with_clock(clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self::new(
            RateLimitedClient::new(clock, policy),
            Endpoints::from_env(),
            SecretManager::new(config::secret_file()),
        )
    }

    pub fn client(&self) -> &RateLimitedClient {
        &self.client
    }

    pub fn clock(&self) -> &dyn Clock {
        self.client.clock()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Client secret, read from the store on first use.
    pub async fn client_secret(&self) -> Result<&ClientSecret> {
        self.secret.get_or_try_init(|| self.secrets.load()).await
    }

    pub fn credentials(&self) -> Result<&Credentials> {
        self.credentials.get().ok_or(Error::Unauthenticated)
    }

    pub fn is_authorized(&self) -> bool {
        self.credentials.initialized()
    }

    /// Stores the credentials of this run. The first value wins.
    pub fn store_credentials(&self, credentials: Credentials) -> Result<&Credentials> {
        let _ = self.credentials.set(credentials);
        self.credentials()
    }

    /// Request against the Web API carrying the bearer token.
    pub fn api_request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let credentials = self.credentials()?;
        Ok(self
            .client
            .http()
            .request(method, self.endpoints.api(path))
            .bearer_auth(&credentials.access_token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }
}
