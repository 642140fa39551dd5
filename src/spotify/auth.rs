use std::{collections::BTreeSet, time::Duration};

use reqwest::{Url, header::AUTHORIZATION};
use tokio::sync::oneshot;

use crate::{
    api, config,
    error::{Error, Result},
    info,
    server::{CallbackServer, start_callback_server},
    session::Session,
    types::{Credentials, RedirectParams},
    utils,
};

/// Where the local listener binds and how the redirect target is announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackConfig {
    pub bind_addr: String,
    pub redirect_path: String,
    /// Fixed redirect URI; derived from the bound port when `None`.
    pub redirect_uri: Option<String>,
    pub timeout: Duration,
}

impl CallbackConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: config::server_addr(),
            redirect_path: config::spotify_redirect_path(),
            redirect_uri: config::spotify_redirect_uri(),
            timeout: config::auth_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    AwaitingRedirect { authorize_url: String },
    CodeReceived,
    ExchangingCode,
    Resolved,
}

/// Authorization-code flow against the accounts service.
///
/// The flow is owned by a single task and walks
/// `Idle -> AwaitingRedirect -> CodeReceived -> ExchangingCode -> Resolved`.
/// The callback listener lives only while the flow runs and resolves on the
/// first redirect it sees; later redirects are answered but ignored.
pub struct AuthorizationSession<'a> {
    session: &'a Session,
    config: CallbackConfig,
    scopes: BTreeSet<String>,
    csrf_state: String,
    state: AuthState,
}

impl<'a> AuthorizationSession<'a> {
    pub fn new<I, S>(session: &'a Session, config: CallbackConfig, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            session,
            config,
            scopes: scopes.into_iter().map(Into::into).collect(),
            csrf_state: utils::generate_state(),
            state: AuthState::Idle,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Runs the flow to completion. `on_url` receives the authorize URL the
    /// user has to open.
    pub async fn run<F>(mut self, on_url: F) -> Result<Credentials>
    where
        F: FnOnce(&str),
    {
        // fail before binding anything when the secret store is unusable
        self.session.client_secret().await?;

        let (tx, rx) = oneshot::channel();
        let server = start_callback_server(
            &self.config.bind_addr,
            &self.config.redirect_path,
            api::redirect_slot(tx),
        )
        .await?;

        let result = self.drive(&server, rx, on_url).await;
        server.shutdown().await;
        result
    }

    async fn drive<F>(
        &mut self,
        server: &CallbackServer,
        rx: oneshot::Receiver<RedirectParams>,
        on_url: F,
    ) -> Result<Credentials>
    where
        F: FnOnce(&str),
    {
        let redirect_uri = self.redirect_uri(server);
        let client_id = self.session.client_secret().await?.id.clone();
        let authorize_url = build_authorize_url(
            &self.session.endpoints().authorize_url(),
            &client_id,
            &redirect_uri,
            &self.scopes,
            &self.csrf_state,
        )?;

        self.state = AuthState::AwaitingRedirect {
            authorize_url: authorize_url.clone(),
        };
        on_url(&authorize_url);

        let redirect = match tokio::time::timeout(self.config.timeout, rx).await {
            Ok(Ok(redirect)) => redirect,
            Ok(Err(_)) => {
                return Err(Error::Authorization(
                    "callback listener closed before a redirect arrived".to_string(),
                ));
            }
            Err(_) => {
                return Err(Error::Timeout(format!(
                    "no authorization redirect within {} seconds",
                    self.config.timeout.as_secs()
                )));
            }
        };

        let code = self.accept_redirect(redirect)?;
        self.state = AuthState::CodeReceived;
        info!("Authorization code received, requesting access token");

        self.state = AuthState::ExchangingCode;
        let credentials = self.exchange_code(&code, &redirect_uri).await?;

        self.state = AuthState::Resolved;
        Ok(credentials)
    }

    fn redirect_uri(&self, server: &CallbackServer) -> String {
        match &self.config.redirect_uri {
            Some(uri) => uri.clone(),
            None => format!(
                "http://localhost:{port}{path}",
                port = server.local_addr().port(),
                path = self.config.redirect_path
            ),
        }
    }

    fn accept_redirect(&self, redirect: RedirectParams) -> Result<String> {
        if let Some(error) = redirect.error {
            return Err(Error::Authorization(format!(
                "authorization was refused: {}",
                error
            )));
        }

        if redirect.state.as_deref() != Some(self.csrf_state.as_str()) {
            return Err(Error::Authorization(
                "redirect state does not match the issued request".to_string(),
            ));
        }

        match redirect.code {
            Some(code) if !code.is_empty() => Ok(code),
            _ => Err(Error::Authorization("Failed to get code".to_string())),
        }
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<Credentials> {
        let secret = self.session.client_secret().await?;
        let request = self
            .session
            .client()
            .http()
            .post(self.session.endpoints().token_url())
            .header(AUTHORIZATION, utils::basic_auth_header(secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .build()?;

        self.session.client().get_json::<Credentials>(request).await
    }
}

/// Authorizes the session, or returns the credentials it already holds.
///
/// Runs an [`AuthorizationSession`] with the listener settings from the
/// environment and stores the result in `session`.
///
/// # Arguments
///
/// * `session` - Session receiving the credentials
/// * `scopes` - Requested scopes, may be empty
/// * `on_url` - Receives the authorize URL the user has to open
///
/// # Returns
///
/// The credentials of this run.
///
/// # Errors
///
/// - `Error::Configuration` for an unusable secret store or listener address
/// - `Error::Authorization` if access was denied or the redirect is invalid
/// - `Error::Timeout` if no redirect arrives within the configured timeout
/// - Any client error of the token exchange
///
/// # Example
///
/// ```
/// let credentials = auth::authorize(&session, ["user-read-playback-state"], |url| {
///     info!("Open {}", url);
/// })
/// .await?;
/// ```
pub async fn authorize<I, S, F>(session: &Session, scopes: I, on_url: F) -> Result<Credentials>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnOnce(&str),
{
    authorize_with(session, CallbackConfig::from_env(), scopes, on_url).await
}

pub async fn authorize_with<I, S, F>(
    session: &Session,
    config: CallbackConfig,
    scopes: I,
    on_url: F,
) -> Result<Credentials>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnOnce(&str),
{
    if let Ok(credentials) = session.credentials() {
        return Ok(credentials.clone());
    }

    let credentials = AuthorizationSession::new(session, config, scopes)
        .run(on_url)
        .await?;
    session.store_credentials(credentials).cloned()
}

pub fn build_authorize_url(
    base: &str,
    client_id: &str,
    redirect_uri: &str,
    scopes: &BTreeSet<String>,
    state: &str,
) -> Result<String> {
    let mut params = vec![
        ("client_id", client_id.to_string()),
        ("response_type", "code".to_string()),
        ("redirect_uri", redirect_uri.to_string()),
        ("state", state.to_string()),
    ];
    if !scopes.is_empty() {
        let scope = scopes.iter().cloned().collect::<Vec<_>>().join(" ");
        params.push(("scope", scope));
    }

    let url = Url::parse_with_params(base, &params)
        .map_err(|e| Error::Configuration(format!("Invalid authorize URL {}: {}", base, e)))?;
    Ok(url.to_string())
}
