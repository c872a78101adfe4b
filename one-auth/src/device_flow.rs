//! OAuth 2.0 device authorization grant.
//!
//! Two phases: [`DeviceFlowEndpoint::request_device_code`] yields a
//! [`DeviceAuthorizationSession`] whose user code is shown to the user, then
//! [`poll_for_token`] polls the token endpoint until a token is granted, the
//! session expires, or the caller cancels.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use one_core::report::Reporter;
use one_core::types::ProfileName;

use crate::credentials::{Credential, CredentialStore, SecretStore};
use crate::error::AuthError;

pub const GITHUB_CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";
pub const GITHUB_SCOPE: &str = "repo workflow";
pub const GITHUB_DEVICE_CODE_URL: &str = "https://github.com/login/device/code";
pub const GITHUB_ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
/// The only token-endpoint error that keeps the poll loop going.
const AUTHORIZATION_PENDING: &str = "authorization_pending";
/// RFC 8628 default when the server omits `interval`.
const DEFAULT_INTERVAL_SECS: u64 = 5;

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceAuthorizationSession {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds the device code stays valid.
    pub expires_in: u64,
    /// Seconds between polls.
    #[serde(default)]
    pub interval: u64,
}

impl DeviceAuthorizationSession {
    pub fn validity(&self) -> Duration {
        Duration::from_secs(self.expires_in)
    }

    pub fn poll_interval(&self) -> Duration {
        match self.interval {
            0 => Duration::from_secs(DEFAULT_INTERVAL_SECS),
            secs => Duration::from_secs(secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Granted(Credential),
    Pending,
}

/// Raw token-endpoint body; success and error share one shape.
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_outcome(self, now: i64) -> Result<PollOutcome, AuthError> {
        if let Some(access_token) = self.access_token.filter(|t| !t.is_empty()) {
            return Ok(PollOutcome::Granted(Credential {
                access_token,
                refresh_token: self.refresh_token,
                token_type: self.token_type.unwrap_or_else(|| "bearer".to_owned()),
                expires_at: self.expires_in.map(|secs| now + secs),
            }));
        }
        match self.error.as_deref() {
            Some(AUTHORIZATION_PENDING) => Ok(PollOutcome::Pending),
            Some(error) => Err(AuthError::OAuth {
                error: error.to_owned(),
                description: self.error_description,
            }),
            None => Err(AuthError::OAuth {
                error: "invalid_response".to_owned(),
                description: Some("token response carried neither a token nor an error".into()),
            }),
        }
    }
}

/// Raw device-code body. Servers answer errors with the same status class, so
/// the OAuth `error` field is checked before the session fields.
#[derive(Debug, Default, Deserialize)]
struct DeviceCodeResponse {
    device_code: Option<String>,
    user_code: Option<String>,
    verification_uri: Option<String>,
    expires_in: Option<u64>,
    #[serde(default)]
    interval: u64,
    error: Option<String>,
    error_description: Option<String>,
}

impl DeviceCodeResponse {
    fn into_session(self) -> Result<DeviceAuthorizationSession, AuthError> {
        if let Some(error) = self.error {
            return Err(AuthError::OAuth {
                error,
                description: self.error_description,
            });
        }
        let missing = |field: &str| AuthError::OAuth {
            error: "invalid_response".to_owned(),
            description: Some(format!("device code response is missing `{field}`")),
        };
        Ok(DeviceAuthorizationSession {
            device_code: self.device_code.ok_or_else(|| missing("device_code"))?,
            user_code: self.user_code.ok_or_else(|| missing("user_code"))?,
            verification_uri: self.verification_uri.ok_or_else(|| missing("verification_uri"))?,
            expires_in: self.expires_in.ok_or_else(|| missing("expires_in"))?,
            interval: self.interval,
        })
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DeviceFlowEndpoint: Send + Sync {
    async fn request_device_code(&self) -> Result<DeviceAuthorizationSession, AuthError>;
    async fn poll_token(&self, device_code: &str) -> Result<PollOutcome, AuthError>;
}

/// GitHub's device-flow endpoints over blocking `ureq`, run on the blocking pool.
#[derive(Debug, Clone)]
pub struct GitHubDeviceFlow {
    agent: ureq::Agent,
    client_id: String,
    scope: String,
    device_code_url: String,
    token_url: String,
}

impl Default for GitHubDeviceFlow {
    fn default() -> Self {
        Self::new(GITHUB_CLIENT_ID)
    }
}

impl GitHubDeviceFlow {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .user_agent(concat!("one-cli/", env!("CARGO_PKG_VERSION")))
                .build(),
            client_id: client_id.into(),
            scope: GITHUB_SCOPE.to_owned(),
            device_code_url: GITHUB_DEVICE_CODE_URL.to_owned(),
            token_url: GITHUB_ACCESS_TOKEN_URL.to_owned(),
        }
    }

    /// Point both endpoints at another host (GitHub Enterprise).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.device_code_url = format!("{base}/login/device/code");
        self.token_url = format!("{base}/login/oauth/access_token");
        self
    }

    async fn post_form<T>(&self, url: String, form: Vec<(&'static str, String)>) -> Result<T, AuthError>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            let pairs: Vec<(&str, &str)> = form.iter().map(|(k, v)| (*k, v.as_str())).collect();
            let response = match agent
                .post(&url)
                .set("Accept", "application/json")
                .send_form(&pairs)
            {
                Ok(response) => response,
                // OAuth errors come back as 4xx with a JSON body on some servers.
                Err(ureq::Error::Status(_, response)) => response,
                Err(e) => {
                    return Err(AuthError::Http {
                        url,
                        source: Box::new(e),
                    })
                }
            };
            response
                .into_json::<T>()
                .map_err(|source| AuthError::Response { url, source })
        })
        .await?
    }
}

#[async_trait]
impl DeviceFlowEndpoint for GitHubDeviceFlow {
    async fn request_device_code(&self) -> Result<DeviceAuthorizationSession, AuthError> {
        let form = vec![
            ("client_id", self.client_id.clone()),
            ("scope", self.scope.clone()),
        ];
        let response: DeviceCodeResponse =
            self.post_form(self.device_code_url.clone(), form).await?;
        let session = response.into_session()?;
        debug!(
            expires_in = session.expires_in,
            interval = session.interval,
            "received device code"
        );
        Ok(session)
    }

    async fn poll_token(&self, device_code: &str) -> Result<PollOutcome, AuthError> {
        let form = vec![
            ("client_id", self.client_id.clone()),
            ("device_code", device_code.to_owned()),
            ("grant_type", DEVICE_CODE_GRANT.to_owned()),
        ];
        let response: TokenResponse = self.post_form(self.token_url.clone(), form).await?;
        response.into_outcome(chrono::Utc::now().timestamp())
    }
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Poll until a token is granted.
///
/// The first poll happens one interval after the call. Cancellation beats
/// expiry, and expiry beats a poll that falls due at the same instant. An
/// in-flight poll is abandoned on cancellation or expiry.
pub async fn poll_for_token<E>(
    endpoint: &E,
    session: &DeviceAuthorizationSession,
    cancel: &CancellationToken,
) -> Result<Credential, AuthError>
where
    E: DeviceFlowEndpoint + ?Sized,
{
    let start = Instant::now();
    let expiry = sleep_until(start + session.validity());
    tokio::pin!(expiry);

    let period = session.poll_interval();
    let mut ticker = interval_at(start + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let timed_out = || AuthError::Timeout {
        expires_in: session.expires_in,
    };

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AuthError::Cancelled),
            _ = &mut expiry => return Err(timed_out()),
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AuthError::Cancelled),
            _ = &mut expiry => return Err(timed_out()),
            outcome = endpoint.poll_token(&session.device_code) => outcome?,
        };
        match outcome {
            PollOutcome::Granted(credential) => return Ok(credential),
            PollOutcome::Pending => debug!("authorization pending"),
        }
    }
}

// ---------------------------------------------------------------------------
// Authenticator
// ---------------------------------------------------------------------------

/// Runs both phases and persists the result.
pub struct DeviceFlowAuthenticator<'a, E, S> {
    endpoint: E,
    store: &'a CredentialStore<S>,
}

impl<'a, E, S> DeviceFlowAuthenticator<'a, E, S>
where
    E: DeviceFlowEndpoint,
    S: SecretStore,
{
    pub fn new(endpoint: E, store: &'a CredentialStore<S>) -> Self {
        Self { endpoint, store }
    }

    /// The credential is written (overwriting) only once a token is granted;
    /// timeouts, OAuth errors and cancellation leave the store untouched.
    pub async fn authenticate(
        &self,
        provider: &str,
        project: &ProfileName,
        reporter: &dyn Reporter,
        cancel: &CancellationToken,
    ) -> Result<Credential, AuthError> {
        let session = self.endpoint.request_device_code().await?;
        reporter.authorization_required(provider, &session.verification_uri, &session.user_code);

        let credential = poll_for_token(&self.endpoint, &session, cancel).await?;
        self.store.save(provider, project, &credential)?;
        info!(provider, project = %project, "device authorization complete");
        Ok(credential)
    }

    /// [`Self::authenticate`] on a fresh current-thread runtime.
    ///
    /// Installs no signal handlers; the caller decides what cancels `cancel`.
    pub fn authenticate_blocking(
        &self,
        provider: &str,
        project: &ProfileName,
        reporter: &dyn Reporter,
        cancel: &CancellationToken,
    ) -> Result<Credential, AuthError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AuthError::Runtime)?;
        runtime.block_on(self.authenticate(provider, project, reporter, cancel))
    }
}
