//! Credential storage.
//!
//! Tokens live in the OS secret store under service [`KEYRING_SERVICE`] and
//! account `<provider>:<project>`, serialized as JSON. When nothing is stored
//! the env var named by the profile's `token_env` is consulted instead.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use one_core::types::ProfileName;

use crate::error::AuthError;

pub const KEYRING_SERVICE: &str = "one-cli";

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

impl Credential {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: default_token_type(),
            expires_at: None,
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Secret-store account for a provider/project pair.
pub fn account_name(provider: &str, project: &ProfileName) -> String {
    format!("{provider}:{project}")
}

// ---------------------------------------------------------------------------
// Secret stores
// ---------------------------------------------------------------------------

pub trait SecretStore: Send + Sync {
    fn get(&self, account: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, account: &str, secret: &str) -> Result<(), AuthError>;
    /// Returns `false` when there was nothing to delete.
    fn delete(&self, account: &str) -> Result<bool, AuthError>;
}

/// OS keychain / Secret Service / Credential Manager.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry, AuthError> {
        keyring::Entry::new(&self.service, account).map_err(|source| store_err(account, source))
    }
}

fn store_err(account: &str, source: keyring::Error) -> AuthError {
    AuthError::Store {
        account: account.to_owned(),
        source,
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, account: &str) -> Result<Option<String>, AuthError> {
        match self.entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(store_err(account, e)),
        }
    }

    fn set(&self, account: &str, secret: &str) -> Result<(), AuthError> {
        self.entry(account)?
            .set_password(secret)
            .map_err(|e| store_err(account, e))
    }

    fn delete(&self, account: &str) -> Result<bool, AuthError> {
        match self.entry(account)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(store_err(account, e)),
        }
    }
}

/// Process-local store for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, account: &str) -> Result<Option<String>, AuthError> {
        Ok(self.lock().get(account).cloned())
    }

    fn set(&self, account: &str, secret: &str) -> Result<(), AuthError> {
        self.lock().insert(account.to_owned(), secret.to_owned());
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<bool, AuthError> {
        Ok(self.lock().remove(account).is_some())
    }
}

// ---------------------------------------------------------------------------
// Token resolution
// ---------------------------------------------------------------------------

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    SecretStore,
    Environment,
}

/// Anything that can hand the orchestrator an API token.
pub trait TokenSource {
    /// Token for `provider` (a hosting provider or ticket system name) within
    /// `project`, falling back to the env var `token_env`.
    fn token(
        &self,
        provider: &str,
        project: &ProfileName,
        token_env: Option<&str>,
    ) -> Result<String, AuthError>;
}

/// Typed access to [`Credential`]s kept in a [`SecretStore`].
#[derive(Debug, Default)]
pub struct CredentialStore<S = KeyringStore> {
    secrets: S,
}

impl<S: SecretStore> CredentialStore<S> {
    pub fn new(secrets: S) -> Self {
        Self { secrets }
    }

    pub fn load(
        &self,
        provider: &str,
        project: &ProfileName,
    ) -> Result<Option<Credential>, AuthError> {
        let account = account_name(provider, project);
        match self.secrets.get(&account)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Overwrites any existing entry.
    pub fn save(
        &self,
        provider: &str,
        project: &ProfileName,
        credential: &Credential,
    ) -> Result<(), AuthError> {
        let account = account_name(provider, project);
        let json = serde_json::to_string(credential)?;
        self.secrets.set(&account, &json)?;
        debug!(account = %account, "stored credential");
        Ok(())
    }

    pub fn remove(&self, provider: &str, project: &ProfileName) -> Result<bool, AuthError> {
        self.secrets.delete(&account_name(provider, project))
    }

    /// Resolve a token with an explicit env lookup.
    pub fn resolve_with(
        &self,
        provider: &str,
        project: &ProfileName,
        token_env: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(String, TokenOrigin), AuthError> {
        let now = chrono::Utc::now().timestamp();
        match self.load(provider, project)? {
            Some(credential) if !credential.is_expired_at(now) => {
                return Ok((credential.access_token, TokenOrigin::SecretStore));
            }
            Some(_) => debug!(provider, project = %project, "stored credential has expired"),
            None => {}
        }

        if let Some(var) = token_env {
            if let Some(token) = env(var).filter(|t| !t.trim().is_empty()) {
                return Ok((token, TokenOrigin::Environment));
            }
        }

        let hint = match token_env {
            Some(var) => format!("run `one auth login` or set {var}"),
            None => "run `one auth login` or set `token_env` in the profile".to_owned(),
        };
        Err(AuthError::NotAuthenticated {
            provider: provider.to_owned(),
            project: project.to_string(),
            hint,
        })
    }
}

impl<S: SecretStore> TokenSource for CredentialStore<S> {
    fn token(
        &self,
        provider: &str,
        project: &ProfileName,
        token_env: Option<&str>,
    ) -> Result<String, AuthError> {
        self.resolve_with(provider, project, token_env, |var| std::env::var(var).ok())
            .map(|(token, _)| token)
    }
}
