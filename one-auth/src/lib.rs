//! Authentication for one: stored credentials, env fallbacks and the OAuth
//! device flow.

pub mod credentials;
pub mod device_flow;
pub mod error;

pub use credentials::{
    account_name, Credential, CredentialStore, KeyringStore, MemoryStore, SecretStore,
    TokenOrigin, TokenSource, KEYRING_SERVICE,
};
pub use device_flow::{
    poll_for_token, DeviceAuthorizationSession, DeviceFlowAuthenticator, DeviceFlowEndpoint,
    GitHubDeviceFlow, PollOutcome,
};
pub use error::AuthError;
pub use tokio_util::sync::CancellationToken;
