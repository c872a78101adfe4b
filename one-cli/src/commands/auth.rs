//! `one auth login|logout|status`, plus the token source used by `one pr`.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use one_auth::{
    AuthError, CredentialStore, DeviceFlowAuthenticator, GitHubDeviceFlow, KeyringStore,
    TokenOrigin, TokenSource,
};
use one_core::report::Reporter;
use one_core::{ProfileName, ProviderKind};

use super::current_profile;
use crate::reporter::TerminalReporter;
use crate::signal::Interrupts;

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Authorize via the OAuth device flow and store the token.
    Login(ProviderArgs),
    /// Remove the stored token.
    Logout(ProviderArgs),
    /// Show where the token for this project would come from.
    Status(ProviderArgs),
}

#[derive(Args, Debug)]
pub struct ProviderArgs {
    /// Provider to act on; defaults to the profile's `git.provider`.
    #[arg(long)]
    pub provider: Option<ProviderKind>,
}

pub fn run(command: AuthCommand, interrupts: &Interrupts) -> Result<()> {
    let profile = current_profile()?;
    let store: CredentialStore = CredentialStore::new(KeyringStore::default());

    match command {
        AuthCommand::Login(args) => {
            let provider = args.provider.unwrap_or(profile.git.provider);
            if provider != ProviderKind::GitHub {
                bail!(
                    "device authorization is only available for github; export a {provider} token via `token_env` instead"
                );
            }
            let armed = interrupts.arm();
            DeviceFlowAuthenticator::new(GitHubDeviceFlow::default(), &store)
                .authenticate_blocking(
                    provider.as_str(),
                    profile.name(),
                    &TerminalReporter,
                    armed.token(),
                )
                .context("authorization failed")?;
            TerminalReporter.success(&format!("Authenticated {provider} for {}", profile.name()));
        }
        AuthCommand::Logout(args) => {
            let provider = args.provider.unwrap_or(profile.git.provider);
            let removed = store
                .remove(provider.as_str(), profile.name())
                .context("failed to remove stored credential")?;
            if removed {
                TerminalReporter.success(&format!("Logged out of {provider} for {}", profile.name()));
            } else {
                println!("No stored {provider} credential for {}", profile.name());
            }
        }
        AuthCommand::Status(args) => {
            let provider = args.provider.unwrap_or(profile.git.provider);
            let token_env = (provider == profile.git.provider)
                .then(|| profile.token_env())
                .flatten();
            let origin = store.resolve_with(provider.as_str(), profile.name(), token_env, |var| {
                std::env::var(var).ok()
            });
            match origin {
                Ok((_, TokenOrigin::SecretStore)) => {
                    println!("{} {provider}: stored credential", "●".green())
                }
                Ok((_, TokenOrigin::Environment)) => println!(
                    "{} {provider}: from ${}",
                    "●".green(),
                    token_env.unwrap_or_default()
                ),
                Err(AuthError::NotAuthenticated { hint, .. }) => {
                    println!("{} {provider}: not authenticated ({hint})", "●".red())
                }
                Err(e) => return Err(e).context("failed to read stored credential"),
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Interactive token source
// ---------------------------------------------------------------------------

/// Falls back to the GitHub device flow when no token can be found.
pub(crate) struct InteractiveTokens<'a> {
    pub store: &'a CredentialStore,
    pub device_flow: bool,
    pub interrupts: &'a Interrupts,
}

impl TokenSource for InteractiveTokens<'_> {
    fn token(
        &self,
        provider: &str,
        project: &ProfileName,
        token_env: Option<&str>,
    ) -> Result<String, AuthError> {
        match self.store.token(provider, project, token_env) {
            Err(AuthError::NotAuthenticated { .. })
                if self.device_flow && provider == ProviderKind::GitHub.as_str() =>
            {
                tracing::info!(provider, project = %project, "no token found, starting device flow");
                let armed = self.interrupts.arm();
                DeviceFlowAuthenticator::new(GitHubDeviceFlow::default(), self.store)
                    .authenticate_blocking(provider, project, &TerminalReporter, armed.token())
                    .map(|credential| credential.access_token)
            }
            other => other,
        }
    }
}
