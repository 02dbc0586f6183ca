//! GitHub token lifecycle per account: validate, save, inspect, clear.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{BridgeError, Result};
use crate::github_client::GitHubClient;
use crate::models::AuthStatus;
use crate::storage::{login_key, token_key, KeyValueStore, SecretStore};

/// Response to a successful token save.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SavedToken {
    pub login: String,
}

/// Response to a token clear.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Cleared {
    pub ok: bool,
}

/// Stores and validates GitHub tokens for accounts.
#[derive(Clone)]
pub struct TokenService {
    github: GitHubClient,
    secrets: Arc<dyn SecretStore>,
    values: Arc<dyn KeyValueStore>,
}

impl TokenService {
    #[must_use]
    pub fn new(
        github: GitHubClient,
        secrets: Arc<dyn SecretStore>,
        values: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            github,
            secrets,
            values,
        }
    }

    /// Validate a raw token against GitHub and store it for the account.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidInput`] for a blank token, or the
    /// GitHub auth error when the token is rejected. Nothing is stored on
    /// failure.
    #[instrument(skip(self, raw_token))]
    pub async fn validate_and_save_token(
        &self,
        account_id: &str,
        raw_token: &str,
    ) -> Result<SavedToken> {
        let token = raw_token.trim();
        if token.is_empty() {
            return Err(BridgeError::InvalidInput("Token is required".to_string()));
        }

        let me = self.github.validate_token(token).await?;
        self.save_token(account_id, token, &me.login).await?;

        info!(login = %me.login, "GitHub token saved");
        Ok(SavedToken { login: me.login })
    }

    /// Store a token and the login it belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if either store write fails.
    pub async fn save_token(&self, account_id: &str, token: &str, login: &str) -> Result<()> {
        self.secrets
            .set_secret(&token_key(account_id), token)
            .await?;
        self.values.set(&login_key(account_id), login).await
    }

    /// Forget the account's token and cached login.
    ///
    /// # Errors
    ///
    /// Returns an error if either store delete fails.
    #[instrument(skip(self))]
    pub async fn clear_token(&self, account_id: &str) -> Result<Cleared> {
        self.secrets.delete_secret(&token_key(account_id)).await?;
        self.values.delete(&login_key(account_id)).await?;
        info!("GitHub token cleared");
        Ok(Cleared { ok: true })
    }

    /// Report whether a token is stored, with the cached login if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a store read fails.
    pub async fn get_auth_status(&self, account_id: &str) -> Result<AuthStatus> {
        if self.get_github_token(account_id).await?.is_none() {
            return Ok(AuthStatus {
                has_token: false,
                login: None,
            });
        }

        let login = self
            .values
            .get(&login_key(account_id))
            .await?
            .filter(|l| !l.is_empty());
        Ok(AuthStatus {
            has_token: true,
            login,
        })
    }

    /// Stored token for the account, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret store read fails.
    pub async fn get_github_token(&self, account_id: &str) -> Result<Option<String>> {
        let token = self.secrets.get_secret(&token_key(account_id)).await?;
        Ok(token.filter(|t| !t.is_empty()))
    }

    /// Stored token for the account, or [`BridgeError::NotAuthenticated`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotAuthenticated`] when nothing is stored.
    pub async fn require_github_token(&self, account_id: &str) -> Result<String> {
        self.get_github_token(account_id).await?.ok_or_else(|| {
            debug!(account_id = %account_id, "No GitHub token stored");
            BridgeError::NotAuthenticated
        })
    }

    /// GitHub client used with the stored tokens.
    #[must_use]
    pub const fn github(&self) -> &GitHubClient {
        &self.github
    }
}
