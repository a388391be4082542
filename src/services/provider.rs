// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider API client.
//!
//! Handles:
//! - Credential submission (login, register)
//! - Token refresh exchange
//! - Current-user and permission loading
//! - Password reset and verification resend
//!
//! Every provider response is the uniform envelope
//! `{ success, data?, error? }`; this client branches only on the envelope,
//! never on HTTP status codes.

use crate::config::Config;
use crate::error::{AuthError, Result};
use crate::models::{LoginCredentials, RegisterData, TokenPair, User, UserUpdate};
use serde::Deserialize;
use std::time::Duration;

const API_PREFIX: &str = "/api/v1";

/// Identity provider HTTP client.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
}

/// Uniform response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
    /// Set when the account is 2FA-gated; no usable tokens are issued then.
    #[serde(default)]
    pub requires_2fa: bool,
    #[serde(default)]
    pub temp_token: Option<String>,
}

impl LoginResponse {
    pub fn token_pair(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_type: self.token_type.clone(),
            expires_in: self.expires_in,
        }
    }
}

/// Refresh exchange payload. The provider retains the refresh token unless
/// it chose to rotate it.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
}

impl ProviderClient {
    /// Create a new provider client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    // ─── Authentication ──────────────────────────────────────────

    /// Submit credentials. Provider rejection maps to `InvalidCredentials`.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        match self.unwrap_envelope(response).await {
            Err(AuthError::Provider(detail)) => {
                tracing::debug!(detail = %detail, "Login rejected by provider");
                Err(AuthError::InvalidCredentials)
            }
            other => other,
        }
    }

    /// Register a new account. Returns the created-user acknowledgment.
    pub async fn register(&self, data: &RegisterData) -> Result<User> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(data)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        match self.unwrap_envelope(response).await {
            Err(AuthError::Provider(detail)) => {
                tracing::debug!(detail = %detail, "Registration rejected by provider");
                Err(AuthError::InvalidCredentials)
            }
            other => other,
        }
    }

    /// Exchange a refresh token for a new access token. Provider rejection
    /// maps to `RefreshRejected`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        match self.unwrap_envelope(response).await {
            Err(AuthError::Provider(detail)) => {
                tracing::debug!(detail = %detail, "Refresh rejected by provider");
                Err(AuthError::RefreshRejected)
            }
            other => other,
        }
    }

    /// Notify the provider of a logout. Callers treat failure as ignorable.
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/logout"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        self.unwrap_ack(response).await
    }

    // ─── Current user ────────────────────────────────────────────

    /// Fetch the authenticated user's profile.
    pub async fn current_user(&self, access_token: &str) -> Result<User> {
        let response = self
            .http
            .get(self.url("/users/me"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        self.unwrap_envelope(response).await
    }

    /// Fetch the authenticated user's flat permission list.
    pub async fn permissions(&self, access_token: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.url("/users/me/permissions"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        self.unwrap_envelope(response).await
    }

    /// Push a profile update to the provider.
    ///
    /// The session controller's `update_user` is local-only; this call exists
    /// for hosts that want the corresponding server-side write.
    pub async fn update_me(&self, access_token: &str, update: &UserUpdate) -> Result<User> {
        let response = self
            .http
            .put(self.url("/users/me"))
            .bearer_auth(access_token)
            .json(update)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        self.unwrap_envelope(response).await
    }

    // ─── Password reset & verification ───────────────────────────

    /// Ask the provider to send a password reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/forgot-password"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        self.unwrap_ack(response).await
    }

    /// Complete a password reset with the emailed token.
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        // The provider requires a confirmation field; the caller has already
        // collected a single new password at this point.
        let response = self
            .http
            .post(self.url("/auth/reset-password"))
            .json(&serde_json::json!({
                "token": token,
                "new_password": new_password,
                "confirm_password": new_password,
            }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        self.unwrap_ack(response).await
    }

    /// Ask the provider to resend the verification email.
    pub async fn resend_verification(&self, email: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/auth/resend-verification"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        self.unwrap_ack(response).await
    }

    // ─── Envelope handling ───────────────────────────────────────

    /// Parse the envelope and extract its data payload.
    async fn unwrap_envelope<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| AuthError::Network(format!("envelope parse error: {}", e)))?;

        if !envelope.success {
            return Err(AuthError::Provider(
                envelope.error.unwrap_or_else(|| "unspecified".to_string()),
            ));
        }

        envelope
            .data
            .ok_or_else(|| AuthError::Network("envelope missing data".to_string()))
    }

    /// Parse the envelope for acknowledgment-only operations.
    async fn unwrap_ack(&self, response: reqwest::Response) -> Result<()> {
        let envelope: ApiEnvelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| AuthError::Network(format!("envelope parse error: {}", e)))?;

        if !envelope.success {
            return Err(AuthError::Provider(
                envelope.error.unwrap_or_else(|| "unspecified".to_string()),
            ));
        }

        Ok(())
    }
}
