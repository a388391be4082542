// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the session manager.
//!
//! Everything below the session controller propagates `AuthError` with `?`;
//! the controller itself converts all of these into boolean outcomes or a
//! cleared session, so none of them escape the public operations.

/// Errors produced by the provider client, token lifecycle, and credential
/// store.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Transport-level failure talking to the identity provider. Retryable
    /// by re-invoking the operation; never auto-retried.
    #[error("network error: {0}")]
    Network(String),

    /// Login or registration rejected by the provider.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Access token expired with no usable refresh token.
    #[error("session expired")]
    ExpiredSession,

    /// Provider refused the refresh token. Equivalent to a logout.
    #[error("refresh rejected")]
    RefreshRejected,

    /// Persisted session data was unparsable. Treated as absent, never fatal.
    #[error("malformed stored state: {0}")]
    MalformedState(String),

    /// Provider-reported error detail from the response envelope.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// True for failures that invalidate the held credentials (as opposed to
    /// transient transport problems).
    pub fn clears_session(&self) -> bool {
        matches!(self, AuthError::ExpiredSession | AuthError::RefreshRejected)
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AuthError>;
