// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token lifecycle: expiry evaluation and the refresh exchange.
//!
//! The access token is a JWT whose only client-side use is reading the
//! declared `exp` claim; signatures are the provider's concern. Anything
//! unreadable is treated as expired.

use crate::error::{AuthError, Result};
use crate::models::TokenPair;
use crate::services::provider::ProviderClient;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// The only claim this client ever reads.
#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Whether an access token's declared expiry has passed.
///
/// Fail-closed: a malformed or claim-less token counts as expired. A token
/// is expired once `now + clock_skew >= exp`; skew defaults to zero.
pub fn is_token_expired(access_token: &str, clock_skew_secs: i64) -> bool {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::RS256, Algorithm::ES256];
    // Expiry is inspected, not enforced, by the decoder; the skew policy
    // below is the single source of truth.
    validation.validate_exp = false;
    validation.insecure_disable_signature_validation();

    let decoded = match jsonwebtoken::decode::<ExpiryClaim>(
        access_token,
        &DecodingKey::from_secret(&[]),
        &validation,
    ) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!(error = %e, "Access token unreadable, treating as expired");
            return true;
        }
    };

    chrono::Utc::now().timestamp() + clock_skew_secs >= decoded.claims.exp
}

/// Expiry evaluation and refresh exchange against the identity provider.
#[derive(Clone)]
pub struct TokenLifecycle {
    provider: ProviderClient,
    clock_skew_secs: i64,
}

impl TokenLifecycle {
    pub fn new(provider: ProviderClient, clock_skew_secs: i64) -> Self {
        Self {
            provider,
            clock_skew_secs,
        }
    }

    /// Whether the held access token is past its declared expiry.
    pub fn is_expired(&self, access_token: &str) -> bool {
        is_token_expired(access_token, self.clock_skew_secs)
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// The provider may not rotate the refresh token; the held one is carried
    /// into the returned pair in that case. Any failure fails the whole
    /// exchange; there is no partial result. A pair without a refresh token
    /// is an expired session and never reaches the network.
    pub async fn refresh(&self, tokens: &TokenPair) -> Result<TokenPair> {
        if tokens.refresh_token.is_empty() {
            return Err(AuthError::ExpiredSession);
        }

        let response = self.provider.refresh(&tokens.refresh_token).await?;

        Ok(TokenPair {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .unwrap_or_else(|| tokens.refresh_token.clone()),
            token_type: response.token_type,
            expires_in: response.expires_in,
        })
    }
}
