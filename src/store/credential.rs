// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential store: cookie-record persistence for the token pair plus a
//! session-scoped record for the user profile.
//!
//! Unparsable persisted data is treated as absent, never as an error; the
//! worst outcome of a corrupted store is an anonymous session.

use crate::error::AuthError;
use crate::models::{TokenPair, User};
use crate::store::backend::StorageTier;
use crate::store::keys;
use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, SameSite};
use std::sync::Arc;

/// Attributes applied to every durable cookie record.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    /// Emit the `Secure` attribute
    pub secure: bool,
    /// Optional `Domain` attribute
    pub domain: Option<String>,
    /// Refresh-token record lifetime when "remember me" is set, in days
    pub remember_me_days: i64,
}

impl CookiePolicy {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            secure: config.cookie_secure,
            domain: config.cookie_domain.clone(),
            remember_me_days: config.remember_me_days,
        }
    }
}

struct Tiers {
    durable: Arc<dyn StorageTier>,
    session: Arc<dyn StorageTier>,
}

/// Two-tier credential persistence.
///
/// A store constructed with [`CredentialStore::detached`] has no backend at
/// all (non-browser context): reads report absent and writes are no-ops, so
/// hydration resolves straight to an anonymous session.
pub struct CredentialStore {
    tiers: Option<Tiers>,
    policy: CookiePolicy,
}

impl CredentialStore {
    /// Create a store over a durable tier (tokens) and a session tier
    /// (profile).
    pub fn new(
        durable: Arc<dyn StorageTier>,
        session: Arc<dyn StorageTier>,
        policy: CookiePolicy,
    ) -> Self {
        Self {
            tiers: Some(Tiers { durable, session }),
            policy,
        }
    }

    /// Create a store with no persistence backend.
    pub fn detached(policy: CookiePolicy) -> Self {
        Self {
            tiers: None,
            policy,
        }
    }

    /// Whether a persistence backend is available.
    pub fn available(&self) -> bool {
        self.tiers.is_some()
    }

    // ─── Token tier ──────────────────────────────────────────────

    /// Persist a token pair with default (non-remembered) lifetime.
    pub fn store_tokens(&self, pair: &TokenPair) {
        self.store_tokens_with(pair, false);
    }

    /// Persist a token pair as durable cookie records.
    ///
    /// The access-token, token-type, and expiry records live exactly as long
    /// as the declared `expires_in`. The refresh-token record is a session
    /// cookie unless `remember_me` is set, in which case it gets the
    /// configured remember-me horizon so silent refresh keeps working across
    /// browser restarts.
    pub fn store_tokens_with(&self, pair: &TokenPair, remember_me: bool) {
        let Some(tiers) = &self.tiers else { return };

        let token_lifetime = Some(CookieDuration::seconds(pair.expires_in.max(0)));
        let refresh_lifetime = remember_me
            .then(|| CookieDuration::days(self.policy.remember_me_days));

        tiers.durable.set(
            keys::ACCESS_TOKEN,
            self.cookie_record(keys::ACCESS_TOKEN, &pair.access_token, token_lifetime),
        );
        tiers.durable.set(
            keys::REFRESH_TOKEN,
            self.cookie_record(keys::REFRESH_TOKEN, &pair.refresh_token, refresh_lifetime),
        );
        tiers.durable.set(
            keys::TOKEN_TYPE,
            self.cookie_record(keys::TOKEN_TYPE, &pair.token_type, token_lifetime),
        );
        tiers.durable.set(
            keys::TOKEN_EXPIRY,
            self.cookie_record(keys::TOKEN_EXPIRY, &pair.expires_in.to_string(), token_lifetime),
        );
    }

    /// Reconstruct the persisted token pair.
    ///
    /// Returns `None` if any required record is missing or unparsable;
    /// malformed stored state is never fatal.
    pub fn get_tokens(&self) -> Option<TokenPair> {
        match self.try_get_tokens() {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::debug!(error = %e, "Treating persisted tokens as absent");
                None
            }
        }
    }

    fn try_get_tokens(&self) -> crate::error::Result<Option<TokenPair>> {
        let Some(tiers) = &self.tiers else {
            return Ok(None);
        };
        let durable = tiers.durable.as_ref();

        let (Some(access_token), Some(refresh_token), Some(token_type), Some(expiry)) = (
            read_record(durable, keys::ACCESS_TOKEN)?,
            read_record(durable, keys::REFRESH_TOKEN)?,
            read_record(durable, keys::TOKEN_TYPE)?,
            read_record(durable, keys::TOKEN_EXPIRY)?,
        ) else {
            return Ok(None);
        };

        let expires_in = expiry.parse().map_err(|_| {
            AuthError::MalformedState(format!("token expiry is not a number: {:?}", expiry))
        })?;

        Ok(Some(TokenPair {
            access_token,
            refresh_token,
            token_type,
            expires_in,
        }))
    }

    // ─── Profile tier ────────────────────────────────────────────

    /// Persist the user profile on the session tier.
    ///
    /// Callers only invoke this together with a verified token write; the
    /// profile is never refreshed independently.
    pub fn store_user(&self, user: &User) {
        let Some(tiers) = &self.tiers else { return };

        match serde_json::to_string(user) {
            Ok(serialized) => tiers.session.set(keys::USER_PROFILE, serialized),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize user profile"),
        }
    }

    /// Load the persisted user profile, if present and parsable.
    pub fn get_user(&self) -> Option<User> {
        let tiers = self.tiers.as_ref()?;
        let serialized = tiers.session.get(keys::USER_PROFILE)?;

        match serde_json::from_str(&serialized) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "Stored profile unparsable, treating as absent");
                None
            }
        }
    }

    // ─── Whole-store operations ──────────────────────────────────

    /// Remove every persisted auth key. Idempotent.
    pub fn clear_all(&self) {
        let Some(tiers) = &self.tiers else { return };

        for key in [
            keys::ACCESS_TOKEN,
            keys::REFRESH_TOKEN,
            keys::TOKEN_TYPE,
            keys::TOKEN_EXPIRY,
        ] {
            tiers.durable.remove(key);
        }
        tiers.session.remove(keys::USER_PROFILE);
    }

    /// Existence probe: is any token record persisted?
    ///
    /// Used during hydration to decide between a profile re-fetch and
    /// treating the visitor as anonymous.
    pub fn has_any(&self) -> bool {
        let Some(tiers) = &self.tiers else {
            return false;
        };

        [
            keys::ACCESS_TOKEN,
            keys::REFRESH_TOKEN,
            keys::TOKEN_TYPE,
            keys::TOKEN_EXPIRY,
        ]
        .iter()
        .any(|key| tiers.durable.get(key).is_some())
    }

    /// Serialize one cookie record with the policy's security attributes.
    fn cookie_record(&self, key: &str, value: &str, max_age: Option<CookieDuration>) -> String {
        let mut builder = Cookie::build((key.to_string(), value.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.policy.secure);

        if let Some(domain) = &self.policy.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(max_age) = max_age {
            builder = builder.max_age(max_age);
        }

        builder.build().to_string()
    }
}

/// Read one cookie record and extract its value. `Ok(None)` means the key is
/// simply not stored; an unparsable record is malformed state.
fn read_record(
    tier: &dyn StorageTier,
    key: &str,
) -> crate::error::Result<Option<String>> {
    let Some(record) = tier.get(key) else {
        return Ok(None);
    };

    let cookie = Cookie::parse(record)
        .map_err(|e| AuthError::MalformedState(format!("cookie record {}: {}", key, e)))?;
    Ok(Some(cookie.value().to_string()))
}
