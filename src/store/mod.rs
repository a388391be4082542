// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential persistence layer.
//!
//! Session data is split across two tiers by sensitivity: the token pair
//! lives in the durable tier as cookie records carrying security attributes,
//! and the (non-sensitive) user profile lives in a session-scoped tier.

pub mod backend;
pub mod credential;

pub use backend::{MemoryTier, StorageTier};
pub use credential::{CookiePolicy, CredentialStore};

/// Fixed persistence keys.
pub mod keys {
    /// Access token cookie record
    pub const ACCESS_TOKEN: &str = "sk_access_token";
    /// Refresh token cookie record
    pub const REFRESH_TOKEN: &str = "sk_refresh_token";
    /// Declared token type ("bearer")
    pub const TOKEN_TYPE: &str = "sk_token_type";
    /// Declared access-token lifetime in seconds
    pub const TOKEN_EXPIRY: &str = "sk_token_expiry";
    /// Serialized user profile (session tier)
    pub const USER_PROFILE: &str = "sk_user";
}
