//! Token pair issued by the identity provider.

use serde::{Deserialize, Serialize};

/// Access + refresh token bundle with declared type and lifetime.
///
/// Both tokens are opaque strings to this crate; the only client-side
/// inspection ever performed is reading the access token's `exp` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token
    pub access_token: String,
    /// Long-lived token exchanged for new access tokens
    pub refresh_token: String,
    /// Token type as declared by the provider (normally "bearer")
    pub token_type: String,
    /// Declared access-token lifetime in seconds
    pub expires_in: i64,
}
