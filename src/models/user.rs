// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User, role, and permission models plus the request payloads the session
//! controller sends to the identity provider.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Authenticated user profile as returned by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned user ID (UUID string)
    pub id: String,
    /// Email address
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Whether the account is active
    pub is_active: bool,
    /// Whether the email address has been verified
    pub is_verified: bool,
    /// Roles assigned to this user, with their permissions attached
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Account creation timestamp (RFC 3339)
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last profile update timestamp (RFC 3339)
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Last login timestamp (RFC 3339)
    #[serde(default)]
    pub last_login: Option<String>,
}

impl User {
    /// Exact name match against this user's role collection.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }
}

/// Role snapshot fetched from the identity provider. The client never
/// computes role hierarchy; roles arrive with their permissions flattened
/// by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// A single capability in `resource:action` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub name: String,
    pub resource: String,
    pub action: String,
}

/// Credentials submitted to the login endpoint.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginCredentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Extends the refresh-token record's lifetime to the configured
    /// remember-me horizon.
    pub remember_me: bool,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember_me: false,
        }
    }
}

/// Registration payload. Shape validation happens client-side before any
/// network call; password *strength* scoring is the host UI's concern.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterData {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(must_match(other = "password"))]
    pub confirm_password: String,
    #[validate(length(min = 2, max = 50))]
    pub first_name: String,
    #[validate(length(min = 2, max = 50))]
    pub last_name: String,
    pub agree_to_terms: bool,
}

impl RegisterData {
    /// Full client-side validation: derive rules plus the terms checkbox,
    /// which `validator` cannot express on a bool field.
    pub fn validate_payload(&self) -> bool {
        self.agree_to_terms && self.validate().is_ok()
    }
}

/// Partial profile update applied locally by `update_user`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserUpdate {
    /// Merge this update into an existing profile.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
    }
}
