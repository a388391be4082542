// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access guard: derive render/redirect decisions from session snapshots.
//!
//! Guards are pure functions of a [`SessionState`]; they never log in,
//! refresh, or write anything. Hosts re-evaluate on every snapshot they
//! receive and act on the outcome.

use crate::services::session::{permission_matches, SessionState};

/// Decision for a guarded view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session still hydrating; render a neutral pending state
    Pending,
    /// Render the protected (or guest) content
    Allow,
    /// Authenticated but missing every required permission and role;
    /// render the fallback/denied view
    Denied,
    /// Not authenticated; navigate to the sign-in entry point
    RedirectToLogin,
    /// Already authenticated on a guest-only view; navigate to the
    /// default authenticated landing point
    RedirectToHome,
}

/// Requirements for a protected view. One-of-many semantics: satisfying any
/// single listed permission or role is sufficient; empty requirements admit
/// any authenticated session.
#[derive(Debug, Clone, Default)]
pub struct GuardRequirements {
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
}

impl GuardRequirements {
    /// Authentication only, no permission or role constraints.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any_permission<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.roles.is_empty()
    }

    fn satisfied_by(&self, state: &SessionState) -> bool {
        if self.is_empty() {
            return true;
        }

        let permission_hit = self
            .permissions
            .iter()
            .any(|required| permission_matches(&state.permissions, required));

        let role_hit = state.user.as_ref().is_some_and(|user| {
            self.roles.iter().any(|required| user.has_role(required))
        });

        permission_hit || role_hit
    }
}

/// Evaluate an authenticated-only view.
pub fn evaluate_protected(state: &SessionState, requirements: &GuardRequirements) -> GuardOutcome {
    if state.is_loading {
        return GuardOutcome::Pending;
    }
    if !state.is_authenticated() {
        return GuardOutcome::RedirectToLogin;
    }
    if !requirements.satisfied_by(state) {
        return GuardOutcome::Denied;
    }
    GuardOutcome::Allow
}

/// Evaluate a guest-only view (sign-in, registration).
pub fn evaluate_guest(state: &SessionState) -> GuardOutcome {
    if state.is_loading {
        return GuardOutcome::Pending;
    }
    if state.is_authenticated() {
        return GuardOutcome::RedirectToHome;
    }
    GuardOutcome::Allow
}
