// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session logic layer.

pub mod provider;
pub mod session;
pub mod token;

pub use provider::{LoginResponse, ProviderClient, RefreshResponse};
pub use session::{permission_matches, SessionManager, SessionState};
pub use token::{is_token_expired, TokenLifecycle};
