// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for session state and the identity provider API.

pub mod tokens;
pub mod user;

pub use tokens::TokenPair;
pub use user::{LoginCredentials, Permission, RegisterData, Role, User, UserUpdate};
