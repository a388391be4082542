// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Session-Keeper: client-side session and authentication manager.
//!
//! This crate establishes, persists, refreshes, and tears down a user's
//! authenticated session against an identity provider, and exposes
//! permission/role checks plus guard primitives for gating access to
//! protected views. Host applications embed a [`SessionManager`], hydrate it
//! once at startup, and subscribe to its state snapshots.

pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AuthError, Result};
pub use guard::{evaluate_guest, evaluate_protected, GuardOutcome, GuardRequirements};
pub use models::{LoginCredentials, RegisterData, TokenPair, User, UserUpdate};
pub use services::{SessionManager, SessionState};
pub use store::{CookiePolicy, CredentialStore, MemoryTier, StorageTier};
