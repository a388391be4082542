// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session controller: the authentication state machine.
//!
//! Owns the in-memory session (user, tokens, permissions, loading flag),
//! mediates every credential-store read/write, and exposes the public
//! session API. Every transition publishes a new immutable [`SessionState`]
//! snapshot on a watch channel; consumers subscribe and derive everything
//! from the latest snapshot.
//!
//! No error crosses the public surface: network and provider failures are
//! converted to boolean outcomes or a cleared session at this boundary.

use crate::config::Config;
use crate::error::Result;
use crate::models::{LoginCredentials, RegisterData, TokenPair, User, UserUpdate};
use crate::services::provider::ProviderClient;
use crate::services::token::TokenLifecycle;
use crate::store::CredentialStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Immutable snapshot of the session.
///
/// `is_loading` is true from construction until hydration resolves, and
/// during login/register round-trips.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub tokens: Option<TokenPair>,
    /// Flat capability list, replaced wholesale on each load
    pub permissions: Vec<String>,
    pub is_loading: bool,
}

impl SessionState {
    /// True iff both the user and the token pair are present.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.tokens.is_some()
    }
}

/// Exact or wildcard match of a requested permission against a granted list.
///
/// A granted `"resource:*"` authorizes any request under that resource;
/// `"*:*"` authorizes everything. Single-level prefix only, no deeper
/// globbing. An empty granted list never matches.
pub fn permission_matches(granted: &[String], requested: &str) -> bool {
    if granted.iter().any(|p| p == "*:*") {
        return true;
    }
    if granted.iter().any(|p| p == requested) {
        return true;
    }
    if let Some((resource, _)) = requested.split_once(':') {
        let wildcard = format!("{}:*", resource);
        return granted.iter().any(|p| *p == wildcard);
    }
    false
}

struct Inner {
    config: Config,
    provider: ProviderClient,
    lifecycle: TokenLifecycle,
    store: CredentialStore,
    state_tx: watch::Sender<SessionState>,
    /// Session generation. Bumped by every credential change (login, logout,
    /// adopted refresh, collapse-to-anonymous); any operation that suspended
    /// on the network discards its result if the generation moved while it
    /// was in flight.
    generation: AtomicU64,
    /// Serializes state read-modify-write; never held across an await.
    transition: Mutex<()>,
    hydrated: AtomicBool,
}

/// The session controller. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a controller over the given credential store.
    ///
    /// The session starts in the hydrating state; call [`hydrate`] once at
    /// startup to resolve it.
    ///
    /// [`hydrate`]: SessionManager::hydrate
    pub fn new(config: Config, store: CredentialStore) -> Result<Self> {
        let provider = ProviderClient::new(&config)?;
        let lifecycle = TokenLifecycle::new(provider.clone(), config.clock_skew_secs);
        let (state_tx, _) = watch::channel(SessionState {
            is_loading: true,
            ..SessionState::default()
        });

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                provider,
                lifecycle,
                store,
                state_tx,
                generation: AtomicU64::new(0),
                transition: Mutex::new(()),
                hydrated: AtomicBool::new(false),
            }),
        })
    }

    // ─── Observation ─────────────────────────────────────────────

    /// Clone the current snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading
    }

    /// Exact or single-level-wildcard match against the loaded permissions.
    /// False whenever no permissions are loaded, authenticated or not.
    pub fn has_permission(&self, name: &str) -> bool {
        permission_matches(&self.snapshot().permissions, name)
    }

    /// Exact name match against the authenticated user's roles.
    pub fn has_role(&self, name: &str) -> bool {
        self.snapshot()
            .user
            .as_ref()
            .is_some_and(|user| user.has_role(name))
    }

    /// Sign-in entry point for guard redirects.
    pub fn login_path(&self) -> &str {
        &self.inner.config.login_path
    }

    /// Authenticated landing point for guard redirects.
    pub fn home_path(&self) -> &str {
        &self.inner.config.home_path
    }

    // ─── Startup hydration ───────────────────────────────────────

    /// Reconstruct session state from persisted data. Runs the protocol at
    /// most once; the loading flag clears only after it fully resolves.
    pub async fn hydrate(&self) {
        if self.inner.hydrated.swap(true, Ordering::SeqCst) {
            return;
        }

        self.run_hydration().await;
        self.inner.state_tx.send_modify(|state| state.is_loading = false);
    }

    async fn run_hydration(&self) {
        let store = &self.inner.store;

        // Non-browser context or nothing persisted: anonymous.
        if !store.available() || !store.has_any() {
            return;
        }

        let tokens = store.get_tokens();
        let user = store.get_user();

        match (tokens, user) {
            (Some(tokens), Some(user)) => self.hydrate_from_stored(tokens, user).await,
            (Some(tokens), None) => self.hydrate_with_profile_fetch(tokens).await,
            // A profile without tokens is never adopted.
            _ => {}
        }
    }

    /// Both tokens and profile recovered from storage.
    async fn hydrate_from_stored(&self, tokens: TokenPair, user: User) {
        if !self.inner.lifecycle.is_expired(&tokens.access_token) {
            tracing::info!("Restored session from storage");
            let generation = self.generation();
            self.adopt_session(generation, tokens, user, false);
            self.load_permissions().await;
            return;
        }

        // Expired: a refreshable pair is exchanged silently; anything else
        // (no refresh token, rejection, transport failure) clears the
        // session.
        match self.inner.lifecycle.refresh(&tokens).await {
            Ok(new_tokens) => {
                tracing::info!("Stored access token expired, refresh succeeded");
                let generation = self.generation();
                self.adopt_session(generation, new_tokens, user, false);
                self.load_permissions().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh during hydration failed, clearing session");
                self.collapse_to_anonymous(self.generation());
            }
        }
    }

    /// Tokens recovered but the profile record is gone: re-fetch it. A
    /// provider failure here leaves the visitor anonymous WITHOUT clearing
    /// credentials; a transient fetch failure is not invalid credentials.
    async fn hydrate_with_profile_fetch(&self, tokens: TokenPair) {
        let generation = self.generation();

        match self.inner.provider.current_user(&tokens.access_token).await {
            Ok(user) => {
                tracing::info!("Recovered profile from provider during hydration");
                self.adopt_session(generation, tokens, user, false);
                self.load_permissions().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile re-fetch failed, staying anonymous");
            }
        }
    }

    // ─── Operations ──────────────────────────────────────────────

    /// Submit credentials. On success the returned pair and profile are
    /// persisted, permissions are loaded, and the session becomes
    /// authenticated. Any failure returns false and leaves a pre-existing
    /// session untouched. The loading flag always clears.
    pub async fn login(&self, credentials: &LoginCredentials) -> bool {
        self.inner.state_tx.send_modify(|state| state.is_loading = true);
        let outcome = self.login_inner(credentials).await;
        self.inner.state_tx.send_modify(|state| state.is_loading = false);
        outcome
    }

    async fn login_inner(&self, credentials: &LoginCredentials) -> bool {
        let generation = self.generation();

        let response = match self.inner.provider.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                return false;
            }
        };

        if response.requires_2fa {
            // No usable tokens are issued for a 2FA-gated account.
            tracing::info!("Login requires two-factor verification, not authenticated");
            return false;
        }

        let pair = response.token_pair();
        let user = response.user.clone();

        if !self.adopt_session(generation, pair, user, credentials.remember_me) {
            return false;
        }

        tracing::info!(email = %credentials.email, "Login successful");
        self.load_permissions().await;
        true
    }

    /// Register a new account; on success immediately log in with the same
    /// credentials. Local payload validation failures never reach the
    /// network.
    pub async fn register(&self, data: &RegisterData) -> bool {
        if !data.validate_payload() {
            tracing::debug!("Registration payload failed client-side validation");
            return false;
        }

        self.inner.state_tx.send_modify(|state| state.is_loading = true);

        let registered = match self.inner.provider.register(data).await {
            Ok(user) => {
                tracing::info!(email = %user.email, "Registration successful");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                false
            }
        };

        let outcome = if registered {
            self.login(&LoginCredentials::new(
                data.email.clone(),
                data.password.clone(),
            ))
            .await
        } else {
            false
        };

        self.inner.state_tx.send_modify(|state| state.is_loading = false);
        outcome
    }

    /// Log out: notify the provider without waiting on it, then clear all
    /// in-memory and persisted state. Idempotent; never blocks on the
    /// network. Observers see the session collapse to anonymous, which is
    /// the navigation signal to the sign-in entry point.
    pub fn logout(&self) {
        if let Some(tokens) = self.snapshot().tokens {
            let provider = self.inner.provider.clone();
            tokio::spawn(async move {
                if let Err(e) = provider.logout(&tokens.access_token).await {
                    // Logout is local-first; the provider call is advisory.
                    tracing::debug!(error = %e, "Provider logout notification failed");
                }
            });
        }

        self.collapse_to_anonymous(self.generation());
        tracing::info!("Logged out");
    }

    /// Exchange the held refresh token for a new pair. No-op returning false
    /// when no tokens are held (no network call). On success the new pair is
    /// adopted and the profile and permissions are re-fetched; on failure
    /// the session is cleared.
    pub async fn refresh_token(&self) -> bool {
        let Some(tokens) = self.snapshot().tokens else {
            return false;
        };

        let generation = self.generation();

        let new_tokens = match self.inner.lifecycle.refresh(&tokens).await {
            Ok(new_tokens) => new_tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.collapse_to_anonymous(generation);
                return false;
            }
        };

        // Re-check liveness: a logout that completed while the exchange was
        // in flight wins, and the fresh pair is discarded.
        let held_user = self.snapshot().user;
        let Some(user) = held_user else {
            tracing::debug!("Session cleared during refresh, discarding new tokens");
            return false;
        };
        if !self.adopt_session(generation, new_tokens.clone(), user, false) {
            return false;
        }

        // Profile re-fetch keeps the session aligned with any server-side
        // changes; a transient failure keeps the held profile.
        let generation = self.generation();
        match self.inner.provider.current_user(&new_tokens.access_token).await {
            Ok(fresh_user) => {
                let _ = self.apply_if_current(generation, || {
                    self.inner.store.store_user(&fresh_user);
                    self.inner
                        .state_tx
                        .send_modify(|state| state.user = Some(fresh_user.clone()));
                });
            }
            Err(e) => {
                tracing::debug!(error = %e, "Profile re-fetch after refresh failed, keeping held profile");
            }
        }

        self.load_permissions().await;
        true
    }

    /// Local, optimistic merge into the current profile and its persisted
    /// copy. Never contacts the provider; hosts wanting a server-side write
    /// use [`ProviderClient::update_me`] separately.
    ///
    /// [`ProviderClient::update_me`]: crate::services::provider::ProviderClient::update_me
    pub fn update_user(&self, update: &UserUpdate) {
        let _guard = self.inner.transition.lock().unwrap_or_else(|e| e.into_inner());

        let mut user = match self.inner.state_tx.borrow().user.clone() {
            Some(user) => user,
            None => return,
        };

        update.apply_to(&mut user);
        user.updated_at =
            Some(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
        self.inner.store.store_user(&user);
        self.inner
            .state_tx
            .send_modify(|state| state.user = Some(user));
    }

    // ─── Password reset & verification ───────────────────────────

    /// Ask the provider to send a password reset email. Boolean outcome,
    /// no session state change.
    pub async fn request_password_reset(&self, email: &str) -> bool {
        match self.inner.provider.request_password_reset(email).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Password reset request failed");
                false
            }
        }
    }

    /// Complete a password reset with the emailed token.
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> bool {
        match self
            .inner
            .provider
            .confirm_password_reset(token, new_password)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Password reset confirmation failed");
                false
            }
        }
    }

    /// Ask the provider to resend the verification email.
    pub async fn resend_verification(&self, email: &str) -> bool {
        match self.inner.provider.resend_verification(email).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Verification resend failed");
                false
            }
        }
    }

    // ─── Transitions ─────────────────────────────────────────────

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Run `apply` only if the session generation still matches `expected`.
    /// Returns whether it ran. The transition lock makes the check and the
    /// mutation one unit.
    fn apply_if_current(&self, expected: u64, apply: impl FnOnce()) -> bool {
        let _guard = self.inner.transition.lock().unwrap_or_else(|e| e.into_inner());

        if self.inner.generation.load(Ordering::SeqCst) != expected {
            tracing::debug!("Discarding result from a superseded session generation");
            return false;
        }

        apply();
        true
    }

    /// Atomically adopt a token pair + profile as the authenticated session,
    /// persisting both together. Bumps the generation.
    fn adopt_session(
        &self,
        expected_generation: u64,
        tokens: TokenPair,
        user: User,
        remember_me: bool,
    ) -> bool {
        self.apply_if_current(expected_generation, || {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            self.inner.store.store_tokens_with(&tokens, remember_me);
            self.inner.store.store_user(&user);
            self.inner.state_tx.send_modify(|state| {
                state.user = Some(user.clone());
                state.tokens = Some(tokens.clone());
                state.permissions.clear();
            });
        })
    }

    /// Atomically clear every credential, in memory and persisted. Bumps the
    /// generation so any in-flight operation discards its result.
    fn collapse_to_anonymous(&self, expected_generation: u64) -> bool {
        self.apply_if_current(expected_generation, || {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            self.inner.store.clear_all();
            self.inner.state_tx.send_modify(|state| {
                state.user = None;
                state.tokens = None;
                state.permissions.clear();
            });
        })
    }

    /// Reload the permission list for the current tokens, replacing it
    /// wholesale. Reads the then-current token at call time, not a stale
    /// snapshot. A failed load leaves the list empty (checks fail closed).
    async fn load_permissions(&self) {
        let Some(tokens) = self.snapshot().tokens else {
            return;
        };
        let generation = self.generation();

        let permissions = match self.inner.provider.permissions(&tokens.access_token).await {
            Ok(permissions) => permissions,
            Err(e) => {
                tracing::warn!(error = %e, "Permission load failed, leaving list empty");
                return;
            }
        };

        let _ = self.apply_if_current(generation, || {
            self.inner
                .state_tx
                .send_modify(|state| state.permissions = permissions.clone());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_permission_match() {
        let perms = granted(&["content:read", "content:write"]);
        assert!(permission_matches(&perms, "content:read"));
        assert!(!permission_matches(&perms, "content:delete"));
    }

    #[test]
    fn test_resource_wildcard_match() {
        let perms = granted(&["content:*"]);
        assert!(permission_matches(&perms, "content:read"));
        assert!(permission_matches(&perms, "content:delete"));
        assert!(!permission_matches(&perms, "billing:read"));
    }

    #[test]
    fn test_super_wildcard_matches_everything() {
        let perms = granted(&["*:*"]);
        assert!(permission_matches(&perms, "content:read"));
        assert!(permission_matches(&perms, "billing:refund"));
    }

    #[test]
    fn test_empty_permission_list_never_matches() {
        assert!(!permission_matches(&[], "content:read"));
    }

    #[test]
    fn test_wildcard_is_single_level_only() {
        // "content:*" must not authorize other resources, and a bare
        // permission without a resource prefix only matches exactly.
        let perms = granted(&["content:*"]);
        assert!(!permission_matches(&perms, "content"));
        assert!(permission_matches(&granted(&["admin"]), "admin"));
        assert!(!permission_matches(&granted(&["admin:*"]), "admin"));
    }
}
