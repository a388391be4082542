// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage tier abstraction.
//!
//! A tier is a flat string key/value namespace. The crate ships an in-memory
//! tier; hosts embedding the manager in a real browser context supply their
//! own implementations bridging to the document cookie jar and session
//! storage.

use dashmap::DashMap;
use std::sync::Arc;

/// A single persistence namespace.
pub trait StorageTier: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-memory tier. Lifetime = process lifetime, so it behaves like
/// session-scoped storage; it also backs every tier in tests.
#[derive(Default)]
pub struct MemoryTier {
    entries: DashMap<String, String>,
}

impl MemoryTier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl StorageTier for MemoryTier {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
