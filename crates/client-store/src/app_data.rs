//! Typed accessors over the raw key/value store.

use crate::{KeyValueStore, StoreExt, StoreKeys};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A learning goal shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    /// Goal identifier assigned by the server.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Whether the user has completed the goal.
    pub completed: bool,
}

/// High-level API over the persisted keys the client relies on.
#[derive(Clone)]
pub struct AppData {
    store: Arc<dyn KeyValueStore>,
}

impl AppData {
    /// Create a new AppData wrapper over the given store backend.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // ==========================================
    // Credential
    // ==========================================

    /// Retrieve the bearer token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.store.get(StoreKeys::TOKEN, None)
    }

    /// Store the bearer token.
    pub fn set_token(&self, token: &str) {
        self.store.set(StoreKeys::TOKEN, &token);
    }

    /// Remove the bearer token (sign out).
    pub fn clear_token(&self) {
        self.store.remove(StoreKeys::TOKEN);
    }

    // ==========================================
    // Goals
    // ==========================================

    /// Retrieve the goals list (empty when never set).
    pub fn goals(&self) -> Vec<Goal> {
        self.store.get(StoreKeys::GOALS, Vec::new())
    }

    /// Replace the goals list.
    pub fn set_goals(&self, goals: &[Goal]) {
        self.store.set(StoreKeys::GOALS, &goals);
    }

    /// Read-modify-write the goals list.
    pub fn update_goals(&self, f: impl FnOnce(Vec<Goal>) -> Vec<Goal>) {
        self.store.update(StoreKeys::GOALS, Vec::new(), f);
    }

    // ==========================================
    // Tour and spotlights
    // ==========================================

    /// Whether the onboarding tour has been completed.
    pub fn tour_completed(&self) -> bool {
        self.store.get(StoreKeys::TOUR_COMPLETED, false)
    }

    /// Mark the onboarding tour completed (or reset it).
    pub fn set_tour_completed(&self, completed: bool) {
        self.store.set(StoreKeys::TOUR_COMPLETED, &completed);
    }

    /// Whether a feature spotlight hint has been dismissed.
    pub fn spotlight_dismissed(&self, feature: &str) -> bool {
        self.store.get(&StoreKeys::spotlight(feature), false)
    }

    /// Dismiss a feature spotlight hint.
    pub fn dismiss_spotlight(&self, feature: &str) {
        self.store.set(&StoreKeys::spotlight(feature), &true);
    }
}
