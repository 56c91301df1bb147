//! # Refresh Registry
//!
//! Tracks which reactive contexts read which queries, so that invalidating a key
//! re-runs every view that depends on it, and deduplicates concurrent fetches of the
//! same key.
//!
//! ## Key Features
//!
//! - **Refresh Tracking**: Maintains counters for query refresh events
//! - **Reactive Context Management**: Subscribes and notifies reactive contexts when data changes
//! - **Revalidation Control**: Concurrent fetches of one key wait for the first one
//!   instead of running again

use dioxus::dioxus_core::ReactiveContext;
use futures::channel::oneshot;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};
use tracing::debug;

use crate::keys::CacheKey;

type ReactiveContextSet = Arc<Mutex<HashSet<ReactiveContext>>>;
type ReactiveContextRegistry = Arc<Mutex<HashMap<CacheKey, ReactiveContextSet>>>;
type RevalidationWaiters = Arc<Mutex<HashMap<CacheKey, Vec<oneshot::Sender<()>>>>>;

/// Outcome of [`RefreshRegistry::start_revalidation`]
#[derive(Debug)]
pub enum Revalidation {
    /// The caller owns the fetch and must call
    /// [`complete_revalidation`](RefreshRegistry::complete_revalidation) when it ends
    Started,
    /// Another fetch of the key is running. Resolves when it completes; errors out if
    /// the registry is dropped first.
    InProgress(oneshot::Receiver<()>),
}

/// Registry for refresh signals that re-run dependent views
///
/// All internal state is behind mutexes; clones share the same registry.
#[derive(Clone, Default)]
pub struct RefreshRegistry {
    /// How many times each key has been refreshed
    refresh_counters: Arc<Mutex<HashMap<CacheKey, u64>>>,
    /// Reactive contexts subscribed to each key
    reactive_contexts: ReactiveContextRegistry,
    /// Keys with a fetch in flight, and the callers waiting on each
    ongoing_revalidations: RevalidationWaiters,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refreshes seen by `key`, or 0 if never refreshed
    pub fn get_refresh_count(&self, key: &CacheKey) -> u64 {
        if let Ok(counters) = self.refresh_counters.lock() {
            *counters.get(key).unwrap_or(&0)
        } else {
            0
        }
    }

    /// Subscribe a reactive context to refresh events for `key`
    pub fn subscribe_to_refresh(&self, key: &CacheKey, reactive_context: ReactiveContext) {
        if let Ok(mut contexts) = self.reactive_contexts.lock() {
            let key_contexts = contexts
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(HashSet::new())));
            if let Ok(mut context_set) = key_contexts.lock() {
                context_set.insert(reactive_context);
            }
        }
    }

    /// Trigger a refresh of every subscribed key addressed by `query`
    ///
    /// Counters of `query` and of each matching subscribed key are incremented, and the
    /// subscribed reactive contexts are marked dirty so their views re-run.
    pub fn trigger_refresh(&self, query: &CacheKey) -> usize {
        let matching: Vec<(CacheKey, ReactiveContextSet)> = match self.reactive_contexts.lock() {
            Ok(contexts) => contexts
                .iter()
                .filter(|(key, _)| key.matches(query))
                .map(|(key, set)| (key.clone(), set.clone()))
                .collect(),
            Err(_) => Vec::new(),
        };

        if let Ok(mut counters) = self.refresh_counters.lock() {
            *counters.entry(query.clone()).or_insert(0) += 1;
            for (key, _) in matching.iter().filter(|(key, _)| key != query) {
                *counters.entry(key.clone()).or_insert(0) += 1;
            }
        }

        for (key, context_set) in &matching {
            if let Ok(mut context_set) = context_set.lock() {
                // Contexts of unmounted views can no longer be marked dirty
                context_set.retain(|reactive_context| reactive_context.mark_dirty());
            }
            debug!("🔄 [REFRESH] Triggered refresh for: {}", key);
        }
        matching.len()
    }

    pub fn is_revalidation_in_progress(&self, key: &CacheKey) -> bool {
        if let Ok(revalidations) = self.ongoing_revalidations.lock() {
            revalidations.contains_key(key)
        } else {
            false
        }
    }

    /// Claims the fetch of `key`, or joins the one already in flight
    pub fn start_revalidation(&self, key: &CacheKey) -> Revalidation {
        let Ok(mut revalidations) = self.ongoing_revalidations.lock() else {
            return Revalidation::Started;
        };
        match revalidations.get_mut(key) {
            Some(waiters) => {
                let (done, wait) = oneshot::channel();
                waiters.push(done);
                Revalidation::InProgress(wait)
            }
            None => {
                revalidations.insert(key.clone(), Vec::new());
                Revalidation::Started
            }
        }
    }

    /// Must be called by the owner when a fetch finishes, whatever its outcome.
    /// Wakes every caller waiting on it.
    pub fn complete_revalidation(&self, key: &CacheKey) {
        let waiters = match self.ongoing_revalidations.lock() {
            Ok(mut revalidations) => revalidations.remove(key).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        if !waiters.is_empty() {
            debug!(
                "🔄 [REFRESH] Fetch of {} done, waking {} waiters",
                key,
                waiters.len()
            );
        }
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }

    /// Drops subscription sets that no longer hold any context, together with their
    /// refresh counters. Returns how many keys were dropped.
    pub fn cleanup(&self) -> usize {
        let Ok(mut contexts) = self.reactive_contexts.lock() else {
            return 0;
        };
        let mut dropped = Vec::new();
        contexts.retain(|key, context_set| {
            let keep = context_set.lock().map(|set| !set.is_empty()).unwrap_or(false);
            if !keep {
                dropped.push(key.clone());
            }
            keep
        });
        drop(contexts);

        if let Ok(mut counters) = self.refresh_counters.lock() {
            for key in &dropped {
                counters.remove(key);
            }
        }
        if !dropped.is_empty() {
            debug!("🧹 [REFRESH] Dropped {} unsubscribed keys", dropped.len());
        }
        dropped.len()
    }

    pub fn subscribed_keys(&self) -> usize {
        self.reactive_contexts.lock().map(|c| c.len()).unwrap_or(0)
    }
}
