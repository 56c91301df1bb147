//! # View Scheduler
//!
//! Delayed callbacks tied to the lifetime of a view. Each callback has a name;
//! scheduling a name again replaces the pending callback. Cancelling, or dropping the
//! scheduler, stops every callback that has not fired yet.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tracing::debug;

#[cfg(not(target_family = "wasm"))]
use tokio::task::JoinHandle;
#[cfg(target_family = "wasm")]
use dioxus::prelude::{Task, spawn};

use crate::platform::time;

struct ScheduledTask {
    #[cfg(not(target_family = "wasm"))]
    handle: JoinHandle<()>,
    #[cfg(target_family = "wasm")]
    handle: Task,
    fired: Arc<AtomicBool>,
}

impl ScheduledTask {
    fn abort(self) {
        #[cfg(not(target_family = "wasm"))]
        self.handle.abort();
        #[cfg(target_family = "wasm")]
        self.handle.cancel();
    }
}

/// Owner of a view's pending timers
#[derive(Default)]
pub struct ViewScheduler {
    tasks: Arc<Mutex<HashMap<String, ScheduledTask>>>,
}

impl ViewScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `callback` after `delay` unless cancelled first
    pub fn schedule<F>(&self, name: &str, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(mut tasks) = self.tasks.lock() else {
            return;
        };

        if let Some(existing) = tasks.remove(name) {
            existing.abort();
            debug!("⏱️ [SCHEDULER] Replaced pending callback: {}", name);
        }

        let fired = Arc::new(AtomicBool::new(false));
        let fired_in_task = fired.clone();
        let task_name = name.to_string();
        let future = async move {
            time::sleep(delay).await;
            callback();
            fired_in_task.store(true, Ordering::SeqCst);
            debug!("⏱️ [SCHEDULER] Fired: {}", task_name);
        };

        #[cfg(not(target_family = "wasm"))]
        let handle = tokio::spawn(future);
        #[cfg(target_family = "wasm")]
        let handle = spawn(future);

        tasks.insert(name.to_string(), ScheduledTask { handle, fired });
    }

    /// Cancels the callback registered under `name`. Returns true if it had not fired.
    pub fn cancel(&self, name: &str) -> bool {
        let Some(task) = self.tasks.lock().ok().and_then(|mut t| t.remove(name)) else {
            return false;
        };
        let was_pending = !task.fired.load(Ordering::SeqCst);
        task.abort();
        if was_pending {
            debug!("⏱️ [SCHEDULER] Cancelled: {}", name);
        }
        was_pending
    }

    /// Cancels every callback. Returns how many had not fired.
    pub fn cancel_all(&self) -> usize {
        let Ok(mut tasks) = self.tasks.lock() else {
            return 0;
        };
        let mut cancelled = 0;
        for (_, task) in tasks.drain() {
            if !task.fired.load(Ordering::SeqCst) {
                cancelled += 1;
            }
            task.abort();
        }
        if cancelled > 0 {
            debug!("⏱️ [SCHEDULER] Cancelled {} pending callbacks", cancelled);
        }
        cancelled
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.tasks
            .lock()
            .map(|tasks| {
                tasks
                    .get(name)
                    .is_some_and(|t| !t.fired.load(Ordering::SeqCst))
            })
            .unwrap_or(false)
    }

    /// Number of callbacks that have not fired yet
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .map(|tasks| {
                tasks
                    .values()
                    .filter(|t| !t.fired.load(Ordering::SeqCst))
                    .count()
            })
            .unwrap_or(0)
    }
}

impl Drop for ViewScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
