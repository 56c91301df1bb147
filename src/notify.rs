//! User-visible notifications (toasts)

use std::sync::{Arc, Mutex};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Presents messages to the user
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Collects toasts for the UI to render and dismiss
#[derive(Clone, Default)]
pub struct ToastQueue {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: ToastLevel, message: &str) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(Toast {
                level,
                message: message.to_string(),
            });
        }
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Removes and returns every pending toast
    pub fn drain(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .map(|mut t| t.drain(..).collect())
            .unwrap_or_default()
    }
}

impl Notifier for ToastQueue {
    fn success(&self, message: &str) {
        self.push(ToastLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(ToastLevel::Error, message);
    }
}

/// Writes notifications to the log; used when no UI is attached
#[derive(Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}
