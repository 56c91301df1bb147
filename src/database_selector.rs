//! Database currently selected in the report toolbar (primary or a read replica)

use std::sync::{Arc, Mutex};
use tracing::debug;

/// Shared handle to the selected database identifier. `None` means the primary database.
#[derive(Clone, Default, Debug)]
pub struct DatabaseSelector {
    selected: Arc<Mutex<Option<String>>>,
}

impl DatabaseSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<String> {
        self.selected.lock().ok().and_then(|s| s.clone())
    }

    pub fn select(&self, database_identifier: Option<String>) {
        if let Ok(mut selected) = self.selected.lock() {
            debug!("🗄️ [DATABASE] Selected database: {:?}", database_identifier);
            *selected = database_identifier;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_selection() {
        let selector = DatabaseSelector::new();
        let other = selector.clone();
        assert_eq!(selector.selected(), None);

        other.select(Some("abc123-rr".into()));
        assert_eq!(selector.selected().as_deref(), Some("abc123-rr"));
    }
}
