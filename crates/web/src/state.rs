use std::sync::Arc;

use storage::Store;

/// Shared handler state: the backend picked at startup.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
