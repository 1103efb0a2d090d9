use std::sync::Arc;

use edgequake_pdfmerge::MergeConfig;

/// Shared application state, injected into all route handlers via Axum state.
///
/// Holds nothing mutable: every request builds its own output document.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<MergeConfig>,
}

impl AppState {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
