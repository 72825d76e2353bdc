use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::RewriteBackend;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub backend: Arc<dyn RewriteBackend>,
}

impl AppContext {
    pub fn new(config: AppConfig, backend: Arc<dyn RewriteBackend>) -> Self {
        Self { config, backend }
    }
}
