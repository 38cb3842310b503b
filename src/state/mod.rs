use std::sync::Arc;

use crate::{config::AppConfig, db::app_storage::AppStorage, scoring::ScoringPolicy};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<AppStorage>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(storage: AppStorage, config: AppConfig) -> Self {
        Self {
            storage: Arc::new(storage),
            config: Arc::new(config),
        }
    }

    pub fn policy(&self) -> ScoringPolicy {
        ScoringPolicy::with_urgent_boundary(self.config.days_when_urgent)
    }
}
