use crate::config::AppConfig;
use crate::db::{self, PgUserStore};
use crate::storage::{MemoryUserStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let pool = db::connect_with_retry(&config.db).await?;
        db::log_table_state(&pool).await;

        let store = Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>;
        Ok(Self { store, config })
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// State backed by an empty in-memory store.
    pub fn fake() -> Self {
        Self {
            store: Arc::new(MemoryUserStore::new()),
            config: Arc::new(AppConfig::for_tests()),
        }
    }
}
