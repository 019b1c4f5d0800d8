//! Shared application state.

use std::sync::Arc;

use tracing::info;

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use farmasys_db::seed::seed_demo_inventory;
use farmasys_db::{Database, DbResult};

/// Handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = JwtManager::new(
            config.auth.jwt_secret.clone(),
            config.auth.token_lifetime_secs,
        );
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    /// Opens the database and prepares it for serving.
    ///
    /// ## What This Does
    /// 1. Opens the pool and applies migrations
    /// 2. Creates the configured admin if there are no users
    /// 3. Loads the demo inventory when enabled and the inventory is empty
    pub async fn initialize(config: ServerConfig) -> DbResult<Self> {
        let db = Database::new(config.database_config()).await?;

        let created = db
            .users()
            .ensure_bootstrap_admin(&config.auth.admin_username, &config.auth.admin_password)
            .await?;
        if created {
            info!(username = %config.auth.admin_username, "Created bootstrap admin");
        }

        if config.store.seed_demo_inventory {
            seed_demo_inventory(&db).await?;
        }

        Ok(AppState::new(db, config))
    }
}
