use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::repository::{db_init::init_database, LedgerRepoFactory, LedgerRepositories};

pub struct PostgresRepositories {
    pool: Arc<PgPool>,
    factory: Arc<LedgerRepoFactory>,
}

impl PostgresRepositories {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            factory: LedgerRepoFactory::new(),
        }
    }

    /// Connects to `database_url` and applies the schema.
    #[tracing::instrument(skip(database_url))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        init_database(&pool).await?;
        tracing::info!(max_connections, "ledger schema ready");

        Ok(Self::new(Arc::new(pool)))
    }

    pub fn pool(&self) -> &Arc<PgPool> {
        &self.pool
    }

    /// Create the account and transaction repositories over the shared pool
    pub fn create_ledger_repositories(&self) -> LedgerRepositories {
        self.factory.build_all_repos(&self.pool)
    }
}
