use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use bookshelf::accounts::{self, store::PgAccountStore, AccountState, SERVICE_NAME};
use bookshelf::audit::AuditLog;
use bookshelf::config::Config;
use bookshelf::db::{apply_schema, create_pool};
use bookshelf::server;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(8000)?;
    server::init_tracing(&config);

    info!("Starting accounts service v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    apply_schema(&db, accounts::store::SCHEMA).await?;

    // This service is the audit sink, so its own events are never forwarded.
    let state = AccountState {
        store: Arc::new(PgAccountStore::new(db)),
        audit: AuditLog::local(SERVICE_NAME),
    };

    server::serve(SERVICE_NAME, config.port, accounts::router(state), None).await
}
