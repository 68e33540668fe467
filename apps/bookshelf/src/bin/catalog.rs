use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use bookshelf::audit::AuditLog;
use bookshelf::auth::RemoteVerifier;
use bookshelf::catalog::{self, store::PgBookStore, CatalogState, SERVICE_NAME};
use bookshelf::config::Config;
use bookshelf::db::{apply_schema, create_pool};
use bookshelf::summaries::client::HttpSummaryGateway;
use bookshelf::{server, upstream};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(8001)?;
    server::init_tracing(&config);

    info!("Starting catalog service v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    apply_schema(&db, catalog::store::SCHEMA).await?;

    let http = upstream::build_http_client(config.outbound_timeout)?;
    let verifier = Arc::new(RemoteVerifier::new(http.clone(), &config.shared_service_url));
    let (audit, audit_worker) = AuditLog::from_config(SERVICE_NAME, &http, &config);

    let state = CatalogState {
        store: Arc::new(PgBookStore::new(db)),
        summaries: Arc::new(HttpSummaryGateway::new(
            http.clone(),
            &config.summary_service_url,
        )),
        audit,
    };

    server::serve(
        SERVICE_NAME,
        config.port,
        catalog::router(state, verifier),
        audit_worker,
    )
    .await
}
