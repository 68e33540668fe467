use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use bookshelf::audit::AuditLog;
use bookshelf::auth::RemoteVerifier;
use bookshelf::catalog::client::HttpBookCatalog;
use bookshelf::config::Config;
use bookshelf::db::{apply_schema, create_pool};
use bookshelf::recommendations::{
    self, store::PgPreferenceStore, RecommendationState, SERVICE_NAME,
};
use bookshelf::{server, upstream};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(8004)?;
    server::init_tracing(&config);

    info!("Starting recommendations service v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    apply_schema(&db, recommendations::store::SCHEMA).await?;

    let http = upstream::build_http_client(config.outbound_timeout)?;
    let verifier = Arc::new(RemoteVerifier::new(http.clone(), &config.shared_service_url));
    let (audit, audit_worker) = AuditLog::from_config(SERVICE_NAME, &http, &config);

    let state = RecommendationState {
        store: Arc::new(PgPreferenceStore::new(db)),
        catalog: Arc::new(HttpBookCatalog::new(http.clone(), &config.book_service_url)),
        audit,
    };

    server::serve(
        SERVICE_NAME,
        config.port,
        recommendations::router(state, verifier),
        audit_worker,
    )
    .await
}
