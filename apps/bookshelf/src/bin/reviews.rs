use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use bookshelf::audit::AuditLog;
use bookshelf::auth::RemoteVerifier;
use bookshelf::catalog::client::HttpBookCatalog;
use bookshelf::config::Config;
use bookshelf::db::{apply_schema, create_pool};
use bookshelf::reviews::{self, store::PgReviewStore, ReviewState, SERVICE_NAME};
use bookshelf::summaries::client::HttpSummaryGateway;
use bookshelf::{server, upstream};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(8002)?;
    server::init_tracing(&config);

    info!("Starting reviews service v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    apply_schema(&db, reviews::store::SCHEMA).await?;

    let http = upstream::build_http_client(config.outbound_timeout)?;
    let verifier = Arc::new(RemoteVerifier::new(http.clone(), &config.shared_service_url));
    let (audit, audit_worker) = AuditLog::from_config(SERVICE_NAME, &http, &config);

    let state = ReviewState {
        store: Arc::new(PgReviewStore::new(db)),
        catalog: Arc::new(HttpBookCatalog::new(http.clone(), &config.book_service_url)),
        summaries: Arc::new(HttpSummaryGateway::new(
            http.clone(),
            &config.summary_service_url,
        )),
        audit,
    };

    server::serve(
        SERVICE_NAME,
        config.port,
        reviews::router(state, verifier),
        audit_worker,
    )
    .await
}
