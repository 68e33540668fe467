use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use bookshelf::audit::AuditLog;
use bookshelf::auth::RemoteVerifier;
use bookshelf::config::Config;
use bookshelf::db::{apply_schema, create_pool};
use bookshelf::llm_client::{LlmClient, LlmSettings};
use bookshelf::summaries::{self, store::PgSummaryStore, SummaryState, SERVICE_NAME};
use bookshelf::{server, upstream};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env(8003)?;
    server::init_tracing(&config);

    info!("Starting summaries service v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    apply_schema(&db, summaries::store::SCHEMA).await?;

    let http = upstream::build_http_client(config.outbound_timeout)?;

    let llm = LlmClient::new(
        http.clone(),
        LlmSettings {
            base_url: config.llm_api_url.clone(),
            model: config.llm_model.clone(),
            api_key: config.llm_api_key.clone(),
            max_tokens: config.llm_max_tokens,
        },
    );
    info!("LLM client initialized (model: {})", llm.model());

    let verifier = Arc::new(RemoteVerifier::new(http.clone(), &config.shared_service_url));
    let (audit, audit_worker) = AuditLog::from_config(SERVICE_NAME, &http, &config);

    let state = SummaryState {
        store: Arc::new(PgSummaryStore::new(db)),
        summarizer: Arc::new(llm),
        audit,
    };

    server::serve(
        SERVICE_NAME,
        config.port,
        summaries::router(state, verifier),
        audit_worker,
    )
    .await
}
