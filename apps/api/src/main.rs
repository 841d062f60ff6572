mod config;
mod conversion;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod storage;
mod submission;
mod utils;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::conversion::PdfiumConverter;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{FileStorage, RedisKvStore, S3FileStorage};
use crate::submission::feedback::LlmFeedbackService;
use crate::submission::pipeline::Collaborators;
use crate::submission::status::StatusBoard;
use crate::utils::format_size;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails on missing required env vars
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resumind API v{}", env!("CARGO_PKG_VERSION"));

    let redis = redis::Client::open(config.redis_url.clone())?;
    let kv = Arc::new(RedisKvStore::connect(&redis).await?);

    let s3 = build_s3_client(&config).await;
    let storage: Arc<dyn FileStorage> =
        Arc::new(S3FileStorage::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let converter = Arc::new(PdfiumConverter::new(
        config.pdfium_library_path.clone(),
        config.render_scale,
    )?);
    info!("PDFium loaded (render scale: {})", config.render_scale);

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let analyzer = Arc::new(LlmFeedbackService::new(llm, storage.clone()));

    let state = AppState {
        collaborators: Collaborators {
            storage,
            converter,
            kv,
            analyzer,
        },
        status_board: StatusBoard::new(Duration::from_secs(config.status_retention_secs)),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!(
        "Listening on {addr} (max upload {})",
        format_size(config.max_upload_bytes as u64)
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumind-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets under the path, not a subdomain
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
