use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voiceclone_backend::controllers::clone::CloneController;
use voiceclone_backend::domain::clone::{ClonePipeline, HistoryService};
use voiceclone_backend::infrastructure::config::{Config, LogFormat};
use voiceclone_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use voiceclone_backend::infrastructure::http::start_http_server;
use voiceclone_backend::infrastructure::repositories::{
    ElevenLabsVoiceRepository, PgHistoryRepository, SupabaseStorageRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting VoiceClone Backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // One shared outbound HTTP client with an explicit total timeout; both the
    // storage and voice-clone repositories inherit it, so no external call can
    // hang past the configured deadline.
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;
    tracing::info!(
        timeout_secs = config.http_timeout_secs,
        "Outbound HTTP client created"
    );

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject db pool and HTTP client)
    tracing::info!("Instantiating repositories...");
    let storage_repo = Arc::new(SupabaseStorageRepository::new(
        config.supabase_url.clone(),
        config.supabase_service_key.clone(),
        http_client.clone(),
    ));
    let voice_repo = Arc::new(ElevenLabsVoiceRepository::new(
        config.eleven_labs_api_key.clone(),
        http_client,
    ));
    let history_repo = Arc::new(PgHistoryRepository::new(pool.clone()));

    // 2. Instantiate services (inject repositories)
    tracing::info!("Instantiating services...");
    let pipeline = Arc::new(ClonePipeline::new(
        storage_repo,
        voice_repo,
        history_repo.clone(),
        config.input_audio_bucket.clone(),
        config.output_audio_bucket.clone(),
    ));
    let history_service = Arc::new(HistoryService::new(history_repo));

    // 3. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let clone_controller = Arc::new(CloneController::new(pipeline, history_service));

    // Start HTTP server with all routes
    start_http_server(pool, config, clone_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voiceclone_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voiceclone_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
