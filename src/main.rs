use adgen::{build_router, config::AppConfig, AppState};
use std::sync::Arc;

/// Finished jobs, their videos and unremoved uploads are dropped after this many hours
const JOB_RETENTION_HOURS: i64 = 6;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = AppConfig::from_env();

    if config.gemini.api_key.is_some() {
        tracing::info!(
            "Initializing Gemini client (text: {}, image: {}, video: {})",
            config.gemini.text_model,
            config.gemini.image_model,
            config.gemini.video_model
        );
    } else {
        tracing::warn!("API_KEY not found. Generation endpoints will answer 503 until it is set.");
        tracing::info!("To enable generation, set: GEMINI_API_KEY (or API_KEY)");
    }

    let bind_addr = config.bind_addr.clone();
    let shared_state = Arc::new(AppState::new(config));

    // Periodically drop finished scene video jobs, their videos and stale uploads
    let cleanup_state = shared_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            cleanup_state.cleanup_expired(JOB_RETENTION_HOURS).await;
        }
    });

    let app = build_router(shared_state);

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("listening on {}", bind_addr);

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,adgen=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,adgen=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("🎬 AdGen starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
