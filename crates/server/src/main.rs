use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use graphrelay_core::{
    config_path, load_config, validate_config, ArtifactStore, AwsCliStore, ComfyClient, Engine,
    EngineProcess, JobRunner, ModelSync, ObjectStore, ReadinessGate, TemplateLibrary,
};
use graphrelay_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("graphrelay {} starting", VERSION);

    // Determine config path
    let config_path = config_path();

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Fingerprint for logs and /health
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = config_hash[..16].to_string();

    info!("Configuration loaded successfully (hash {})", config_hash_short);
    info!("Engine URL: {}", config.engine.url);
    info!("Engine output directory: {:?}", config.engine.output_dir);

    // Load graph templates
    let templates = TemplateLibrary::load(&config.graph).with_context(|| {
        format!(
            "Failed to load graph templates from {:?}",
            config.graph.template_dir
        )
    })?;
    info!("{} graph template(s) available", templates.len());

    // Create remote storage backend if enabled
    let remote: Option<Arc<dyn ObjectStore>> = if config.storage.remote.enabled {
        info!("Using aws CLI at {:?} for remote storage", config.storage.remote.cli_path);
        Some(Arc::new(AwsCliStore::new(config.storage.remote.clone())))
    } else {
        info!("Remote storage disabled, only local references are served");
        None
    };

    // Model sync runs before the engine starts and never aborts startup
    let sync_outcome = ModelSync::new(config.model_sync.clone(), remote.clone())
        .run()
        .await;
    info!("Model sync outcome: {}", sync_outcome.as_str());

    // Launch the engine if this process owns it
    let engine_process = match &config.engine.launch {
        Some(launch) => {
            Some(EngineProcess::spawn(launch).context("Failed to launch engine process")?)
        }
        None => {
            info!("No engine launch command configured, expecting an external engine");
            None
        }
    };

    let engine: Arc<dyn Engine> = Arc::new(ComfyClient::new(config.engine.clone()));

    // Readiness gate: the listener is only bound once the engine answers
    let gate = Arc::new(ReadinessGate::new(
        Arc::clone(&engine),
        config.readiness.clone(),
    ));
    if let Err(e) = gate.run().await {
        if let Some(process) = engine_process {
            warn!("Stopping engine process after failed readiness");
            process.stop().await;
        }
        return Err(e).context("Engine did not become ready");
    }

    // Job runner
    let store = Arc::new(ArtifactStore::new(config.storage.clone(), remote));
    let runner = Arc::new(JobRunner::new(
        config.jobs.clone(),
        Arc::clone(&engine),
        store,
        Arc::new(templates),
        config.engine.output_dir.clone(),
    ));

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        config_hash_short,
        Arc::clone(&runner),
        gate,
        engine,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            if let Some(process) = engine_process {
                process.stop().await;
            }
            return Err(e).with_context(|| format!("Failed to bind to {}", addr));
        }
    };

    // Run server with graceful shutdown; in-flight polls are cancelled
    // as soon as the signal arrives
    let shutdown_runner = Arc::clone(&runner);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_runner.shutdown();
        })
        .await
        .context("Server error");

    info!("Server shutting down...");
    if let Some(process) = engine_process {
        info!("Stopping engine process...");
        process.stop().await;
        info!("Engine process stopped");
    }

    served
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
