//! Binary entry point: load config, obtain face-recognition credentials,
//! enumerate cameras, log in, and run the pipeline until a termination
//! signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use facewatch_forward::{FindfaceClient, FindfaceClientConfig};
use facewatch_ingest::{filter_by_prefix, CameraRepository, StaticCameraRepository, UnconfiguredSource};
use facewatch_media::{HeuristicQualityService, UnconfiguredDetector};
use facewatch_worker::{AppConfig, AsyncLogger, FindfaceCredentials, Orchestrator, PipelineDeps};

#[derive(Parser)]
#[command(name = "facewatch", about = "Multi-camera face detection and forwarding pipeline")]
struct Cli {
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let (logger, logger_layer) = match AsyncLogger::start(&config.logging) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("failed to start logger: {e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(logger_layer)
        .init();

    let exit_code = run(&config);
    logger.shutdown();
    std::process::exit(exit_code);
}

fn run(config: &AppConfig) -> i32 {
    let credentials = match FindfaceCredentials::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            return e.exit_code();
        }
    };

    let cameras = StaticCameraRepository::new(config.cameras.clone());
    let cameras = match cameras.list_cameras() {
        Ok(c) => filter_by_prefix(c, &config.camera.prefix),
        Err(e) => {
            tracing::error!(error = %e, "camera enumeration failed");
            return 2;
        }
    };

    let process_started_at = chrono::Utc::now();
    let client_config = FindfaceClientConfig {
        base_url: credentials.url,
        user: credentials.user,
        password: credentials.password,
        uuid: credentials.uuid,
        max_connections: config.findface_workers.max(1),
        request_timeout: std::time::Duration::from_secs(10),
        process_started_at,
    };

    let client = match FindfaceClient::login(&client_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!(error = %e, "face-recognition login failed");
            return 2;
        }
    };

    let deps = PipelineDeps::new(
        Arc::new(UnconfiguredDetector::default()),
        Arc::new(HeuristicQualityService),
        cameras,
        |camera| UnconfiguredSource {
            camera_id: camera.camera_id,
        },
        client,
        Arc::new(facewatch_worker::NullTensorCacheReleaser),
    );

    let orchestrator = Orchestrator::start(config, deps);

    let (tx, rx) = std::sync::mpsc::channel();
    let result = ctrlc::set_handler(move || {
        let _ = tx.send(());
    });
    if let Err(e) = result {
        tracing::error!(error = %e, "failed to install signal handler");
        orchestrator.stop();
        return 2;
    }

    rx.recv().ok();
    tracing::info!("termination signal received, shutting down");
    orchestrator.stop();
    130
}
