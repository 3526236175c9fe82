use clap::Parser;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use url_to_image::{setup_logging, Cli, CliRunner, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments; clap exits with status 2 on usage errors
    let args = Cli::parse();

    setup_logging(args.verbose)?;

    info!("Starting url-to-image v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args).await?;
    let runner = CliRunner::new(config);

    // Setup graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::broadcast::channel(1);
    let _shutdown_handler = setup_shutdown_handler(shutdown_tx.clone());

    // Appends are atomic per record, so an interrupted run leaves a valid
    // partial key file for the next invocation to resume from.
    let result = tokio::select! {
        result = runner.run(args.command) => result,
        _ = shutdown_rx.recv() => {
            info!("Received shutdown signal");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Application error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn load_config(args: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if let Some(config_path) = &args.config {
        // Load from file
        let config_content = tokio::fs::read_to_string(config_path).await?;
        serde_json::from_str(&config_content)?
    } else {
        Config::default()
    };

    // Override with CLI arguments
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }

    if let Some(key_file) = &args.key_file {
        config.key_file = key_file.clone();
    }

    if let Some(renderer_path) = &args.renderer_path {
        config.renderer_path = renderer_path.clone();
    }

    if let Some(timeout) = args.timeout {
        config.render_timeout = Duration::from_secs(timeout);
    }

    if args.no_thumbnails {
        config.thumbnails = false;
    }

    validate_config(&config)?;

    info!("Worker count: {}", config.worker_count);
    info!("Renderer: {}", config.renderer_path);
    info!("Key file: {}", config.key_file.display());

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.worker_count == 0 {
        return Err("Worker count must be greater than 0".into());
    }

    if config.resolution.width == 0 || config.resolution.height == 0 {
        return Err("Render resolution must be greater than 0".into());
    }

    if config.thumb_size.width == 0 || config.thumb_size.height == 0 {
        return Err("Thumbnail dimensions must be greater than 0".into());
    }

    if config.render_timeout.as_secs() == 0 {
        return Err("Render timeout must be greater than 0".into());
    }

    Ok(())
}

fn setup_shutdown_handler(
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to create SIGINT handler");
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to create SIGTERM handler");

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }

        let _ = shutdown_tx.send(());
    })
}
