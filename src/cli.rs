use crate::{
    resolve_thumbnailer, Config, JobDispatcher, Renderer, ResultLog, SnapshotError, Thumbnailer,
    WkhtmltoimageRenderer,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "url-to-image")]
#[command(about = "Creates screenshot images from a list of URLs")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, help = "Configuration file path (JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Number of concurrent render workers")]
    pub workers: Option<usize>,

    #[arg(long, help = "Path of the key file recording processed URLs")]
    pub key_file: Option<PathBuf>,

    #[arg(long, help = "Path to the rendering binary")]
    pub renderer_path: Option<String>,

    #[arg(long, help = "Render timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Skip thumbnail generation")]
    pub no_thumbnails: bool,

    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render screenshots for every new URL in a newline-delimited list file
    Process {
        #[arg(help = "File containing URLs, one per line")]
        input: PathBuf,
    },

    /// Print previously processed records whose URL contains a substring
    Search {
        #[arg(help = "Case-sensitive substring to match against recorded URLs")]
        term: String,
    },
}

/// Drives one invocation: loads the key file, filters the batch, runs the
/// dispatcher and reports the outcome.
pub struct CliRunner {
    pub config: Config,
    result_log: ResultLog,
    renderer: Arc<dyn Renderer>,
    thumbnailer: Option<Arc<dyn Thumbnailer>>,
}

impl CliRunner {
    pub fn new(config: Config) -> Self {
        let renderer = Arc::new(WkhtmltoimageRenderer::new(&config));
        let thumbnailer = resolve_thumbnailer(&config);
        Self::with_collaborators(config, renderer, thumbnailer)
    }

    /// Construct with explicit collaborators. Tests inject stand-ins here.
    pub fn with_collaborators(
        config: Config,
        renderer: Arc<dyn Renderer>,
        thumbnailer: Option<Arc<dyn Thumbnailer>>,
    ) -> Self {
        let result_log = ResultLog::new(config.key_file.clone());
        Self {
            config,
            result_log,
            renderer,
            thumbnailer,
        }
    }

    pub async fn run(&self, command: Commands) -> Result<(), SnapshotError> {
        match command {
            Commands::Process { input } => self.run_process(&input).await,
            Commands::Search { term } => self.run_search(&term).await,
        }
    }

    /// `process` mode: read the URL list, drop already-processed URLs and hand
    /// the remainder to the dispatcher.
    pub async fn run_process(&self, input: &Path) -> Result<(), SnapshotError> {
        let urls = self.read_urls_from_file(input).await?;
        info!("Loaded {} URLs from {}", urls.len(), input.display());

        let processed = self.result_log.load().await?;
        let pending: Vec<String> = urls
            .into_iter()
            .filter(|url| !processed.contains(url))
            .collect();

        if pending.is_empty() {
            info!("No new URLs to process");
            return Ok(());
        }

        if self.thumbnailer.is_none() {
            warn!("Thumbnailing unavailable, records will omit thumbnails");
        }

        let appender = self.result_log.open_appender().await?;
        let dispatcher = JobDispatcher::new(
            self.config.worker_count,
            self.config.queue_capacity(),
            self.renderer.clone(),
            self.thumbnailer.clone(),
        );

        let summary = dispatcher.run(pending, appender).await?;
        info!(
            "Run complete: {} screenshots created, {} failed",
            summary.completed, summary.failed
        );

        Ok(())
    }

    /// `search` mode: print every matching record as a comma-joined line.
    pub async fn run_search(&self, term: &str) -> Result<(), SnapshotError> {
        let matches = self.result_log.search(term).await?;
        for record in &matches {
            println!("{}", record.display_line());
        }
        info!("Found {} records matching '{}'", matches.len(), term);
        Ok(())
    }

    /// Read a newline-delimited URL list: whitespace trimmed, blank lines
    /// dropped. A missing or unreadable file is fatal to the invocation.
    pub async fn read_urls_from_file(&self, path: &Path) -> Result<Vec<String>, SnapshotError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SnapshotError::InputError(format!("{}: {}", path.display(), e)))?;

        Ok(content
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(|line| line.to_string())
            .collect())
    }
}

pub fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    Ok(())
}
