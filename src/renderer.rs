//! External rendering process invocation
//!
//! Rendering is delegated to an external binary (wkhtmltoimage by default) that
//! turns a URL into an image file. The binary does not pick output names, so a
//! collision-resistant name is generated per call, independent of the URL.

use crate::{Config, ImageFormat, Resolution, SnapshotError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Capability that turns a URL into a full-size image file.
///
/// Implementations return the name of the file they produced. A failure means
/// the URL's job is abandoned: nothing is ever written to the key file for it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, SnapshotError>;
}

/// Generate a unique image filename for one render call.
///
/// Uses a random UUID rather than anything URL-derived so that concurrent
/// workers never collide without coordination.
pub fn unique_filename(format: ImageFormat) -> String {
    format!("{}.{}", uuid::Uuid::new_v4(), format.extension())
}

/// [`Renderer`] backed by the wkhtmltoimage binary.
///
/// Invocation: `wkhtmltoimage --width W --height H --format EXT <url> <outfile>`.
/// The child's stdout and stderr are discarded; only the exit status matters.
pub struct WkhtmltoimageRenderer {
    binary: String,
    resolution: Resolution,
    format: ImageFormat,
    render_timeout: std::time::Duration,
}

impl WkhtmltoimageRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            binary: config.renderer_path.clone(),
            resolution: config.resolution,
            format: config.image_format,
            render_timeout: config.render_timeout,
        }
    }
}

#[async_trait]
impl Renderer for WkhtmltoimageRenderer {
    async fn render(&self, url: &str) -> Result<String, SnapshotError> {
        let filename = unique_filename(self.format);

        debug!("Rendering {} into {}", url, filename);

        let mut child = Command::new(&self.binary)
            .arg("--width")
            .arg(self.resolution.width.to_string())
            .arg("--height")
            .arg(self.resolution.height.to_string())
            .arg("--format")
            .arg(self.format.extension())
            .arg(url)
            .arg(&filename)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SnapshotError::RendererLaunchFailed(e.to_string()))?;

        let status = match timeout(self.render_timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.start_kill();
                return Err(SnapshotError::RenderTimeout(self.render_timeout));
            }
        };

        if status.success() {
            Ok(filename)
        } else {
            Err(SnapshotError::RenderFailed {
                url: url.to_string(),
                status: status.to_string(),
            })
        }
    }
}
