//! Configuration management with serde serialization/deserialization
//!
//! This module provides all configuration structures for the screenshot pipeline,
//! including worker pool sizing, renderer invocation settings, and output formats.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the URL-to-image pipeline
///
/// Controls worker pool sizing, the external renderer invocation, thumbnail
/// generation and the location of the persistent key file.
///
/// # Examples
///
/// ```rust
/// use url_to_image::Config;
///
/// // Use default configuration
/// let config = Config::default();
///
/// // Create custom configuration
/// let config = Config {
///     worker_count: 8,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Number of concurrent render workers (default: 3)
    ///
    /// Each worker blocks while waiting for an external render process, so a few
    /// workers are enough to keep the renderer saturated.
    pub worker_count: usize,

    /// Path to the external rendering binary (default: "wkhtmltoimage")
    pub renderer_path: String,

    /// Page resolution handed to the renderer (default: 1024x768)
    pub resolution: Resolution,

    /// Maximum thumbnail dimensions; aspect ratio is preserved (default: 128x128)
    pub thumb_size: Resolution,

    /// Output image format for rendered screenshots (default: JPEG)
    pub image_format: ImageFormat,

    /// Path of the persistent key file mapping URLs to produced image files
    /// (default: "image_key.csv")
    ///
    /// The key file doubles as the dedup index: URLs recorded here are never
    /// reprocessed by a later run.
    pub key_file: PathBuf,

    /// Timeout for a single external render invocation (default: 120 seconds)
    ///
    /// A hung renderer would otherwise occupy its worker indefinitely.
    pub render_timeout: Duration,

    /// Whether to derive a thumbnail from each rendered image (default: true)
    pub thumbnails: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: 3,
            renderer_path: "wkhtmltoimage".to_string(),
            resolution: Resolution {
                width: 1024,
                height: 768,
            },
            thumb_size: Resolution {
                width: 128,
                height: 128,
            },
            image_format: ImageFormat::Jpeg,
            key_file: PathBuf::from("image_key.csv"),
            render_timeout: Duration::from_secs(120),
            thumbnails: true,
        }
    }
}

impl Config {
    /// Capacity of the pending-job queue.
    ///
    /// Twice the worker count: enough slack that workers never starve, small
    /// enough that the producer blocks instead of buffering a large batch.
    pub fn queue_capacity(&self) -> usize {
        self.worker_count * 2
    }
}

/// A width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Supported output image formats for rendered screenshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ImageFormat {
    /// JPEG format - lossy compression, smaller files
    Jpeg,
    /// PNG format - lossless compression, best quality
    Png,
}

impl ImageFormat {
    /// File extension, also passed to the renderer's `--format` flag.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}
