//! Thumbnail generation from rendered images
//!
//! Thumbnailing is an optional capability: it is resolved once at startup into an
//! `Option<Arc<dyn Thumbnailer>>` and passed into the dispatcher. When absent,
//! records simply omit the thumbnail field. A thumbnail failure never discards an
//! otherwise-successful render.

use crate::{Config, Resolution, SnapshotError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Capability that derives a thumbnail file from a full-size image file.
///
/// The output name is deterministic: same base name, `.thumb` suffix, same
/// extension.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Thumbnailer: Send + Sync {
    async fn thumbnail(&self, fullsize: &str) -> Result<String, SnapshotError>;
}

/// Resolve the thumbnailing capability from configuration.
pub fn resolve_thumbnailer(config: &Config) -> Option<Arc<dyn Thumbnailer>> {
    if config.thumbnails {
        Some(Arc::new(ImageThumbnailer::new(config.thumb_size)))
    } else {
        None
    }
}

/// Derive the thumbnail filename from the full-size filename.
///
/// `abc123.jpg` becomes `abc123.thumb.jpg`. Inputs without an extension get a
/// plain `.thumb` suffix.
pub fn thumbnail_filename(fullsize: &str) -> String {
    match fullsize.rsplit_once('.') {
        Some((base, ext)) => format!("{base}.thumb.{ext}"),
        None => format!("{fullsize}.thumb"),
    }
}

/// [`Thumbnailer`] backed by the image crate.
///
/// Decoding and resizing are CPU-bound, so they run on the blocking pool.
pub struct ImageThumbnailer {
    max_size: Resolution,
}

impl ImageThumbnailer {
    pub fn new(max_size: Resolution) -> Self {
        Self { max_size }
    }
}

#[async_trait]
impl Thumbnailer for ImageThumbnailer {
    async fn thumbnail(&self, fullsize: &str) -> Result<String, SnapshotError> {
        let input = fullsize.to_string();
        let output = thumbnail_filename(fullsize);
        let max_size = self.max_size;

        debug!("Creating thumbnail {} from {}", output, input);

        let result_name = output.clone();
        tokio::task::spawn_blocking(move || -> Result<(), SnapshotError> {
            let img = image::open(&input)
                .map_err(|e| SnapshotError::ThumbnailFailed(e.to_string()))?;
            let thumb = img.thumbnail(max_size.width, max_size.height);
            thumb
                .save(&output)
                .map_err(|e| SnapshotError::ThumbnailFailed(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| SnapshotError::ThumbnailFailed(e.to_string()))??;

        Ok(result_name)
    }
}
