//! # url-to-image
//!
//! Turns a list of URLs into rendered screenshot images by driving an external
//! rendering binary (wkhtmltoimage by default) across a small pool of workers,
//! optionally deriving a thumbnail per image. Every success is appended to a
//! persistent CSV key file, which doubles as the dedup index: a later run skips
//! URLs already recorded there, and failed URLs simply stay eligible.
//!
//! Rendering jobs flow through a bounded queue into a fixed set of workers, and
//! all key-file appends funnel through a single writer task, so the file is
//! never written concurrently and each record lands as one atomic line.
//!
//! ## CLI Usage
//!
//! ### Process a URL list
//! ```bash
//! url-to-image process urls.txt
//! ```
//!
//! ### Search previously processed URLs
//! ```bash
//! url-to-image search example.com
//! ```

/// Configuration and settings for the pipeline
pub mod config;

/// Error types and conversions
pub mod error;

/// External render process invocation
pub mod renderer;

/// Optional thumbnail generation
pub mod thumbnailer;

/// Persistent key file: dedup index and search index
pub mod result_log;

/// Bounded worker pool and single-writer result serialization
pub mod dispatcher;

/// Command-line interface implementation
pub mod cli;

#[cfg(test)]
mod tests;

pub use cli::*;
pub use config::*;
pub use dispatcher::*;
pub use error::*;
pub use renderer::*;
pub use result_log::*;
pub use thumbnailer::*;
