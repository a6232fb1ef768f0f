//! Cover image pipeline for category rows.
//!
//! This module provides:
//! - `CoverSource` - Resolves a cover URL to an HTTP or local file source
//! - `decode` - Decodes, downsizes and rounds cover images
//! - `CoverCache` - Memory LRU of decoded covers plus a disk cache of fetched bytes
//! - `CoverPipeline` - Background fetch/decode on a tokio runtime

pub mod cache;
pub mod decode;
pub mod pipeline;
pub mod source;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::CoverCache;
pub use decode::CoverImage;
pub use pipeline::{CoverPipeline, CoverResult, CoverSettings, RequestOutcome};
pub use source::CoverSource;

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("cover URL is empty")]
    Empty,
    #[error("unsupported cover URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("failed to read cover {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch cover {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("cover {url} is larger than {limit} bytes")]
    TooLarge { url: String, limit: usize },
    #[error("failed to decode cover: {0}")]
    Decode(#[from] image::ImageError),
    #[error("animated cover has no frames")]
    NoFrames,
    #[error("cover decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
