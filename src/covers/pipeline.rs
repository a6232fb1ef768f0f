//! Background cover loading.
//!
//! - Requests enter through a bounded flume queue; a full queue drops the request
//! - A dispatcher task on a tokio runtime fetches with bounded concurrency
//! - Decoding runs on the blocking pool
//! - Results leave through an async channel the GTK main loop polls
//!
//! Only one fetch per URL is in flight at a time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tokio::sync::Semaphore;
use tracing::{debug, error, trace, warn};

use super::decode::decode_cover;
use super::{CoverCache, CoverError, CoverImage, CoverSource};
use crate::config::Config;

/// Maximum number of queued cover requests.
const MAX_QUEUE_SIZE: usize = 512;

/// Largest HTTP cover body accepted.
const MAX_COVER_BYTES: usize = 32 * 1024 * 1024;

/// Runtime threads; fetching is I/O bound and decoding uses the blocking pool.
const RUNTIME_THREADS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverSettings {
    pub size: u32,
    pub corner_radius: u32,
    /// Maximum concurrent fetches.
    pub workers: usize,
    pub timeout: Duration,
    pub queue_len: usize,
    /// Cap on fetched HTTP body size.
    pub max_bytes: usize,
}

impl CoverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            size: config.cover_size,
            corner_radius: config.corner_radius,
            workers: config.cover_workers,
            timeout: config.fetch_timeout,
            queue_len: MAX_QUEUE_SIZE,
            max_bytes: MAX_COVER_BYTES,
        }
    }
}

impl Default for CoverSettings {
    fn default() -> Self {
        Self {
            size: 256,
            corner_radius: 32,
            workers: 4,
            timeout: Duration::from_secs(15),
            queue_len: MAX_QUEUE_SIZE,
            max_bytes: MAX_COVER_BYTES,
        }
    }
}

/// Outcome of one cover request, delivered to the main thread.
#[derive(Debug, Clone)]
pub struct CoverResult {
    pub url: String,
    pub image: Option<Arc<CoverImage>>,
    /// Error message if loading failed.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Submitted,
    /// A fetch for this URL is already running; its result will be delivered.
    AlreadyPending,
    /// Queue full or pipeline shut down. No result will be delivered.
    Rejected,
}

struct FetchContext {
    client: reqwest::Client,
    cache: Arc<CoverCache>,
    settings: CoverSettings,
}

pub struct CoverPipeline {
    request_tx: Sender<String>,
    result_rx: async_channel::Receiver<CoverResult>,
    pending: Arc<Mutex<HashSet<String>>>,
    cache: Arc<CoverCache>,
    runtime: Option<Runtime>,
}

impl CoverPipeline {
    pub fn new(settings: CoverSettings, cache: CoverCache) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("catshelf/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Self::with_client(settings, cache, client)
    }

    fn with_client(
        settings: CoverSettings,
        cache: CoverCache,
        client: reqwest::Client,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(RUNTIME_THREADS)
            .thread_name("cover-fetch")
            .enable_all()
            .build()
            .context("Failed to create tokio runtime for cover loading")?;

        let (request_tx, request_rx) = flume::bounded::<String>(settings.queue_len.max(1));
        let (result_tx, result_rx) = async_channel::unbounded::<CoverResult>();

        let cache = Arc::new(cache);
        let pending = Arc::new(Mutex::new(HashSet::new()));
        let workers = settings.workers.max(1);
        let context = Arc::new(FetchContext {
            client,
            cache: Arc::clone(&cache),
            settings,
        });

        runtime.spawn(dispatch_loop(
            request_rx,
            result_tx,
            context,
            Arc::clone(&pending),
            workers,
        ));

        debug!(workers, disk_cache = ?cache.disk_dir(), "Started cover pipeline");

        Ok(Self {
            request_tx,
            result_rx,
            pending,
            cache,
            runtime: Some(runtime),
        })
    }

    /// Queue `url` for loading unless it is already in flight.
    pub fn request(&self, url: &str) -> RequestOutcome {
        let mut pending = self.pending.lock();
        if pending.contains(url) {
            trace!(url, "Cover request already pending");
            return RequestOutcome::AlreadyPending;
        }

        match self.request_tx.try_send(url.to_string()) {
            Ok(()) => {
                pending.insert(url.to_string());
                RequestOutcome::Submitted
            }
            Err(flume::TrySendError::Full(_)) => {
                warn!(url, "Cover queue full, dropping request");
                RequestOutcome::Rejected
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                error!("Cover queue disconnected");
                RequestOutcome::Rejected
            }
        }
    }

    pub fn cached(&self, url: &str) -> Option<Arc<CoverImage>> {
        self.cache.get(url)
    }

    /// Receiver for completed requests. All clones share one stream.
    pub fn results(&self) -> async_channel::Receiver<CoverResult> {
        self.result_rx.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn cache(&self) -> &CoverCache {
        &self.cache
    }
}

impl Drop for CoverPipeline {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            debug!("Cover pipeline shut down");
        }
    }
}

async fn dispatch_loop(
    rx: Receiver<String>,
    tx: async_channel::Sender<CoverResult>,
    context: Arc<FetchContext>,
    pending: Arc<Mutex<HashSet<String>>>,
    workers: usize,
) {
    let permits = Arc::new(Semaphore::new(workers));

    while let Ok(url) = rx.recv_async().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let context = Arc::clone(&context);
        let tx = tx.clone();
        let pending = Arc::clone(&pending);

        tokio::spawn(async move {
            let outcome = fetch_cover(&context, &url).await;
            drop(permit);
            pending.lock().remove(&url);

            let result = match outcome {
                Ok(image) => CoverResult {
                    url,
                    image: Some(image),
                    error: None,
                },
                Err(err) => {
                    warn!(url = %url, error = %err, "Failed to load cover");
                    CoverResult {
                        url,
                        image: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            let _ = tx.send(result).await;
        });
    }

    debug!("Cover dispatcher stopped");
}

async fn fetch_cover(context: &FetchContext, url: &str) -> Result<Arc<CoverImage>, CoverError> {
    if let Some(image) = context.cache.get(url) {
        trace!(url, "Cover memory cache hit");
        return Ok(image);
    }

    let image = match CoverSource::parse(url)? {
        CoverSource::File(path) => {
            let read = tokio::fs::read(&path).await;
            let bytes = read.map_err(|source| CoverError::Io { path, source })?;
            decode_blocking(&context.settings, bytes).await?.0
        }
        CoverSource::Http(http_url) => fetch_http_cover(context, url, &http_url).await?,
    };

    let image = Arc::new(image);
    context.cache.insert(url, Arc::clone(&image));
    Ok(image)
}

async fn fetch_http_cover(
    context: &FetchContext,
    url: &str,
    http_url: &str,
) -> Result<CoverImage, CoverError> {
    if let Some(bytes) = context.cache.read_disk(url) {
        match decode_blocking(&context.settings, bytes).await {
            Ok((image, _)) => return Ok(image),
            Err(err) => {
                warn!(url, error = %err, "Discarding unreadable cached cover");
                context.cache.remove_disk(url);
            }
        }
    }

    debug!(url, "Fetching cover");
    let bytes = fetch_http(&context.client, http_url, context.settings.max_bytes).await?;
    let (image, bytes) = decode_blocking(&context.settings, bytes).await?;

    if let Err(err) = context.cache.write_disk(url, &bytes) {
        warn!(url, error = ?err, "Failed to write cover to disk cache");
    }
    Ok(image)
}

async fn fetch_http(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, CoverError> {
    let http_error = |source| CoverError::Http {
        url: url.to_string(),
        source,
    };
    let too_large = || CoverError::TooLarge {
        url: url.to_string(),
        limit: max_bytes,
    };

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(http_error)?
        .error_for_status()
        .map_err(http_error)?;

    if response
        .content_length()
        .is_some_and(|len| len > max_bytes as u64)
    {
        return Err(too_large());
    }

    // Servers may omit or understate the length, so enforce the cap while streaming.
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(http_error)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Decode on the blocking pool, handing the source bytes back on success.
async fn decode_blocking(
    settings: &CoverSettings,
    bytes: Vec<u8>,
) -> Result<(CoverImage, Vec<u8>), CoverError> {
    let (size, radius) = (settings.size, settings.corner_radius);
    tokio::task::spawn_blocking(move || decode_cover(&bytes, size, radius).map(|image| (image, bytes)))
        .await?
}
