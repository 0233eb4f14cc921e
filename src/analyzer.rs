//! Image color analysis: load an image, decode it, and extract its color pair.
//!
//! Loading is the only asynchronous step in the pipeline. Decoding and
//! sampling are CPU-bound and run on the blocking thread pool so they never
//! stall navigation or the autoplay timer.
//!
//! Every failure is absorbed here: [`ImageColorAnalyzer::request`] always
//! resolves to a [`ColorPair`], falling back to [`ColorPair::FALLBACK`] when
//! the image cannot be fetched or decoded.

use crate::dominant::{self, ColorPair};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Why an image could not be analyzed. Logged, never returned to callers
/// of [`ImageColorAnalyzer::request`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ── Image sources ────────────────────────────────────────────────────

/// Fetches the encoded bytes behind an image locator.
///
/// # Rust concept: `impl Future` in traits
/// Declaring the returned future as `Send` lets the carousel move
/// analyses onto spawned Tokio tasks without boxing.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self, locator: &str) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send;
}

/// Upper bound on one HTTP fetch, from connecting until the body is read.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads `http://` and `https://` locators over the network and everything
/// else (`file://` URLs or plain paths) from disk.
#[derive(Clone, Debug)]
pub struct DefaultImageSource {
    client: reqwest::Client,
    timeout: Duration,
}

impl DefaultImageSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: FETCH_TIMEOUT,
        }
    }

    /// Give up on HTTP fetches that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for DefaultImageSource {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl ImageSource for DefaultImageSource {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, LoadError> {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            // Anonymous request: no cookies or credentials are attached.
            let response = self
                .client
                .get(locator)
                .timeout(self.timeout)
                .send()
                .await?
                .error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        } else {
            let path = locator.strip_prefix("file://").unwrap_or(locator);
            Ok(tokio::fs::read(path).await?)
        }
    }
}

// ── Analyzer ─────────────────────────────────────────────────────────

/// Lifecycle of a single analysis request.
///
/// `Idle → Loading → Decoded | LoadFailed`. Both terminal states carry a
/// usable color pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Loading,
    Decoded,
    LoadFailed,
}

impl AnalysisState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Decoded | Self::LoadFailed)
    }
}

/// Result of one analysis request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Analysis {
    /// Terminal state reached: [`AnalysisState::Decoded`] or [`AnalysisState::LoadFailed`].
    pub state: AnalysisState,
    pub pair: ColorPair,
}

/// Decode an encoded image at its natural size and extract its color pair.
pub fn analyze_bytes(bytes: &[u8]) -> Result<ColorPair, image::ImageError> {
    let pixels = image::load_from_memory(bytes)?.to_rgba8();
    Ok(dominant::extract_from_rgba(pixels.as_raw()))
}

/// Runs the color pipeline for images fetched from an [`ImageSource`].
#[derive(Debug)]
pub struct ImageColorAnalyzer<S> {
    source: S,
}

impl<S: ImageSource> ImageColorAnalyzer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Analyze the image at `locator`. Never fails: any load or decode
    /// error resolves to [`ColorPair::FALLBACK`].
    pub async fn request(&self, locator: &str) -> Analysis {
        tracing::debug!(state = ?AnalysisState::Loading, "Analyzing {}", locator);

        match self.load(locator).await {
            Ok(pair) => {
                tracing::debug!(
                    state = ?AnalysisState::Decoded,
                    "Colors for {}: dominant {}, least {}",
                    locator,
                    pair.dominant,
                    pair.least
                );
                Analysis {
                    state: AnalysisState::Decoded,
                    pair,
                }
            }
            Err(e) => {
                tracing::warn!("Color analysis failed for {}: {}", locator, e);
                Analysis {
                    state: AnalysisState::LoadFailed,
                    pair: ColorPair::FALLBACK,
                }
            }
        }
    }

    async fn load(&self, locator: &str) -> Result<ColorPair, LoadError> {
        let bytes = self.source.fetch(locator).await?;
        let pair = tokio::task::spawn_blocking(move || analyze_bytes(&bytes)).await??;
        Ok(pair)
    }
}
