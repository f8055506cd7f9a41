//! Caption service: validates an image, then asks the provider for a caption.
//!
//! Inference calls are bounded by a semaphore shared by every caller, so the
//! number of concurrent requests to the backend never exceeds
//! `caption.workers`. Each attempt runs under a timeout and transient
//! failures are retried with exponential backoff.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::Config;
use crate::error::{CaptionError, CaptionResult};
use crate::llm::provider::{CaptionProvider, CaptionRequest, ImageInput};
use crate::llm::retry;
use crate::pipeline::probe::media_type;
use crate::pipeline::{ImageProbe, ProbedImage, Validator};

/// Timeout and retry policy for inference calls.
#[derive(Debug, Clone)]
pub struct CaptionOptions {
    /// Maximum concurrent inference calls
    pub workers: usize,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum retries per image
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            workers: 2,
            timeout_ms: 60_000,
            retry_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

impl CaptionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.caption.workers,
            timeout_ms: config.caption.timeout_ms,
            retry_attempts: config.caption.retry_attempts,
            retry_delay_ms: config.caption.retry_delay_ms,
        }
    }
}

/// Wraps a caption provider with validation, bounded concurrency and retries.
pub struct CaptionService {
    provider: Arc<dyn CaptionProvider>,
    validator: Validator,
    probe: ImageProbe,
    options: CaptionOptions,
    permits: Arc<Semaphore>,
}

impl CaptionService {
    pub fn new(provider: Arc<dyn CaptionProvider>, config: &Config) -> Self {
        Self::with_options(provider, config, CaptionOptions::from_config(config))
    }

    pub fn with_options(
        provider: Arc<dyn CaptionProvider>,
        config: &Config,
        options: CaptionOptions,
    ) -> Self {
        Self {
            provider,
            validator: Validator::new(config.limits.clone()),
            probe: ImageProbe::new(config.limits.clone()),
            permits: Arc::new(Semaphore::new(options.workers.max(1))),
            options,
        }
    }

    pub fn provider(&self) -> &dyn CaptionProvider {
        self.provider.as_ref()
    }

    /// Inference slots not currently in use.
    pub fn idle_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Caption the image stored at `path`.
    pub async fn generate(&self, path: &Path, max_tokens: u32) -> CaptionResult<String> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CaptionError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => {
                return Err(CaptionError::Storage {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        self.generate_from_bytes(bytes, path, max_tokens).await
    }

    /// Check that `bytes` is an image we accept without calling the provider.
    pub async fn check(&self, bytes: &[u8], path: &Path) -> CaptionResult<ProbedImage> {
        self.validator.validate(bytes, path)?;
        self.probe.probe(bytes.to_vec(), path).await
    }

    /// Caption an image already held in memory. `path` is used for messages only.
    pub async fn generate_from_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
        max_tokens: u32,
    ) -> CaptionResult<String> {
        let probed = self.check(&bytes, path).await?;
        self.generate_checked(&bytes, &probed, path, max_tokens).await
    }

    /// Caption bytes that already passed [`CaptionService::check`].
    pub async fn generate_checked(
        &self,
        bytes: &[u8],
        probed: &ProbedImage,
        path: &Path,
        max_tokens: u32,
    ) -> CaptionResult<String> {
        let image = ImageInput::from_bytes(bytes, media_type(probed.format));
        let request = CaptionRequest::new(image, max_tokens);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CaptionError::Inference {
                message: "caption worker pool is closed".to_string(),
                status_code: None,
            })?;

        self.generate_with_retry(&request, path).await
    }

    async fn generate_with_retry(
        &self,
        request: &CaptionRequest,
        path: &Path,
    ) -> CaptionResult<String> {
        let mut last_error = None;

        for attempt in 0..=self.options.retry_attempts {
            if attempt > 0 {
                let delay = retry::backoff_duration(attempt - 1, self.options.retry_delay_ms);
                tracing::debug!(
                    "Retry {attempt}/{} for {:?} after {delay:?}",
                    self.options.retry_attempts,
                    path
                );
                tokio::time::sleep(delay).await;
            }

            let outcome = tokio::time::timeout(
                Duration::from_millis(self.options.timeout_ms),
                self.provider.caption(request),
            )
            .await
            .unwrap_or_else(|_| {
                Err(CaptionError::Timeout {
                    stage: "caption".to_string(),
                    timeout_ms: self.options.timeout_ms,
                })
            });

            match outcome {
                Ok(response) => {
                    tracing::info!(
                        provider = self.provider.name(),
                        model = %response.model,
                        latency_ms = response.latency_ms,
                        "Captioned {:?}",
                        path
                    );
                    return Ok(response.text);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        attempt,
                        error = %e,
                        "Caption attempt failed"
                    );
                    let retryable = retry::is_retryable(&e);
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CaptionError::Inference {
            message: "no caption attempts were made".to_string(),
            status_code: None,
        }))
    }
}
