//! Autocaption Core - upload, caption, hashtag and schedule images.
//!
//! Autocaption stores an uploaded image, asks a vision model for a caption,
//! derives hashtags from it and schedules a simulated social post a fixed
//! delay later.
//!
//! # Architecture
//!
//! ```text
//! Upload → Validate → Store → Caption (worker pool) → Hashtags → Schedule → Post
//! ```
//!
//! Scheduled posts are held by a single background task and are not
//! persisted.
//!
//! # Usage
//!
//! ```rust,ignore
//! use autocaption_core::{Autocaption, CaptionLength, Config};
//!
//! #[tokio::main]
//! async fn main() -> autocaption_core::Result<()> {
//!     let config = Config::load()?;
//!     let app = Autocaption::from_config(config).await?;
//!
//!     let length = CaptionLength::parse(None, &app.config().caption)?;
//!     let output = app.caption_file("./cat.jpg".as_ref(), length).await?;
//!     println!("{}", output.caption);
//!     Ok(())
//! }
//! ```

pub mod caption;
pub mod config;
pub mod error;
pub mod hashtags;
pub mod jobs;
pub mod llm;
pub mod notifier;
pub mod pipeline;
pub mod store;
pub mod types;

pub use caption::{CaptionOptions, CaptionService};
pub use config::Config;
pub use error::{AutocaptionError, CaptionError, CaptionResult, ConfigError, Result, ScheduleError};
pub use hashtags::{compose_post, HashtagExtractor};
pub use jobs::{CaptionJobs, JobRecord, JobStatus};
pub use llm::{CaptionProvider, ProviderFactory};
pub use notifier::{ConsolePublisher, Notifier, Publisher, ScheduledPost};
pub use pipeline::ProbedImage;
pub use store::ImageStore;
pub use types::{CaptionLength, CaptionOutput, Post, PostResult, StoredImage, Upload};

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// An upload accepted for background captioning.
#[derive(Debug, Clone)]
pub struct QueuedUpload {
    pub job_id: Uuid,
    pub image: StoredImage,
}

/// Autocaption service - the main entry point.
///
/// Cheap to clone; every clone shares the same store, worker pool, job
/// registry and scheduler.
#[derive(Clone)]
pub struct Autocaption {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    store: ImageStore,
    captioner: CaptionService,
    hashtags: HashtagExtractor,
    notifier: Notifier,
    jobs: CaptionJobs,
}

impl Autocaption {
    /// Create a service around an explicit provider and publisher.
    ///
    /// Opens the upload directory and starts the post scheduler, so this must
    /// run inside a tokio runtime.
    pub async fn new(
        config: Config,
        provider: Arc<dyn CaptionProvider>,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Self> {
        tracing::debug!("Initializing Autocaption v{}", VERSION);

        let store = ImageStore::open(config.upload_dir()).await?;
        let captioner = CaptionService::new(provider, &config);
        let hashtags = HashtagExtractor::new(config.hashtags.max_tags);
        let (notifier, _) = Notifier::spawn(&config.notifier, publisher);
        let jobs = CaptionJobs::new(config.jobs.max_records);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                store,
                captioner,
                hashtags,
                notifier,
                jobs,
            }),
        })
    }

    /// Create a service using the configured provider and the console publisher.
    pub async fn from_config(config: Config) -> Result<Self> {
        let provider = ProviderFactory::create(&config.caption.provider, &config.llm, None)?;
        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            "Caption provider ready"
        );
        Self::new(config, provider, Arc::new(ConsolePublisher::stdout())).await
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn store(&self) -> &ImageStore {
        &self.inner.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    pub fn captioner(&self) -> &CaptionService {
        &self.inner.captioner
    }

    /// Store an upload, caption it, derive hashtags and schedule the post.
    ///
    /// The caller waits for the caption; the post itself fires later.
    pub async fn caption_upload(&self, upload: Upload) -> Result<PostResult> {
        let (image, probed) = self.accept(&upload).await?;
        self.inner
            .caption_stored(image, &upload.bytes, &probed, upload.length)
            .await
    }

    /// Store an upload and caption it in the background.
    ///
    /// Returns as soon as the file is stored; progress is reported through
    /// [`Autocaption::job`].
    pub async fn enqueue_upload(&self, upload: Upload) -> Result<QueuedUpload> {
        let (image, probed) = self.accept(&upload).await?;
        let Upload { bytes, length, .. } = upload;
        let job_id = self
            .inner
            .jobs
            .create(&image.file_name, &image.url(), length.get())
            .await;

        let inner = self.inner.clone();
        let stored = image.clone();
        tokio::spawn(async move {
            inner.jobs.update(job_id, JobStatus::Running).await;
            let status = match inner.caption_stored(stored, &bytes, &probed, length).await {
                Ok(result) => JobStatus::Completed {
                    caption: result.caption,
                    hashtags: result.hashtags,
                    scheduled_at: result.scheduled_at,
                },
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "Caption job failed");
                    JobStatus::failed(&e)
                }
            };
            inner.jobs.update(job_id, status).await;
        });

        Ok(QueuedUpload { job_id, image })
    }

    /// Look up a background caption job.
    pub async fn job(&self, id: Uuid) -> Option<JobRecord> {
        self.inner.jobs.get(id).await
    }

    /// Caption a local file without storing it or scheduling a post.
    pub async fn caption_file(&self, path: &Path, length: CaptionLength) -> CaptionResult<CaptionOutput> {
        let caption = self.inner.captioner.generate(path, length.get()).await?;
        let hashtags = self.inner.hashtags.extract(&caption);
        Ok(CaptionOutput {
            file_path: path.to_path_buf(),
            caption,
            hashtags,
        })
    }

    /// Reject anything that is not a supported image, then write it to the store.
    async fn accept(&self, upload: &Upload) -> CaptionResult<(StoredImage, ProbedImage)> {
        let probed = self
            .inner
            .captioner
            .check(&upload.bytes, Path::new(&upload.file_name))
            .await?;
        let image = self.inner.store.save(&upload.file_name, &upload.bytes).await?;
        Ok((image, probed))
    }
}

impl Inner {
    /// Caption an accepted upload from its in-memory bytes and schedule the post.
    async fn caption_stored(
        &self,
        image: StoredImage,
        bytes: &[u8],
        probed: &ProbedImage,
        length: CaptionLength,
    ) -> Result<PostResult> {
        let start = std::time::Instant::now();

        let caption = self
            .captioner
            .generate_checked(bytes, probed, &image.path, length.get())
            .await?;
        tracing::trace!("  Caption: {:?}", start.elapsed());

        let hashtags = self.hashtags.extract(&caption);
        let scheduled = self
            .notifier
            .schedule(compose_post(&caption, &hashtags), image.path.clone())?;

        tracing::debug!(
            "Captioned {} in {:?}, post due at {}",
            image.file_name,
            start.elapsed(),
            scheduled.due_at
        );

        Ok(PostResult {
            image,
            caption,
            hashtags,
            scheduled_at: scheduled.due_at,
        })
    }
}
