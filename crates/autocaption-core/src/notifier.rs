//! Post scheduler.
//!
//! A single background task owns every pending post. Submissions travel over
//! a bounded channel; the task keeps them in a min-heap ordered by fire time
//! and sleeps until the earliest is due or a new one arrives. Each job fires
//! once and is discarded. Nothing is persisted, so pending posts are lost
//! when the process exits.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::cmp::Reverse;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::NotifierConfig;
use crate::error::ScheduleError;
use crate::types::Post;

/// Receives posts as their jobs fire.
pub trait Publisher: Send + Sync + 'static {
    fn publish(&self, post: &Post);
}

/// Prints each post as a `[POSTED at ...]` block, the only record that a
/// post "happened". Writes to stdout unless built with another writer.
#[derive(Debug)]
pub struct ConsolePublisher<W = io::Stdout> {
    out: Mutex<W>,
}

impl ConsolePublisher {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Default for ConsolePublisher {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> ConsolePublisher<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send + 'static> Publisher for ConsolePublisher<W> {
    fn publish(&self, post: &Post) {
        tracing::info!(
            image = %post.image_path.display(),
            posted_at = %post.posted_at,
            "Post published"
        );
        let block = format_post(post);
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(block.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "Failed to write post");
        }
    }
}

fn format_post(post: &Post) -> String {
    format!(
        "\n[POSTED at {}]\nCaption:\n{}\nImage Path: {}\n",
        post.posted_at.format("%Y-%m-%d %H:%M:%S%.6f"),
        post.caption,
        post.image_path.display()
    )
}

/// Handle returned when a post is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledPost {
    pub id: Uuid,
    pub due_at: DateTime<Local>,
}

/// A pending post inside the scheduler task.
#[derive(Debug)]
struct ScheduledJob {
    id: Uuid,
    caption: String,
    image_path: PathBuf,
    fire_at: Instant,
    seq: u64,
}

impl PartialEq for ScheduledJob {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for ScheduledJob {}

impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledJob {
    // Earlier fire time first; submission order breaks ties.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.fire_at
            .cmp(&other.fire_at)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Cloneable handle to the scheduler task.
///
/// The task stops once every handle is dropped or [`Notifier::shutdown`] is
/// called; posts still pending at that point are discarded.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<ScheduledJob>,
    stop: Arc<Notify>,
    pending: Arc<AtomicUsize>,
    seq: Arc<AtomicU64>,
    delay: Duration,
    queue_capacity: usize,
    max_pending: usize,
}

impl Notifier {
    /// Start the scheduler task and return a handle to it.
    pub fn spawn(config: &NotifierConfig, publisher: Arc<dyn Publisher>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let pending = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(Notify::new());

        let handle = tokio::spawn(run_scheduler(rx, stop.clone(), publisher, pending.clone()));

        let notifier = Self {
            tx,
            stop,
            pending,
            seq: Arc::new(AtomicU64::new(0)),
            delay: Duration::from_secs(config.delay_secs),
            queue_capacity: config.queue_capacity,
            max_pending: config.max_pending,
        };
        (notifier, handle)
    }

    /// Delay applied by [`Notifier::schedule`].
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Posts accepted but not yet fired.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop the scheduler task. Pending posts are dropped.
    pub fn shutdown(&self) {
        self.stop.notify_one();
    }

    /// Schedule a post after the configured delay.
    pub fn schedule(
        &self,
        caption: impl Into<String>,
        image_path: impl Into<PathBuf>,
    ) -> Result<ScheduledPost, ScheduleError> {
        self.schedule_in(caption, image_path, self.delay)
    }

    /// Schedule a post after an explicit delay.
    pub fn schedule_in(
        &self,
        caption: impl Into<String>,
        image_path: impl Into<PathBuf>,
        delay: Duration,
    ) -> Result<ScheduledPost, ScheduleError> {
        let out_of_range = ScheduleError::DelayOutOfRange {
            delay_secs: delay.as_secs(),
        };
        let fire_at = Instant::now()
            .checked_add(delay)
            .ok_or_else(|| out_of_range.clone())?;
        let due_at = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| Local::now().checked_add_signed(d))
            .ok_or(out_of_range)?;

        let max_pending = self.max_pending;
        self.pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max_pending).then_some(n + 1)
            })
            .map_err(|_| ScheduleError::QueueFull {
                capacity: max_pending,
            })?;

        let job = ScheduledJob {
            id: Uuid::new_v4(),
            caption: caption.into(),
            image_path: image_path.into(),
            fire_at,
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
        };
        let scheduled = ScheduledPost { id: job.id, due_at };
        let image = job.image_path.display().to_string();

        if let Err(e) = self.tx.try_send(job) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => ScheduleError::QueueFull {
                    capacity: self.queue_capacity,
                },
                mpsc::error::TrySendError::Closed(_) => ScheduleError::Closed,
            });
        }

        tracing::info!(
            job_id = %scheduled.id,
            image = %image,
            due_at = %scheduled.due_at,
            "Post scheduled"
        );
        Ok(scheduled)
    }
}

async fn run_scheduler(
    mut rx: mpsc::Receiver<ScheduledJob>,
    stop: Arc<Notify>,
    publisher: Arc<dyn Publisher>,
    pending: Arc<AtomicUsize>,
) {
    let mut queue: BinaryHeap<Reverse<ScheduledJob>> = BinaryHeap::new();
    tracing::debug!("Post scheduler started");

    loop {
        let next_due = queue.peek().map(|Reverse(job)| job.fire_at);

        tokio::select! {
            _ = stop.notified() => break,
            received = rx.recv() => match received {
                Some(job) => queue.push(Reverse(job)),
                None => break,
            },
            _ = wait_until(next_due) => {
                let now = Instant::now();
                while queue.peek().is_some_and(|Reverse(job)| job.fire_at <= now) {
                    let Some(Reverse(job)) = queue.pop() else { break };
                    fire(job, publisher.as_ref());
                    pending.fetch_sub(1, Ordering::SeqCst);
                }
            }
        }
    }

    rx.close();
    while let Ok(job) = rx.try_recv() {
        queue.push(Reverse(job));
    }
    if !queue.is_empty() {
        tracing::warn!(dropped = queue.len(), "Post scheduler stopped with posts pending");
        pending.fetch_sub(queue.len(), Ordering::SeqCst);
    }
    tracing::debug!("Post scheduler stopped");
}

fn fire(job: ScheduledJob, publisher: &dyn Publisher) {
    tracing::debug!(job_id = %job.id, "Firing scheduled post");
    let post = Post {
        caption: job.caption,
        image_path: job.image_path,
        posted_at: Local::now(),
    };
    publisher.publish(&post);
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
