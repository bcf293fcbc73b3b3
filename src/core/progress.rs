// ─── Progress ───
// Status sink shared by every stage of a launch session, and the observers
// the gateway drives while transfers are in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

/// Minimum spacing between two intermediate status publications.
const MIN_PUBLISH_INTERVAL: Duration = Duration::from_millis(100);

/// Single "current status" line for a launch session.
///
/// Backed by a `watch` channel: publishing never blocks and readers always
/// see the latest value.
#[derive(Clone)]
pub struct StatusSink {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl StatusSink {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, text: impl Into<String>) {
        let text = text.into();
        debug!(status = %text, "status");
        self.tx.send_replace(Some(text));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

impl Default for StatusSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Callbacks the gateway invokes while a transfer runs.
pub trait TransferObserver: Send + Sync {
    /// One item of a batched download finished successfully.
    fn item_completed(&self) {}

    /// Byte progress of a single large transfer.
    fn bytes_transferred(&self, _downloaded: u64, _total: u64) {}
}

/// Observer that ignores every event.
pub struct Silent;

impl TransferObserver for Silent {}

/// Keeps published values monotonic and rate-bounded.
struct Throttle {
    state: Mutex<(u64, Option<Instant>)>,
}

impl Throttle {
    fn new() -> Self {
        Self {
            state: Mutex::new((0, None)),
        }
    }

    fn publish(&self, value: u64, force: bool, status: &StatusSink, render: impl FnOnce() -> String) {
        let mut state = self.state.lock();
        let (last_value, last_at) = *state;

        if last_at.is_some() && value <= last_value {
            return;
        }
        if !force && last_at.is_some_and(|at| at.elapsed() < MIN_PUBLISH_INTERVAL) {
            return;
        }

        status.set(render());
        *state = (value, Some(Instant::now()));
    }
}

fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    100.0 * done as f64 / total as f64
}

/// Counts completed items of one batched request.
pub struct BatchProgress {
    label: &'static str,
    total: u64,
    completed: AtomicU64,
    status: StatusSink,
    throttle: Throttle,
}

impl BatchProgress {
    pub fn new(label: &'static str, total: usize, status: StatusSink) -> Self {
        Self {
            label,
            total: total as u64,
            completed: AtomicU64::new(0),
            status,
            throttle: Throttle::new(),
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire).min(self.total)
    }
}

impl TransferObserver for BatchProgress {
    fn item_completed(&self) {
        let done = (self.completed.fetch_add(1, Ordering::AcqRel) + 1).min(self.total);
        let total = self.total;
        let label = self.label;

        self.throttle
            .publish(done, done == total, &self.status, || {
                format!("{}: {} ({:.1}%)", label, done, percent(done, total))
            });
    }
}

/// Byte progress of a single large download, rendered in megabytes.
pub struct ByteProgress {
    label: &'static str,
    downloaded: AtomicU64,
    status: StatusSink,
    throttle: Throttle,
}

impl ByteProgress {
    pub fn new(label: &'static str, status: StatusSink) -> Self {
        Self {
            label,
            downloaded: AtomicU64::new(0),
            status,
            throttle: Throttle::new(),
        }
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::Acquire)
    }
}

impl TransferObserver for ByteProgress {
    fn bytes_transferred(&self, downloaded: u64, total: u64) {
        let previous = self.downloaded.fetch_max(downloaded, Ordering::AcqRel);
        let downloaded = previous.max(downloaded);
        let label = self.label;
        let finished = total > 0 && downloaded >= total;

        self.throttle.publish(downloaded, finished, &self.status, || {
            format!(
                "{}: {:.2}Mb ({}%)",
                label,
                downloaded as f64 / 1024.0 / 1024.0,
                percent(downloaded, total).ceil() as u64
            )
        });
    }
}
