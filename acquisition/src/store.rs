use arc_swap::ArcSwapOption;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};
use telemetry::TelemetrySnapshot;

/// Where the acquisition loop currently stands; the consumer's error-display
/// input. `Fatal` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// First open in progress, nothing published yet.
    Connecting,
    /// Records are flowing.
    Streaming,
    /// The link dropped; reopen attempts are running.
    Reconnecting,
    /// The retry budget is spent; the loop has stopped.
    Fatal,
}

impl LinkStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LinkStatus::Connecting,
            1 => LinkStatus::Streaming,
            2 => LinkStatus::Reconnecting,
            _ => LinkStatus::Fatal,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Connecting => write!(f, "connecting"),
            LinkStatus::Streaming => write!(f, "streaming"),
            LinkStatus::Reconnecting => write!(f, "reconnecting"),
            LinkStatus::Fatal => write!(f, "fatal"),
        }
    }
}

/// Holds the most recent complete snapshot for any number of polling readers.
///
/// One writer (the acquisition loop) swaps in whole `Arc`s; readers grab the
/// current pointer without locking, so a reader either sees the previous
/// snapshot or the new one in full — never a mix of fields.
pub struct SnapshotStore {
    latest: ArcSwapOption<TelemetrySnapshot>,
    status: AtomicU8,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            latest: ArcSwapOption::empty(),
            status: AtomicU8::new(LinkStatus::Connecting as u8),
        }
    }

    /// Atomically replaces the current snapshot.
    pub fn publish(&self, snapshot: TelemetrySnapshot) {
        self.latest.store(Some(Arc::new(snapshot)));
    }

    /// The latest published snapshot, or `None` before the first valid
    /// record arrived.
    pub fn current(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.latest.load_full()
    }

    pub fn status(&self) -> LinkStatus {
        LinkStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: LinkStatus) {
        self.status.store(status as u8, Ordering::Release);
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
