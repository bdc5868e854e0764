use crate::{
    backoff::retry_delay,
    store::{LinkStatus, SnapshotStore},
};
use link::{LineReader, LinkError, LinkFactory, RawRecord};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use telemetry::{ParseError, TelemetrySnapshot};

// Backoff sleeps are chopped into slices this long so a shutdown request is
// observed promptly even mid-backoff.
const STOP_POLL_SLICE: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Consecutive failed open attempts tolerated before giving up.
    pub max_retries: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self { max_retries: 10 }
    }
}

/// Owns the background acquisition thread and its shared state.
pub struct AcquisitionHandle {
    store: Arc<SnapshotStore>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl AcquisitionHandle {
    /// The store the loop publishes into; clone freely across consumers.
    pub fn store(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// Requests a stop and waits for the thread to close the link and exit.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for AcquisitionHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Starts the acquisition loop on a background thread.
///
/// The loop is the sole owner of the link and the sole writer to the store:
/// it opens the link via `factory`, pulls one record per iteration, parses
/// it and publishes valid snapshots. Transient faults stay inside the loop;
/// only an exhausted retry budget surfaces, as [`LinkStatus::Fatal`].
pub fn spawn<F>(factory: F, config: AcquisitionConfig) -> AcquisitionHandle
where
    F: LinkFactory + 'static,
{
    let store = Arc::new(SnapshotStore::new());
    let stop = Arc::new(AtomicBool::new(false));

    let thread = {
        let store = Arc::clone(&store);
        let stop = Arc::clone(&stop);
        thread::spawn(move || run_loop(&factory, &config, &store, &stop))
    };

    AcquisitionHandle {
        store,
        stop,
        thread: Some(thread),
    }
}

fn run_loop(
    factory: &dyn LinkFactory,
    config: &AcquisitionConfig,
    store: &SnapshotStore,
    stop: &AtomicBool,
) {
    let mut reader: Option<Box<dyn LineReader>> = None;
    let mut attempts: u32 = 0;

    while !stop.load(Ordering::Acquire) {
        match reader.as_mut() {
            None => match factory.open() {
                Ok(opened) => {
                    println!("[acquisition] link open");
                    reader = Some(opened);
                    store.set_status(LinkStatus::Streaming);
                }
                Err(err) => {
                    eprintln!("[acquisition] open failed: {err}");
                    if !back_off(config, store, stop, &mut attempts) {
                        return;
                    }
                }
            },
            Some(open_reader) => match open_reader.read_record() {
                Ok(record) => {
                    // Data made it through, so the link is healthy again.
                    attempts = 0;
                    match parse_record(&record) {
                        Ok(snapshot) => store.publish(snapshot),
                        Err(err) => {
                            // Drop the record; the previous snapshot stands.
                            eprintln!("[acquisition] dropping malformed record: {err}");
                        }
                    }
                }
                // A quiet window is not a fault; check the stop flag and
                // read again.
                Err(LinkError::Timeout) => {}
                Err(err) => {
                    eprintln!("[acquisition] link lost: {err}");
                    // Dropping the reader closes the stale handle.
                    reader = None;
                    if !back_off(config, store, stop, &mut attempts) {
                        return;
                    }
                }
            },
        }
    }
    // Falling out of the loop drops the reader, closing the link.
}

/// Books one failed connection attempt, whether the open itself failed or an
/// opened link died mid-stream. Returns `false` once the attempt budget is
/// spent, after marking the store `Fatal`; otherwise waits out the backoff
/// delay and leaves the store in `Reconnecting`.
///
/// The counter is reset by the first successful read, not by a successful
/// open: a link that opens fine but dies on every read is just as dead as
/// one that never opens, and must hit the same budget.
fn back_off(
    config: &AcquisitionConfig,
    store: &SnapshotStore,
    stop: &AtomicBool,
    attempts: &mut u32,
) -> bool {
    *attempts += 1;
    if *attempts > config.max_retries {
        eprintln!(
            "[acquisition] link failed {} times in a row, giving up",
            config.max_retries
        );
        store.set_status(LinkStatus::Fatal);
        return false;
    }
    let delay = retry_delay(*attempts);
    eprintln!(
        "[acquisition] retry {attempts}/{} in {delay:?}",
        config.max_retries
    );
    store.set_status(LinkStatus::Reconnecting);
    sleep_unless_stopped(stop, delay);
    true
}

fn parse_record(record: &RawRecord) -> Result<TelemetrySnapshot, ParseError> {
    match record {
        RawRecord::Line(line) => telemetry::parse_line(line),
        RawRecord::Block(block) => telemetry::parse_block(block),
    }
}

fn sleep_unless_stopped(stop: &AtomicBool, delay: Duration) {
    let deadline = Instant::now() + delay;
    while !stop.load(Ordering::Acquire) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(STOP_POLL_SLICE));
    }
}
