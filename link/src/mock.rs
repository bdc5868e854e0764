//! Scripted in-memory link for exercising the acquisition loop without
//! hardware.

use crate::{LineReader, LinkError, LinkFactory, RawRecord};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

/// One scripted step of a [`MockLink`].
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Yield a text record.
    Line(&'static str),
    /// Yield a binary record.
    Block(Vec<u8>),
    /// Report a quiet read window.
    Timeout,
    /// Fail the stream mid-read.
    Closed,
    /// Fail the next `open` attempt.
    FailOpen,
}

/// A [`LinkFactory`] that replays a script of records and faults.
///
/// The script is shared between the factory and every reader it opens, so a
/// `Closed` step followed by more records models a link that drops and then
/// comes back. Once the script runs dry the reader reports timeouts.
#[derive(Clone)]
pub struct MockLink {
    script: Arc<Mutex<VecDeque<MockStep>>>,
    opens: Arc<AtomicUsize>,
}

impl MockLink {
    pub fn new(steps: impl IntoIterator<Item = MockStep>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times `open` has been called, successfully or not.
    pub fn open_attempts(&self) -> usize {
        self.opens.load(Ordering::Acquire)
    }
}

impl LinkFactory for MockLink {
    fn open(&self) -> Result<Box<dyn LineReader>, LinkError> {
        self.opens.fetch_add(1, Ordering::AcqRel);

        let mut script = self.script.lock().expect("script lock poisoned");
        if let Some(MockStep::FailOpen) = script.front() {
            script.pop_front();
            return Err(LinkError::Unavailable("scripted open failure".to_string()));
        }

        Ok(Box::new(MockReader {
            script: Arc::clone(&self.script),
        }))
    }
}

struct MockReader {
    script: Arc<Mutex<VecDeque<MockStep>>>,
}

impl LineReader for MockReader {
    fn read_record(&mut self) -> Result<RawRecord, LinkError> {
        let step = self.script.lock().expect("script lock poisoned").pop_front();
        match step {
            Some(MockStep::Line(line)) => Ok(RawRecord::Line(line.to_string())),
            Some(MockStep::Block(block)) => Ok(RawRecord::Block(block)),
            Some(MockStep::Timeout) | None => {
                // A real read window takes time; a dry script must not spin.
                thread::sleep(Duration::from_millis(5));
                Err(LinkError::Timeout)
            }
            Some(MockStep::Closed) => Err(LinkError::Closed),
            // An open failure scripted mid-stream reads as a lost link.
            Some(MockStep::FailOpen) => Err(LinkError::Closed),
        }
    }
}
