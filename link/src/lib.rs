pub mod mock;
mod poll_log;
mod serial;
mod spi;

pub use poll_log::PollLog;
pub use serial::{SerialConfig, SerialLineReader};
pub use spi::{POLL_COMMAND, SpiConfig, SpiLineReader};

use std::{error, fmt, io};

/// One framed unit of data pulled off a link: a delimited text line for the
/// serial transport, a fixed-size byte block for SPI.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Line(String),
    Block(Vec<u8>),
}

#[derive(Debug)]
pub enum LinkError {
    /// The device could not be opened. Retryable.
    Unavailable(String),
    /// No data arrived within the configured window. Not a fault.
    Timeout,
    /// The channel was closed from the other side.
    Closed,
    /// Mid-stream I/O failure.
    Io(io::Error),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Unavailable(reason) => write!(f, "device unavailable: {reason}"),
            LinkError::Timeout => write!(f, "no data within the read window"),
            LinkError::Closed => write!(f, "link closed"),
            LinkError::Io(err) => write!(f, "link I/O error: {err}"),
        }
    }
}

impl error::Error for LinkError {}

impl From<io::Error> for LinkError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => LinkError::Timeout,
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected => LinkError::Closed,
            _ => LinkError::Io(err),
        }
    }
}

/// A transport that yields one framed record per call.
///
/// `read_record` blocks with a bounded timeout; a quiet link surfaces as
/// [`LinkError::Timeout`], which callers treat as "poll again", not a fault.
/// The link is closed by dropping the reader.
pub trait LineReader: Send {
    fn read_record(&mut self) -> Result<RawRecord, LinkError>;
}

/// Opens a fresh reader over the configured link.
///
/// Implemented by the transport configs so the acquisition loop can reopen
/// the same link after a mid-stream failure.
pub trait LinkFactory: Send {
    fn open(&self) -> Result<Box<dyn LineReader>, LinkError>;
}
