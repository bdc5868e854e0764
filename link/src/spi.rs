use crate::{LineReader, LinkError, LinkFactory, PollLog, RawRecord};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};
use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use telemetry::BLOCK_LEN;

/// Fixed poll command the controller answers with one telemetry block.
pub const POLL_COMMAND: [u8; 3] = [0x01, 0x00, 0x00];

/// SPI link settings: device node, clock, word size, poll pacing and the
/// optional diagnostics log.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiConfig {
    pub path: String,
    pub clock_hz: u32,
    pub bits_per_word: u8,
    /// Minimum spacing between consecutive polls.
    pub poll_interval: Duration,
    /// Append one timestamped line per poll response when set.
    pub log_path: Option<PathBuf>,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            path: "/dev/spidev0.0".to_string(),
            clock_hz: 1_000_000,
            bits_per_word: 8,
            poll_interval: Duration::from_secs(1),
            log_path: None,
        }
    }
}

impl LinkFactory for SpiConfig {
    fn open(&self) -> Result<Box<dyn LineReader>, LinkError> {
        let mut dev =
            Spidev::open(&self.path).map_err(|err| LinkError::Unavailable(err.to_string()))?;

        let options = SpidevOptions::new()
            .bits_per_word(self.bits_per_word)
            .max_speed_hz(self.clock_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&options)
            .map_err(|err| LinkError::Unavailable(err.to_string()))?;

        let log = match &self.log_path {
            Some(path) => {
                Some(PollLog::open(path).map_err(|err| LinkError::Unavailable(err.to_string()))?)
            }
            None => None,
        };

        Ok(Box::new(SpiLineReader {
            dev,
            log,
            poll_interval: self.poll_interval,
            last_poll: None,
            log_failed: false,
        }))
    }
}

/// Polls the controller over SPI, one fixed-size block per record.
pub struct SpiLineReader {
    dev: Spidev,
    log: Option<PollLog>,
    poll_interval: Duration,
    last_poll: Option<Instant>,
    log_failed: bool,
}

impl LineReader for SpiLineReader {
    fn read_record(&mut self) -> Result<RawRecord, LinkError> {
        if let Some(last) = self.last_poll {
            let elapsed = last.elapsed();
            if elapsed < self.poll_interval {
                thread::sleep(self.poll_interval - elapsed);
            }
        }
        self.last_poll = Some(Instant::now());

        let mut tx = [0u8; BLOCK_LEN];
        tx[..POLL_COMMAND.len()].copy_from_slice(&POLL_COMMAND);
        let mut rx = [0u8; BLOCK_LEN];

        let mut transfer = SpidevTransfer::read_write(&tx, &mut rx);
        self.dev.transfer(&mut transfer)?;

        if !self.log_failed
            && let Some(log) = &mut self.log
            && let Err(err) = log.append(&rx)
        {
            // Diagnostics only; never take the link down over it.
            eprintln!("[link] poll log write failed, disabling: {err}");
            self.log_failed = true;
        }

        Ok(RawRecord::Block(rx.to_vec()))
    }
}
