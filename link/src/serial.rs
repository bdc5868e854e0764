use crate::{LineReader, LinkError, LinkFactory, RawRecord};
use serialport::SerialPort;
use std::{io::Read, time::Duration};

/// Serial link settings: device path, baud rate and read timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialConfig {
    pub path: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            read_timeout: Duration::from_secs(1),
        }
    }
}

impl LinkFactory for SerialConfig {
    fn open(&self) -> Result<Box<dyn LineReader>, LinkError> {
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(self.read_timeout)
            .open()
            .map_err(|err| LinkError::Unavailable(err.to_string()))?;

        Ok(Box::new(SerialLineReader {
            port,
            pending: Vec::new(),
        }))
    }
}

/// Reads newline-terminated telemetry lines off a serial port.
///
/// Bytes that arrive after the last complete line stay in `pending` and are
/// prepended to the next call, so a line split across read windows is never
/// lost.
pub struct SerialLineReader {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl LineReader for SerialLineReader {
    fn read_record(&mut self) -> Result<RawRecord, LinkError> {
        loop {
            if let Some(line) = take_line(&mut self.pending) {
                if line.is_empty() {
                    // Keep-alive blank line, nothing to parse.
                    continue;
                }
                return Ok(RawRecord::Line(line));
            }

            let mut buf = [0u8; 256];
            match self.port.read(&mut buf) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Splits the first complete `\n`-terminated line off `pending`, stripping
/// the terminator and any trailing `\r`.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let pos = pending.iter().position(|&b| b == b'\n')?;
    let raw: Vec<u8> = pending.drain(..=pos).collect();
    let text = String::from_utf8_lossy(&raw);
    Some(text.trim_end_matches(['\r', '\n']).to_string())
}
