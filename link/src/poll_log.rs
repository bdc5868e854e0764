use chrono::Local;
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
};

/// Append-only diagnostics log: one line per poll, wall-clock timestamp
/// followed by the raw response bytes in hex.
pub struct PollLog {
    file: File,
}

impl PollLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    pub fn append(&mut self, response: &[u8]) -> io::Result<()> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let hex = response
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(self.file, "{stamp}: {hex}")
    }
}
