//! Wire transcript logging.
//! - ProtocolLog::open: append-mode transcript file
//! - ProtocolLog::record: one `<-`/`->` line per payload

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::warn;

pub(super) const INCOMING: &str = "<-";
pub(super) const OUTGOING: &str = "->";

#[derive(Debug)]
pub(super) struct ProtocolLog {
    writer: BufWriter<File>,
}

impl ProtocolLog {
    pub(super) fn open(path: &Path) -> Option<Self> {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(Self {
                writer: BufWriter::new(file),
            }),
            Err(err) => {
                warn!(path = %path.display(), %err, "cannot open protocol log");
                None
            }
        }
    }

    pub(super) fn record(&mut self, direction: &str, payload: &str) -> io::Result<()> {
        writeln!(self.writer, "{direction} {payload}")?;
        self.writer.flush()
    }
}
