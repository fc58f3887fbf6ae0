//! Append-only decision recording
//!
//! One immutable record per evaluated event, written in settlement order.
//! Write failures are surfaced to the caller; a record that was not
//! durably appended must never be silently dropped.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::BetRecord;
use crate::error::Result;

/// Sink for evaluated-event records
pub trait DecisionRecorder {
    fn record(&mut self, record: &BetRecord) -> Result<()>;
}

/// In-memory recorder, exported at the end of a run
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    records: Vec<BetRecord>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[BetRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BetRecord> {
        self.records
    }
}

impl DecisionRecorder for MemoryRecorder {
    fn record(&mut self, record: &BetRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// File-backed recorder writing one JSON object per line
pub struct JsonlRecorder {
    writer: BufWriter<std::fs::File>,
    path: PathBuf,
}

impl JsonlRecorder {
    /// Open (or create) the file for appending
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back from a JSONL file
    pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<BetRecord>> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl DecisionRecorder for JsonlRecorder {
    fn record(&mut self, record: &BetRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{json}")?;
        // Flush per record so a crash between events loses nothing already
        // handed to the recorder.
        self.writer.flush()?;
        Ok(())
    }
}
