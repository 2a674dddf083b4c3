//! JSONL writer for per-minute averages - one `{"date", "average_delivery_time"}` object per line

use super::results::{MinuteAverage, MinuteAverages};
use super::writer_backend::WriterError;
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

pub struct ResultWriter<W: Write> {
    out: BufWriter<W>,
    rows_written: usize,
}

impl ResultWriter<File> {
    /// Create (or truncate) the result file, creating parent directories.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, WriterError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        log::info!("📝 Writing results to: {}", path.display());
        Ok(Self::new(file))
    }
}

impl ResultWriter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            out: BufWriter::new(inner),
            rows_written: 0,
        }
    }

    pub fn write_row(&mut self, row: &MinuteAverage) -> Result<(), WriterError> {
        let json = serde_json::to_string(row)?;
        writeln!(self.out, "{}", json)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write every row in ascending minute order, then flush.
    pub fn write_all(&mut self, results: &MinuteAverages) -> Result<usize, WriterError> {
        for row in results.rows() {
            self.write_row(&row)?;
        }
        self.flush()?;
        Ok(results.len())
    }

    pub fn flush(&mut self) -> Result<(), WriterError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, WriterError> {
        self.out
            .into_inner()
            .map_err(|e| WriterError::Io(e.into_error()))
    }
}
