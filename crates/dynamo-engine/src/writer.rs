//! Append-only diagnostic log.
//!
//! One line per completed cycle: the cycle time followed by every record
//! component in schema order, space-separated. Numbers use the shortest
//! representation that reads back to the same `f64`. An optional header
//! line starts with `% ` so plotting tools treat it as a comment.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use dynamo_diag::DiagnosticSchema;

/// Writes diagnostic lines to any `Write` sink.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and runs can use
/// a file opened with [`DiagnosticLog::append`]. Each line is flushed
/// as soon as it is written, so a crash loses at most the current cycle.
///
/// # Examples
///
/// ```
/// use dynamo_diag::DiagnosticSchema;
/// use dynamo_engine::DiagnosticLog;
///
/// let schema = DiagnosticSchema::builder().scalar("count").slot("ke_split", 2).build().unwrap();
/// let mut log = DiagnosticLog::with_header(Vec::new(), &schema).unwrap();
/// log.append_line(0.5, &[10.0, 1.25, 3.0]).unwrap();
/// assert_eq!(log.lines_written(), 1);
/// let text = String::from_utf8(log.into_inner()).unwrap();
/// assert_eq!(text, "% t count ke_split[0] ke_split[1]\n0.5 10 1.25 3\n");
/// ```
pub struct DiagnosticLog<W: Write> {
    writer: W,
    lines_written: u64,
}

impl<W: Write> DiagnosticLog<W> {
    /// Wrap `writer` without writing anything.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    /// Wrap `writer` and immediately write the column header.
    pub fn with_header(writer: W, schema: &DiagnosticSchema) -> io::Result<Self> {
        let mut log = Self::new(writer);
        log.write_header(schema)?;
        Ok(log)
    }

    /// Write the `% t <columns>` header line.
    pub fn write_header(&mut self, schema: &DiagnosticSchema) -> io::Result<()> {
        let mut line = String::from("% t");
        for name in schema.column_names() {
            line.push(' ');
            line.push_str(&name);
        }
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }

    /// Append one cycle: `time` followed by `values`.
    pub fn append_line(&mut self, time: f64, values: &[f64]) -> io::Result<()> {
        let mut line = time.to_string();
        for v in values {
            line.push(' ');
            line.push_str(&v.to_string());
        }
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        self.lines_written += 1;
        Ok(())
    }

    /// Data lines written by this writer (the header is not counted).
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the log and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> DiagnosticLog<W> {
    /// Erase the sink type, keeping the line count.
    pub fn boxed(self) -> DiagnosticLog<Box<dyn Write + Send>> {
        DiagnosticLog {
            writer: Box::new(self.writer),
            lines_written: self.lines_written,
        }
    }
}

impl DiagnosticLog<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed.
    ///
    /// Existing lines are kept; new cycles go after them.
    pub fn append(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Open `path` for appending and write the header only if the file
    /// is empty, so a restarted run does not repeat it.
    pub fn append_with_header(path: impl AsRef<Path>, schema: &DiagnosticSchema) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let empty = file.metadata()?.len() == 0;
        let mut log = Self::new(BufWriter::new(file));
        if empty {
            log.write_header(schema)?;
        }
        Ok(log)
    }
}

impl<W: Write> std::fmt::Debug for DiagnosticLog<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("lines_written", &self.lines_written)
            .finish()
    }
}
