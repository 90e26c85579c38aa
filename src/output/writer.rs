use crate::item::Item;
use crate::output::{OutputFormat, OutputResult};
use std::io::Write;

/// Writes items to a byte sink in the chosen format
///
/// Each item is written as soon as it is handed over, so output streams while
/// the walk is still running.
#[derive(Debug)]
pub struct ItemWriter<W: Write> {
    out: W,
    format: OutputFormat,
    written: usize,
}

impl<W: Write> ItemWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            written: 0,
        }
    }

    /// Writes one item followed by a newline
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The item was written
    /// * `Err(OutputError)` - Serialization or the underlying write failed
    pub fn write_item(&mut self, item: &Item) -> OutputResult<()> {
        match self.format {
            OutputFormat::Line => writeln!(self.out, "{}", item.location())?,
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.out, item)?;
                writeln!(self.out)?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Number of items written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> OutputResult<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
