use std::io::BufRead;

use crate::error::NewstrendsError;

/// Buffered line reader for GKG tab-delimited files.
///
/// Lends `(line_number, line)` pairs out of an internal buffer so a whole
/// file never needs to allocate per record. Blank lines are skipped; line
/// numbers are 1-based and count every physical line.
pub struct RecordReader<R: BufRead> {
    inner: R,
    buf: String,
    line_number: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: reader,
            buf: String::with_capacity(8192),
            line_number: 0,
        }
    }

    /// Next non-blank line, or `None` at end of stream. I/O errors fail the
    /// whole stream; there is no per-line recovery below this layer.
    pub fn next_line(&mut self) -> Result<Option<(usize, &str)>, NewstrendsError> {
        loop {
            self.buf.clear();
            if self.inner.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let end = self.buf.trim_end_matches(['\n', '\r']).len();
            if end > 0 {
                let line_number = self.line_number;
                return Ok(Some((line_number, &self.buf[..end])));
            }
        }
    }
}
