//! Streaming collection of entity mentions from a decompressed GKG file.
//!
//! A [`Collector`] is the transient per-file aggregation buffer: four bags
//! of raw occurrences (multiplicity preserved) that the aggregator ranks
//! and persists. Collection is a single pass over the tab-delimited stream;
//! the first row may be a header that rebinds column positions for the rest
//! of the stream (see [`columns::ColumnLayout`]).

pub mod columns;
pub mod reader;

use std::io::BufRead;

use tracing::warn;

use crate::error::NewstrendsError;
use crate::tokenize::split_and_clean;

pub use columns::ColumnLayout;
pub use reader::RecordReader;

/// Per-file aggregation buffer. Lives from stream start until the
/// aggregator consumes it.
#[derive(Debug, Default)]
pub struct Collector {
    pub themes: Vec<String>,
    pub persons: Vec<String>,
    pub orgs: Vec<String>,
    pub document_identifiers: Vec<String>,
    pub rows: usize,
    pub row_errors: usize,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
            && self.persons.is_empty()
            && self.orgs.is_empty()
            && self.document_identifiers.is_empty()
    }

    /// Append another collector's bags, preserving multiplicity. The daily
    /// rollup concatenates all per-slot collectors this way.
    pub fn absorb(&mut self, other: Collector) {
        self.themes.extend(other.themes);
        self.persons.extend(other.persons);
        self.orgs.extend(other.orgs);
        self.document_identifiers.extend(other.document_identifiers);
        self.rows += other.rows;
        self.row_errors += other.row_errors;
    }
}

/// Stream-parse tab-delimited GKG records into a collector.
///
/// Malformed rows are logged with their line number, counted, and skipped;
/// I/O errors fail the whole stream. Out-of-range column indices read as
/// empty fields rather than errors.
pub fn collect_records<R: BufRead>(
    input: R,
    mut layout: ColumnLayout,
) -> Result<Collector, NewstrendsError> {
    let mut lines = RecordReader::new(input);
    let mut collector = Collector::new();
    let mut first_row = true;

    while let Some((line_no, line)) = lines.next_line()? {
        let cells: Vec<&str> = line.split('\t').map(str::trim).collect();

        if first_row {
            first_row = false;
            if layout.apply_header(&cells) {
                continue;
            }
        }

        match collect_row(&cells, &layout, &mut collector) {
            Ok(()) => collector.rows += 1,
            Err(message) => {
                let e = NewstrendsError::Parse {
                    line: line_no,
                    message,
                };
                warn!(error = %e, "skipping malformed GKG row");
                collector.row_errors += 1;
            }
        }
    }

    Ok(collector)
}

fn collect_row(
    cells: &[&str],
    layout: &ColumnLayout,
    collector: &mut Collector,
) -> Result<(), String> {
    // A line without a single tab cannot carry any GKG column.
    if cells.len() < 2 {
        return Err(format!(
            "expected tab-delimited record, got {} field(s)",
            cells.len()
        ));
    }

    let cell = |idx: usize| -> &str { cells.get(idx).copied().unwrap_or("") };

    let themes = cell(layout.themes);
    if !themes.is_empty() {
        collector.themes.extend(split_and_clean(themes));
    }
    let persons = cell(layout.persons);
    if !persons.is_empty() {
        collector.persons.extend(split_and_clean(persons));
    }
    let orgs = cell(layout.orgs);
    if !orgs.is_empty() {
        collector.orgs.extend(split_and_clean(orgs));
    }

    let doc = cell(layout.document_identifier);
    if !doc.is_empty() {
        collector.document_identifiers.extend(
            doc.split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
    }

    Ok(())
}
