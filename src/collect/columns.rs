/// Column positions of the four fields the pipeline consumes, resolved per
/// stream. Defaults are the canonical GKG v2 positions; a header row, when
/// present, overrides them for the rest of that stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub themes: usize,
    pub persons: usize,
    pub orgs: usize,
    pub document_identifier: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            themes: 7,
            persons: 9,
            orgs: 10,
            document_identifier: 4,
        }
    }
}

// Case-insensitive substrings that identify header cells.
const THEMES_MARKER: &str = "v2themes";
const PERSONS_MARKER: &str = "v2persons";
const ORGS_MARKER: &str = "v2organizations";
const DOCID_MARKER: &str = "documentidentifier";

impl ColumnLayout {
    /// Inspect the first row of a stream. If any cell names a known GKG
    /// column, the row is a header: every marker found overwrites the
    /// corresponding index, markers not present leave the configured value,
    /// and the caller must not emit the row as data. Returns whether the
    /// row was a header.
    pub fn apply_header(&mut self, cells: &[&str]) -> bool {
        let lowered: Vec<String> = cells.iter().map(|c| c.to_lowercase()).collect();
        let markers = [THEMES_MARKER, PERSONS_MARKER, ORGS_MARKER, DOCID_MARKER];
        if !lowered
            .iter()
            .any(|cell| markers.iter().any(|m| cell.contains(m)))
        {
            return false;
        }

        let position = |marker: &str| lowered.iter().position(|cell| cell.contains(marker));
        if let Some(i) = position(THEMES_MARKER) {
            self.themes = i;
        }
        if let Some(i) = position(PERSONS_MARKER) {
            self.persons = i;
        }
        if let Some(i) = position(ORGS_MARKER) {
            self.orgs = i;
        }
        if let Some(i) = position(DOCID_MARKER) {
            self.document_identifier = i;
        }
        true
    }
}
