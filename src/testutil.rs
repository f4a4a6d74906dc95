//! Shared fixtures for the test suite: an in-memory artifact source and
//! builders for GKG-shaped record files.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use zip::write::SimpleFileOptions;

use crate::error::NewstrendsError;
use crate::fetch::GkgSource;

/// Artifact source keyed by full URL; unknown URLs fail like a 404.
#[derive(Default)]
pub struct FixtureSource {
    artifacts: HashMap<String, Vec<u8>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.artifacts.insert(url.into(), bytes);
    }
}

#[async_trait]
impl GkgSource for FixtureSource {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        _timeout: Duration,
    ) -> Result<(), NewstrendsError> {
        match self.artifacts.get(url) {
            Some(bytes) => {
                std::fs::write(dest, bytes)?;
                Ok(())
            }
            None => Err(NewstrendsError::Other(format!("404 Not Found: {url}"))),
        }
    }
}

/// Zip a record file the way GDELT publishes one: a single `.csv` entry.
pub fn gkg_zip(csv: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("records.gkg.csv", SimpleFileOptions::default())
        .expect("write zip entry");
    writer.write_all(csv.as_bytes()).expect("write zip body");
    writer.finish().expect("finish zip").into_inner()
}

/// A tab-delimited GKG data row with the canonical column layout
/// (documentIdentifier=4, themes=7, persons=9, orgs=10).
pub fn gkg_row(doc: &str, themes: &str, persons: &str, orgs: &str) -> String {
    let mut cells = vec![""; 11];
    cells[0] = "20240501081500-T1";
    cells[4] = doc;
    cells[7] = themes;
    cells[9] = persons;
    cells[10] = orgs;
    cells.join("\t")
}
