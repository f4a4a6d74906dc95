use std::path::{Path, PathBuf};

use crate::error::NewstrendsError;

/// Extract the single `.csv` entry of a downloaded GKG archive into
/// `output_dir` and return its path. Every GDELT archive contains exactly
/// one record file.
pub fn extract_csv(zip_path: &Path, output_dir: &Path) -> Result<PathBuf, NewstrendsError> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if name.ends_with(".csv") {
            let out_path = output_dir.join(
                Path::new(&name)
                    .file_name()
                    .ok_or_else(|| NewstrendsError::Other(format!("bad entry name: {name}")))?,
            );
            let mut out_file = std::fs::File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out_file)?;
            return Ok(out_path);
        }
    }

    Err(NewstrendsError::Other(
        "no CSV entry found in archive".to_string(),
    ))
}
