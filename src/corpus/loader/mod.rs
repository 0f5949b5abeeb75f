
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::corpus::Document;

/// A corpus file that could not be ingested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of scanning a corpus directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
}

/// Recursively read every file under `root` whose extension is in `extensions`.
///
/// Files are visited in sorted path order. Unreadable files and files that
/// are not valid UTF-8 are reported in [`LoadReport::failures`] and skipped.
#[inline]
pub fn load_documents(root: &Path, extensions: &[String]) -> LoadReport {
    let mut report = LoadReport::default();

    if !root.exists() {
        warn!(
            "Corpus directory {} does not exist, treating it as empty",
            root.display()
        );
        return report;
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                warn!("Failed to walk {}: {}", path.display(), e);
                report.failures.push(LoadFailure {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_recognized_extension(entry.path(), extensions) {
            continue;
        }

        match fs::read_to_string(entry.path()) {
            Ok(content) => {
                debug!("Loaded {} ({} bytes)", entry.path().display(), content.len());
                report.documents.push(Document {
                    path: entry.path().to_path_buf(),
                    content,
                });
            }
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                report.failures.push(LoadFailure {
                    path: entry.path().to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Loaded {} documents from {} ({} failures)",
        report.documents.len(),
        root.display(),
        report.failures.len()
    );

    report
}

fn has_recognized_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}
