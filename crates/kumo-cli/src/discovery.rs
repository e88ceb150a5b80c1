//! Locating and reading feature documents.

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

use crate::error::CliError;

/// A document read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSource {
    /// Path as found during discovery.
    pub path: Utf8PathBuf,
    /// Document text.
    pub text: String,
}

fn is_feature(path: &Utf8Path) -> bool {
    path.extension() == Some("feature")
}

/// Collect `.feature` files under `paths`.
///
/// Files are taken as given whatever their extension; directories are searched
/// recursively. The result is sorted and free of duplicates so plans compile
/// in the same order on every platform.
///
/// # Errors
///
/// Returns [`CliError::Discovery`] when a path cannot be walked,
/// [`CliError::NonUtf8Path`] for paths that are not UTF-8 and
/// [`CliError::NoFeatures`] when nothing was found.
pub fn find_feature_files(paths: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>, CliError> {
    let mut found = Vec::new();
    for root in paths {
        if root.is_file() {
            found.push(root.clone());
            continue;
        }
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|source| CliError::Discovery {
                path: root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = Utf8PathBuf::from_path_buf(entry.into_path())
                .map_err(|path| CliError::NonUtf8Path(path.display().to_string()))?;
            if is_feature(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    found.dedup();
    if found.is_empty() {
        return Err(CliError::NoFeatures(
            paths.iter().map(ToString::to_string).collect(),
        ));
    }
    log::debug!("found {} feature files", found.len());
    Ok(found)
}

/// Read every document under `paths`.
///
/// # Errors
///
/// Returns any error of [`find_feature_files`] and [`CliError::Io`] when a
/// file cannot be read.
pub fn read_features(paths: &[Utf8PathBuf]) -> Result<Vec<FeatureSource>, CliError> {
    find_feature_files(paths)?
        .into_iter()
        .map(|path| {
            let text = std::fs::read_to_string(&path).map_err(|source| CliError::Io {
                path: path.to_string(),
                source,
            })?;
            Ok(FeatureSource { path, text })
        })
        .collect()
}
