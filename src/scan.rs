use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const PROFILE_EXTENSION: &str = "conf";

/// Expand command-line paths into profile files.
///
/// Files are taken as given; a directory contributes its `*.conf` entries,
/// sorted by name, without recursing.
pub fn collect_profiles(paths: &[PathBuf]) -> Vec<Result<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            match list_profiles(path) {
                Ok(found) => out.extend(found.into_iter().map(Ok)),
                Err(e) => out.push(Err(e)),
            }
        } else {
            out.push(Ok(path.clone()));
        }
    }
    out
}

fn list_profiles(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_profile = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PROFILE_EXTENSION));
        if is_profile && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
