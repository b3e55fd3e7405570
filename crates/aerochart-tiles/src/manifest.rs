//! Per-chart list of generated tile files.
//!
//! Every tile the generator writes is appended to
//! `<base>/<Chart_Name>.filelist.txt` (name without revision) so all of a
//! chart's generated files can be removed when a new revision replaces it.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::Result;

/// Location of a chart's manifest.
pub fn manifest_path(base: &Path, name_stem: &str) -> PathBuf {
    base.join(format!("{name_stem}.filelist.txt"))
}

/// Appends one base-relative tile path to the chart's manifest.
pub fn append(base: &Path, name_stem: &str, relative: &str) -> Result<()> {
    fs::create_dir_all(base)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(manifest_path(base, name_stem))?;
    writeln!(file, "{relative}")?;
    Ok(())
}

/// Base-relative paths listed in the chart's manifest; empty when there is
/// no manifest.
pub fn entries(base: &Path, name_stem: &str) -> Result<Vec<String>> {
    match fs::read_to_string(manifest_path(base, name_stem)) {
        Ok(text) => Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Deletes every file listed in the chart's manifest, then the manifest.
///
/// Files already gone are ignored. Returns the number of files removed.
pub fn purge(base: &Path, name_stem: &str) -> Result<usize> {
    let mut removed = 0;
    for relative in entries(base, name_stem)? {
        let path = relative
            .split('/')
            .fold(base.to_path_buf(), |path, part| path.join(part));
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "listed tile already gone");
            }
            Err(e) => return Err(e.into()),
        }
    }
    match fs::remove_file(manifest_path(base, name_stem)) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    info!(chart = name_stem, removed, "purged generated tiles");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_purge() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        let tile = base.join("Test_Box_1").join("S2").join("0");
        fs::create_dir_all(&tile).unwrap();
        fs::write(tile.join("0.png"), b"png").unwrap();
        fs::write(tile.join("1.png"), b"png").unwrap();

        append(base, "Test_Box", "Test_Box_1/S2/0/0.png").unwrap();
        append(base, "Test_Box", "Test_Box_1/S2/0/1.png").unwrap();
        append(base, "Test_Box", "Test_Box_1/S2/0/9.png").unwrap();
        assert_eq!(entries(base, "Test_Box").unwrap().len(), 3);

        assert_eq!(purge(base, "Test_Box").unwrap(), 2);
        assert!(!tile.join("0.png").exists());
        assert!(!tile.join("1.png").exists());
        assert!(!manifest_path(base, "Test_Box").exists());
    }

    #[test]
    fn test_purge_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(purge(dir.path(), "Nothing").unwrap(), 0);
        assert!(entries(dir.path(), "Nothing").unwrap().is_empty());
    }
}
