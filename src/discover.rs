use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{PapertrailError, Result};
use crate::fragment::{self, Fragment, RawFragment};
use crate::manifest::Manifest;
use crate::version::Version;

/// List fragment files under `dir`, sorted lexicographically.
///
/// Only `.yml`/`.yaml` files count (extension compared case-insensitively);
/// any directory literally named `archived` below the root is skipped
/// entirely.
pub fn list_fragment_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        !(entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == "archived")
    });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| PapertrailError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_fragment = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                ext == "yml" || ext == "yaml"
            })
            .unwrap_or(false);
        if is_fragment {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Read, parse, and validate one fragment file, wrapping any failure with
/// the originating path.
pub fn load_fragment(path: &Path, manifest: &Manifest) -> Result<Fragment> {
    read_fragment(path, manifest).map_err(|err| {
        PapertrailError::fragment(format!("{}: {}", path.display(), bare_message(&err)))
    })
}

/// Load every fragment file, failing fast on the first invalid one.
pub fn load_fragments(files: &[PathBuf], manifest: &Manifest) -> Result<Vec<Fragment>> {
    files
        .iter()
        .map(|path| load_fragment(path, manifest))
        .collect()
}

/// Pre-flight check over an entire fragment batch.
///
/// Collects all per-file errors rather than stopping at the first, then
/// reports them sorted lexicographically by rendered message so the output
/// is deterministic.
pub fn check_fragments(files: &[PathBuf], manifest: &Manifest) -> Result<()> {
    let mut errors = Vec::new();
    for path in files {
        if let Err(err) = read_fragment(path, manifest) {
            errors.push(format!("{}: {}", path.display(), bare_message(&err)));
        }
    }
    if errors.is_empty() {
        return Ok(());
    }
    errors.sort();
    Err(PapertrailError::fragment(errors.join("\n")))
}

/// Move consumed fragment files into `<archive_dir>/<version>/`, keeping
/// their original file names.
pub fn archive_fragments(files: &[PathBuf], archive_dir: &Path, version: &Version) -> Result<()> {
    let target = archive_dir.join(version.to_string());
    fs::create_dir_all(&target)?;
    for path in files {
        let name = path.file_name().ok_or_else(|| {
            PapertrailError::fragment(format!("{}: not a file path", path.display()))
        })?;
        fs::rename(path, target.join(name))?;
    }
    Ok(())
}

fn read_fragment(path: &Path, manifest: &Manifest) -> Result<Fragment> {
    let contents = fs::read_to_string(path)?;
    let raw: RawFragment = serde_yaml::from_str(&contents)
        .map_err(|e| PapertrailError::fragment(format!("invalid YAML: {}", e)))?;
    let source_id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    fragment::validate(raw, &source_id, manifest)
}

/// Message text without the enum prefix, for path-prefixed reporting.
fn bare_message(err: &PapertrailError) -> String {
    match err {
        PapertrailError::Fragment(msg) => msg.clone(),
        other => other.to_string(),
    }
}
