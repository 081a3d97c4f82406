use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::warn;

/// A discovered corpus file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the corpus root directory.
    pub relative_path: PathBuf,
    /// The root joined with `relative_path`.
    pub path: PathBuf,
}

/// Recursively walk a directory and discover every file beneath it.
///
/// A missing or unreadable root yields an empty list. Entries that cannot
/// be read are skipped with a warning, so one bad directory never aborts
/// the scan. Files whose relative path matches `exclude` are left out.
/// Results are sorted by relative path.
pub fn discover_files(
    root: &Path,
    exclude: Option<&GlobSet>,
) -> Vec<DiscoveredFile> {
    let mut results = Vec::new();
    if !root.is_dir() {
        return results;
    }

    let canonical_root = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            warn!("cannot resolve corpus root {}: {e}", root.display());
            return results;
        }
    };

    walk_dir(&canonical_root, root, root, exclude, &mut results);
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    results
}

fn walk_dir(
    canonical_root: &Path,
    root: &Path,
    current: &Path,
    exclude: Option<&GlobSet>,
    results: &mut Vec<DiscoveredFile>,
) {
    let entries = match std::fs::read_dir(current) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("skipping unreadable directory {}: {e}", current.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            walk_dir(canonical_root, root, &path, exclude, results);
        } else if file_type.is_symlink() {
            let resolved = match path.canonicalize() {
                Ok(p) => p,
                Err(_) => continue, // Skip broken symlinks
            };
            // Directory links are not followed (cycle prevention).
            if resolved.starts_with(canonical_root) && resolved.is_dir() {
                continue;
            }
            if resolved.is_file() {
                push_file(root, &path, exclude, results);
            }
        } else if file_type.is_file() {
            push_file(root, &path, exclude, results);
        }
    }
}

fn push_file(
    root: &Path,
    path: &Path,
    exclude: Option<&GlobSet>,
    results: &mut Vec<DiscoveredFile>,
) {
    let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    if exclude.is_some_and(|set| {
        set.is_match(&relative_path)
            || relative_path
                .file_name()
                .is_some_and(|name| set.is_match(name))
    }) {
        return;
    }
    results.push(DiscoveredFile {
        relative_path,
        path: path.to_path_buf(),
    });
}

/// List the names of the regular files directly inside `dir`.
///
/// Not recursive. A missing or unreadable directory yields an empty list.
/// Names are sorted so repeated listings compare equal.
pub fn list_folder_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
