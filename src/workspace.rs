//! Workspace indexing: find PHP files on disk and load them into a
//! [`Project`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::project::Project;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("{path} does not exist")]
    NotFound { path: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn is_php_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
}

/// Collect the PHP files named by `paths`.
///
/// Files are taken as given.  Directories are walked recursively,
/// honouring `.gitignore` and skipping any directory whose name is in
/// `exclude`.  The result is sorted and free of duplicates.
pub fn collect_php_files(
    paths: &[PathBuf],
    exclude: &[String],
) -> Result<Vec<PathBuf>, WorkspaceError> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            return Err(WorkspaceError::NotFound {
                path: path.display().to_string(),
            });
        }

        let excluded = exclude.to_vec();
        let walker = ignore::WalkBuilder::new(path)
            .hidden(false)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(is_dir
                    && entry.depth() > 0
                    && excluded
                        .iter()
                        .any(|name| entry.file_name() == name.as_str()))
            })
            .build();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                    if is_file && is_php_file(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(err) => tracing::warn!(root = %path.display(), "skipping entry: {}", err),
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Read `files` into `project`, keyed by `key_for(path)`.
///
/// Returns how many files were loaded.
pub fn load_files(
    project: &mut Project,
    files: &[PathBuf],
    key_for: impl Fn(&Path) -> String,
) -> Result<usize, WorkspaceError> {
    for path in files {
        let content = std::fs::read_to_string(path).map_err(|source| WorkspaceError::Read {
            path: path.display().to_string(),
            source,
        })?;
        project.add_file(&key_for(path), &content);
    }
    tracing::debug!(count = files.len(), "loaded files");
    Ok(files.len())
}

/// Walk `root` and load every PHP file, tolerating unreadable files.
///
/// Used by the language server, where one broken file must not prevent
/// indexing the rest.
pub fn index_directory(
    project: &mut Project,
    root: &Path,
    exclude: &[String],
    key_for: impl Fn(&Path) -> String,
) -> Result<usize, WorkspaceError> {
    let files = collect_php_files(&[root.to_path_buf()], exclude)?;
    let mut loaded = 0;
    for path in &files {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                project.add_file(&key_for(path), &content);
                loaded += 1;
            }
            Err(err) => tracing::warn!(path = %path.display(), "failed to read file: {}", err),
        }
    }
    Ok(loaded)
}
