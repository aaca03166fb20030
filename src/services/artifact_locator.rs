//! Scans the build output directory for hashed bundles.
//!
//! The bundler writes `app-<hash>.js` (and optionally `app-<hash>.css`) into a
//! single flat directory. Only regular files directly inside that directory
//! are considered; `*` in the pattern never spans a path separator.

use crate::models::artifact::{BUNDLE_PREFIX, CSS_EXTENSION, JS_EXTENSION};
use clap::ValueEnum;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use thiserror::Error;
use tracing::debug;

/// What to do when more than one file matches a bundle pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SelectionPolicy {
    /// Refuse to pick; report every candidate.
    #[default]
    Strict,
    /// Pick the most recently modified candidate.
    Newest,
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error(
        "more than one bundle matches `{pattern}` in {}: {}. Remove stale builds or pass --select newest",
        .dir.display(),
        display_paths(.candidates)
    )]
    Ambiguous {
        dir: PathBuf,
        pattern: String,
        candidates: Vec<PathBuf>,
    },
    #[error("failed to scan {}: {source}", .dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type LocateResult<T> = Result<T, LocateError>;

/// Returns true if `path` exists and is a directory.
///
/// Any filesystem error (permissions, broken symlink, ...) counts as absent.
pub fn directory_exists(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false)
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    modified: Option<SystemTime>,
}

/// Looks up bundles inside one build directory.
#[derive(Clone, Debug)]
pub struct ArtifactLocator {
    dir: PathBuf,
    policy: SelectionPolicy,
}

impl ArtifactLocator {
    pub fn new(dir: impl Into<PathBuf>, policy: SelectionPolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
        }
    }

    /// Find the `app-*.js` bundle. `Ok(None)` means no build has been run.
    pub fn find_js_bundle(&self) -> LocateResult<Option<PathBuf>> {
        self.find_bundle(JS_EXTENSION)
    }

    /// Find the `app-*.css` bundle, if the build produced one.
    pub fn find_css_bundle(&self) -> LocateResult<Option<PathBuf>> {
        self.find_bundle(CSS_EXTENSION)
    }

    fn find_bundle(&self, extension: &str) -> LocateResult<Option<PathBuf>> {
        let mut candidates = self.scan(extension)?;
        debug!(
            dir = %self.dir.display(),
            extension,
            matches = candidates.len(),
            "scanned build directory"
        );

        match candidates.len() {
            0 => Ok(None),
            1 => Ok(candidates.pop().map(|c| c.path)),
            _ => match self.policy {
                SelectionPolicy::Strict => Err(LocateError::Ambiguous {
                    dir: self.dir.clone(),
                    pattern: format!("{BUNDLE_PREFIX}*{extension}"),
                    candidates: candidates.into_iter().map(|c| c.path).collect(),
                }),
                SelectionPolicy::Newest => Ok(candidates
                    .into_iter()
                    .max_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)))
                    .map(|c| c.path)),
            },
        }
    }

    /// Collect matching regular files, sorted by name so the result never
    /// depends on directory enumeration order.
    fn scan(&self, extension: &str) -> LocateResult<Vec<Candidate>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LocateError::Scan {
                    dir: self.dir.clone(),
                    source,
                });
            }
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LocateError::Scan {
                dir: self.dir.clone(),
                source,
            })?;

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                debug!(name = ?entry.file_name(), "skipping non UTF-8 file name");
                continue;
            };
            if !matches_bundle_pattern(name, extension) {
                continue;
            }

            // Follows symlinks, same as a shell glob would.
            let path = entry.path();
            let meta = match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };

            found.push(Candidate {
                path,
                modified: meta.modified().ok(),
            });
        }

        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }
}

/// `app-*<extension>`, where `*` may be empty.
fn matches_bundle_pattern(name: &str, extension: &str) -> bool {
    name.len() >= BUNDLE_PREFIX.len() + extension.len()
        && name.starts_with(BUNDLE_PREFIX)
        && name.ends_with(extension)
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
