//! Asset Materializer
//!
//! Walks a read-only source tree and mirrors it under the cache root,
//! preserving relative paths. Files already present in the cache are treated
//! as content-stable and skipped. A failure on one entry is logged and does
//! not abort its siblings.

use crate::AssetError;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counters for one materialization run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Files written to the cache
    pub copied: usize,
    /// Files skipped because the destination already existed
    pub skipped: usize,
    /// Files skipped because of an I/O failure
    pub failed: usize,
}

impl MaterializeReport {
    fn merge(&mut self, other: MaterializeReport) {
        self.copied += other.copied;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Copies bundled assets into the writable cache
pub struct Materializer {
    dest_root: PathBuf,
}

impl Materializer {
    /// Create a materializer targeting a cache root
    pub fn new(dest_root: impl Into<PathBuf>) -> Self {
        Self {
            dest_root: dest_root.into(),
        }
    }

    /// Mirror an entire source tree into the cache root.
    ///
    /// Idempotent: a second run over an unchanged tree copies nothing.
    pub fn materialize(&self, source_root: &Path) -> Result<MaterializeReport, AssetError> {
        if !source_root.exists() {
            return Err(AssetError::SourceMissing(source_root.display().to_string()));
        }

        fs::create_dir_all(&self.dest_root)
            .map_err(|e| AssetError::CacheUnusable(format!("{}: {}", self.dest_root.display(), e)))?;

        // A single-file source keeps its own name under the cache root
        let relative = if source_root.is_dir() {
            PathBuf::new()
        } else {
            source_root.file_name().map(PathBuf::from).unwrap_or_default()
        };
        let report = self.materialize_entry(source_root, &relative);
        info!(
            "Materialized {} -> {}: {} copied, {} skipped, {} failed",
            source_root.display(),
            self.dest_root.display(),
            report.copied,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// Copy one source file into the cache under a different relative name.
    ///
    /// Used for the model, which the session expects under a fixed name.
    pub fn copy_file_as(
        &self,
        source_file: &Path,
        relative_dest: &str,
    ) -> Result<PathBuf, AssetError> {
        if !source_file.is_file() {
            return Err(AssetError::SourceMissing(source_file.display().to_string()));
        }

        let dest = self.dest_root.join(relative_dest);
        self.copy_if_absent(source_file, &dest)?;
        Ok(dest)
    }

    /// Recurse over one entry. Directory nodes recurse over children; file
    /// nodes stream-copy unless the destination already exists.
    fn materialize_entry(&self, source: &Path, relative: &Path) -> MaterializeReport {
        let mut report = MaterializeReport::default();

        if source.is_dir() {
            let entries = match fs::read_dir(source) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping unreadable directory {}: {}", source.display(), e);
                    report.failed += 1;
                    return report;
                }
            };
            for entry in entries {
                match entry {
                    Ok(entry) => {
                        let child_rel = relative.join(entry.file_name());
                        report.merge(self.materialize_entry(&entry.path(), &child_rel));
                    }
                    Err(e) => {
                        warn!("Skipping unreadable entry under {}: {}", source.display(), e);
                        report.failed += 1;
                    }
                }
            }
        } else {
            let dest = self.dest_root.join(relative);
            match self.copy_if_absent(source, &dest) {
                Ok(true) => report.copied += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!("Skipping asset {}: {}", source.display(), e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Stream-copy `source` to `dest` unless `dest` already exists.
    ///
    /// Returns true if a copy happened. The copy goes through a bounded
    /// buffer so large model files never sit whole in memory.
    fn copy_if_absent(&self, source: &Path, dest: &Path) -> Result<bool, AssetError> {
        if dest.exists() {
            debug!("Cache hit, not rewriting {}", dest.display());
            return Ok(false);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut reader = File::open(source)?;
        let mut writer = File::create(dest)?;
        let bytes = io::copy(&mut reader, &mut writer)?;
        debug!("Copied {} ({} bytes)", dest.display(), bytes);
        Ok(true)
    }
}
