use std::path::PathBuf;

use anyhow::Context as _;

use crate::foundation::error::LeapsResult;

/// Owns every transient file created during one run.
///
/// Files are removed by [`TempAssetManager::cleanup`] or, failing that, when the manager is
/// dropped, so early returns and errors release them too. Removal is best-effort: failures are
/// logged and otherwise ignored.
#[derive(Debug)]
pub struct TempAssetManager {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl Default for TempAssetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TempAssetManager {
    /// Manager allocating in the system temp directory.
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            paths: Vec::new(),
        }
    }

    /// Create a new empty file named `<prefix><random><suffix>` and start tracking it.
    pub fn allocate(&mut self, prefix: &str, suffix: &str) -> LeapsResult<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.dir)
            .with_context(|| format!("create temp file in '{}'", self.dir.display()))?;
        let path = file
            .into_temp_path()
            .keep()
            .context("detach temp file from auto-deletion")?;
        tracing::debug!(path = %path.display(), "allocated temp asset");
        self.paths.push(path.clone());
        Ok(path)
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every tracked file. Returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0usize;
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove temp asset");
                }
            }
        }
        removed
    }
}

impl Drop for TempAssetManager {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            self.cleanup();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/temp.rs"]
mod tests;
