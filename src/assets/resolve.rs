use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelpressError, ReelpressResult};

/// Normalize and validate assets-root-relative locators.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects parent
/// traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> ReelpressResult<String> {
    let s = source.replace('\\', "/");
    if s.is_empty() {
        return Err(ReelpressError::validation("media path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReelpressError::validation(
                "media paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ReelpressError::validation(
            "media path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Maps media locators onto filesystem paths.
#[derive(Clone, Debug)]
pub struct MediaResolver {
    assets_root: PathBuf,
}

impl MediaResolver {
    /// Resolve relative locators against `assets_root`.
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
        }
    }

    /// Root that relative locators resolve against.
    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    /// Resolve one locator. Absolute locators are used verbatim.
    pub fn resolve(&self, source: &str) -> ReelpressResult<PathBuf> {
        let p = Path::new(source);
        if p.is_absolute() {
            return Ok(p.to_path_buf());
        }
        let norm = normalize_rel_path(source)?;
        Ok(self.assets_root.join(Path::new(&norm)))
    }

    /// Resolve and read a locator.
    pub fn read_bytes(&self, source: &str) -> ReelpressResult<Vec<u8>> {
        let p = self.resolve(source)?;
        std::fs::read(&p).map_err(|e| {
            ReelpressError::evaluation(format!("failed to read media '{}': {e}", p.display()))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolve.rs"]
mod tests;
