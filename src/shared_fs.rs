use crate::error::{HubError, HubResult};
use std::path::{Path, PathBuf};

/// Sandboxed read/write/list/delete rooted at a configured directory.
/// Every path is resolved against the root and must stay inside it after
/// normalization; escapes via `..`, absolute paths, or symlinks pointing
/// outside fail with a validation error. No locking between operations —
/// concurrent writers to the same path race, by design.
pub struct SharedFs {
    root: PathBuf,
}

impl SharedFs {
    pub fn new(root: impl Into<PathBuf>) -> HubResult<SharedFs> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| HubError::store(format!("failed to create shared directory: {e}")))?;
        let root = root
            .canonicalize()
            .map_err(|e| HubError::store(format!("failed to canonicalize shared directory: {e}")))?;
        Ok(SharedFs { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `rel` against the root, rejecting anything that would land
    /// outside it. The target need not exist yet (needed for writes); when it
    /// does exist, resolution also follows symlinks via `canonicalize`.
    fn resolve(&self, rel: &str) -> HubResult<PathBuf> {
        if Path::new(rel).is_absolute() {
            return Err(HubError::validation("path must be relative to the shared directory"));
        }
        let joined = self.root.join(rel);
        let mut normalized = PathBuf::new();
        for component in joined.components() {
            use std::path::Component;
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(HubError::validation("path escapes the shared directory"));
                    }
                }
                Component::CurDir => {}
                other => normalized.push(other),
            }
        }
        if !normalized.starts_with(&self.root) {
            return Err(HubError::validation("path escapes the shared directory"));
        }
        if let Ok(real) = normalized.canonicalize() {
            if !real.starts_with(&self.root) {
                return Err(HubError::validation("path escapes the shared directory"));
            }
        }
        Ok(normalized)
    }

    pub fn read(&self, rel: &str) -> HubResult<Vec<u8>> {
        let path = self.resolve(rel)?;
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => HubError::not_found(format!("{rel} not found")),
            _ => HubError::store(e.to_string()),
        })
    }

    pub fn write(&self, rel: &str, data: &[u8]) -> HubResult<()> {
        let path = self.resolve(rel)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HubError::store(e.to_string()))?;
        }
        std::fs::write(&path, data).map_err(|e| HubError::store(e.to_string()))
    }

    pub fn delete(&self, rel: &str) -> HubResult<()> {
        let path = self.resolve(rel)?;
        if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        }
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => HubError::not_found(format!("{rel} not found")),
            _ => HubError::store(e.to_string()),
        })
    }

    /// Lists entries directly under `rel` (default: the root), relative paths only.
    pub fn list(&self, rel: Option<&str>) -> HubResult<Vec<String>> {
        let path = match rel {
            Some(rel) => self.resolve(rel)?,
            None => self.root.clone(),
        };
        let entries = std::fs::read_dir(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => HubError::not_found("directory not found"),
            _ => HubError::store(e.to_string()),
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HubError::store(e.to_string()))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
