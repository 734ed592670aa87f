//! Image lookup under the configured image root
//!
//! Requested paths are relative. Absolute paths, `..` components and paths
//! whose canonical form (after following symlinks) leaves the root are
//! rejected.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Relative path with only normal components, or `None`
    fn sanitize(requested: &str) -> Option<PathBuf> {
        let mut clean = PathBuf::new();
        for component in Path::new(requested).components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if clean.as_os_str().is_empty() {
            None
        } else {
            Some(clean)
        }
    }

    /// Candidate locations: as given, then without a leading component that
    /// repeats the root's own directory name
    fn candidates(&self, relative: &Path) -> Vec<PathBuf> {
        let mut out = vec![self.root.join(relative)];
        let root_name = self.root.file_name();
        let mut components = relative.components();
        if let (Some(first), Some(root_name)) = (components.next(), root_name) {
            let rest = components.as_path();
            if first.as_os_str() == root_name && !rest.as_os_str().is_empty() {
                out.push(self.root.join(rest));
            }
        }
        out
    }

    /// Resolve a requested image to an existing file inside the root
    pub fn resolve(&self, requested: &str) -> Option<PathBuf> {
        let relative = Self::sanitize(requested)?;
        let root = self.root.canonicalize().ok()?;

        for candidate in self.candidates(&relative) {
            let Ok(resolved) = candidate.canonicalize() else {
                continue;
            };
            if !resolved.starts_with(&root) {
                debug!("Rejected image path escaping the root: {}", requested);
                return None;
            }
            if resolved.is_file() {
                return Some(resolved);
            }
        }
        None
    }

    /// [`ImageStore::resolve`] on a blocking thread, for async handlers
    pub async fn locate(self: &Arc<Self>, requested: &str) -> Option<PathBuf> {
        let store = Arc::clone(self);
        let requested = requested.to_string();
        match tokio::task::spawn_blocking(move || store.resolve(&requested)).await {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("Image lookup task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> (TempDir, ImageStore) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("imdb_crop");
        fs::create_dir_all(root.join("01")).unwrap();
        fs::write(root.join("01").join("face.jpg"), b"\xff\xd8\xff").unwrap();
        fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
        (dir, ImageStore::new(root))
    }

    #[test]
    fn test_resolves_relative_path() {
        let (_dir, store) = store();
        assert!(store.resolve("01/face.jpg").is_some());
        assert!(store.resolve("./01/face.jpg").is_some());
        assert!(store.resolve("01/other.jpg").is_none());
        assert!(store.resolve("01").is_none());
    }

    #[test]
    fn test_strips_root_name_prefix() {
        let (_dir, store) = store();
        assert!(store.resolve("imdb_crop/01/face.jpg").is_some());
    }

    #[tokio::test]
    async fn test_locate_off_the_runtime_thread() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        let found = store.locate("01/face.jpg").await.unwrap();
        assert!(found.ends_with("01/face.jpg"));
        assert!(store.locate("../secret.txt").await.is_none());
    }

    #[test]
    fn test_rejects_traversal() {
        let (_dir, store) = store();
        assert!(store.resolve("../secret.txt").is_none());
        assert!(store.resolve("01/../../secret.txt").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
        assert!(store.resolve("").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_symlink_escape() {
        let (dir, store) = store();
        std::os::unix::fs::symlink(
            dir.path().join("secret.txt"),
            dir.path().join("imdb_crop").join("01").join("link.jpg"),
        )
        .unwrap();
        assert!(store.resolve("01/link.jpg").is_none());
    }
}
