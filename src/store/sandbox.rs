use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::PatchmarkError;

use super::Store;

/// Wraps any store and confines every path to a root. A path escapes when a
/// `..` component climbs above the root, when an absolute path points
/// elsewhere, or when a symlink under the root resolves outside it.
#[derive(Debug, Clone)]
pub struct SandboxStore<S> {
    inner: S,
    root: PathBuf,
}

impl<S: Store> SandboxStore<S> {
    pub fn new(inner: S, root: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            root: root.into(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn guard(&self, path: &Path) -> Result<(), PatchmarkError> {
        ensure_within_root(&self.root, path)
    }
}

impl<S: Store> Store for SandboxStore<S> {
    fn exists(&self, path: &Path) -> Result<bool, PatchmarkError> {
        self.guard(path)?;
        self.inner.exists(path)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, PatchmarkError> {
        self.guard(path)?;
        self.inner.read(path)
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> Result<(), PatchmarkError> {
        self.guard(path)?;
        self.inner.write(path, contents)
    }

    fn remove(&mut self, path: &Path) -> Result<(), PatchmarkError> {
        self.guard(path)?;
        self.inner.remove(path)
    }

    fn move_file(&mut self, source: &Path, dest: &Path) -> Result<(), PatchmarkError> {
        self.guard(source)?;
        self.guard(dest)?;
        self.inner.move_file(source, dest)
    }

    fn permissions(&self, path: &Path) -> Result<Option<u32>, PatchmarkError> {
        self.guard(path)?;
        self.inner.permissions(path)
    }

    fn set_permissions(&mut self, path: &Path, mode: u32) -> Result<(), PatchmarkError> {
        self.guard(path)?;
        self.inner.set_permissions(path, mode)
    }
}

fn ensure_within_root(root: &Path, path: &Path) -> Result<(), PatchmarkError> {
    let violation = || PatchmarkError::SandboxViolation {
        path: path.display().to_string(),
        root: root.display().to_string(),
    };

    // Absolute paths must already sit under the root; everything else is
    // treated as root-relative.
    let relative = if path.is_absolute() {
        path.strip_prefix(root).map_err(|_| violation())?.to_path_buf()
    } else {
        path.to_path_buf()
    };

    let canonical_root = root.canonicalize().ok();
    let mut depth = 0usize;
    let mut probe = root.to_path_buf();

    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(violation());
                }
                depth -= 1;
                probe.pop();
            }
            Component::Normal(part) => {
                depth += 1;
                probe.push(part);
                // Symlinks under the root may not point outside of it.
                if let (Some(canonical_root), Ok(metadata)) =
                    (canonical_root.as_ref(), fs::symlink_metadata(&probe))
                {
                    if metadata.file_type().is_symlink() {
                        let target = probe.canonicalize().map_err(|_| violation())?;
                        if !target.starts_with(canonical_root) {
                            return Err(violation());
                        }
                    }
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(violation()),
        }
    }

    Ok(())
}
