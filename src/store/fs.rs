use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PatchmarkError;

use super::Store;

/// A `std::fs`-backed store. Relative patch paths are resolved against the
/// configured root; absolute paths are used as given.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn create_parent_directories(&self, resolved: &Path) -> Result<(), PatchmarkError> {
        if let Some(parent) = resolved.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| PatchmarkError::io(parent, error))?;
            }
        }
        Ok(())
    }
}

impl Store for FsStore {
    fn exists(&self, path: &Path) -> Result<bool, PatchmarkError> {
        let resolved = self.resolve(path);
        resolved
            .try_exists()
            .map_err(|error| PatchmarkError::io(&resolved, error))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, PatchmarkError> {
        let resolved = self.resolve(path);
        fs::read(&resolved).map_err(|error| PatchmarkError::io(&resolved, error))
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> Result<(), PatchmarkError> {
        let resolved = self.resolve(path);
        self.create_parent_directories(&resolved)?;
        fs::write(&resolved, contents).map_err(|error| PatchmarkError::io(&resolved, error))
    }

    fn remove(&mut self, path: &Path) -> Result<(), PatchmarkError> {
        let resolved = self.resolve(path);
        match fs::remove_file(&resolved) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(PatchmarkError::io(&resolved, error)),
        }
    }

    fn move_file(&mut self, source: &Path, dest: &Path) -> Result<(), PatchmarkError> {
        let resolved_source = self.resolve(source);
        let resolved_dest = self.resolve(dest);
        self.create_parent_directories(&resolved_dest)?;
        if resolved_dest
            .try_exists()
            .map_err(|error| PatchmarkError::io(&resolved_dest, error))?
        {
            fs::remove_file(&resolved_dest)
                .map_err(|error| PatchmarkError::io(&resolved_dest, error))?;
        }
        fs::rename(&resolved_source, &resolved_dest)
            .map_err(|error| PatchmarkError::io(&resolved_source, error))
    }

    #[cfg(unix)]
    fn permissions(&self, path: &Path) -> Result<Option<u32>, PatchmarkError> {
        use std::os::unix::fs::PermissionsExt;

        let resolved = self.resolve(path);
        let metadata =
            fs::metadata(&resolved).map_err(|error| PatchmarkError::io(&resolved, error))?;
        Ok(Some(metadata.permissions().mode() & 0o7777))
    }

    #[cfg(not(unix))]
    fn permissions(&self, _path: &Path) -> Result<Option<u32>, PatchmarkError> {
        Ok(None)
    }

    #[cfg(unix)]
    fn set_permissions(&mut self, path: &Path, mode: u32) -> Result<(), PatchmarkError> {
        use std::os::unix::fs::PermissionsExt;

        let resolved = self.resolve(path);
        fs::set_permissions(&resolved, fs::Permissions::from_mode(mode & 0o7777))
            .map_err(|error| PatchmarkError::io(&resolved, error))
    }

    #[cfg(not(unix))]
    fn set_permissions(&mut self, _path: &Path, _mode: u32) -> Result<(), PatchmarkError> {
        Ok(())
    }
}
