use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PatchmarkError;

use super::Store;

/// An in-memory store keyed by path. Useful for library consumers that stage
/// patches before committing them anywhere, and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<PathBuf, Vec<u8>>,
    modes: BTreeMap<PathBuf, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn insert_with_mode(
        &mut self,
        path: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
        mode: u32,
    ) {
        let path = path.into();
        self.files.insert(path.clone(), contents.into());
        self.modes.insert(path, mode & 0o7777);
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.files.get(path.as_ref()).map(Vec::as_slice)
    }

    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.modes.get(path.as_ref()).copied()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn missing(path: &Path) -> PatchmarkError {
        PatchmarkError::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "no such file in store"),
        )
    }
}

impl Store for MemoryStore {
    fn exists(&self, path: &Path) -> Result<bool, PatchmarkError> {
        Ok(self.files.contains_key(path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, PatchmarkError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Self::missing(path))
    }

    fn write(&mut self, path: &Path, contents: &[u8]) -> Result<(), PatchmarkError> {
        self.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<(), PatchmarkError> {
        self.files.remove(path);
        self.modes.remove(path);
        Ok(())
    }

    fn move_file(&mut self, source: &Path, dest: &Path) -> Result<(), PatchmarkError> {
        let contents = self
            .files
            .remove(source)
            .ok_or_else(|| Self::missing(source))?;
        self.files.insert(dest.to_path_buf(), contents);
        if let Some(mode) = self.modes.remove(source) {
            self.modes.insert(dest.to_path_buf(), mode);
        }
        Ok(())
    }

    fn permissions(&self, path: &Path) -> Result<Option<u32>, PatchmarkError> {
        if !self.files.contains_key(path) {
            return Err(Self::missing(path));
        }
        Ok(self.modes.get(path).copied())
    }

    fn set_permissions(&mut self, path: &Path, mode: u32) -> Result<(), PatchmarkError> {
        if !self.files.contains_key(path) {
            return Err(Self::missing(path));
        }
        self.modes.insert(path.to_path_buf(), mode & 0o7777);
        Ok(())
    }
}
