// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Mode given to files created through the mock (`rw-r--r--`).
pub const DEFAULT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { contents: Vec<u8>, mode: u32 },
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem for tests.
///
/// Parent directories are created implicitly when a file is added, which
/// mirrors what the output guard does before running an action.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    /// Paths for which `strip_write_permissions` should fail.
    unprotectable: Arc<Mutex<Vec<PathBuf>>>,
}

fn parent_or_root(path: &Path) -> Option<&Path> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }
    })
}

fn child_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            unprotectable: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(
            path.clone(),
            MockEntry::File {
                contents: content.into(),
                mode: DEFAULT_FILE_MODE,
            },
        );

        if let Some(parent) = parent_or_root(&path) {
            Self::ensure_dir_entry(&mut files, parent);
            Self::link_child(&mut files, parent, &path);
        }
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.lock();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Make `strip_write_permissions` fail for `path`.
    pub fn fail_protection_for(&self, path: impl AsRef<Path>) {
        self.unprotectable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.as_ref().to_path_buf());
    }

    /// Snapshot of every path currently present (excluding the root).
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .lock()
            .keys()
            .filter(|p| p.as_path() != Path::new("."))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, path: &Path) {
        if let (Some(MockEntry::Dir(children)), Some(name)) = (files.get_mut(parent), child_name(path)) {
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }

    fn unlink_child(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if let Some(parent) = parent_or_root(path) {
            if let (Some(MockEntry::Dir(children)), Some(name)) = (files.get_mut(parent), child_name(path)) {
                children.retain(|c| c != &name);
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = parent_or_root(path) {
            if parent != path {
                // Avoid infinite loop at root
                Self::ensure_dir_entry(files, parent);
                Self::link_child(files, parent, path);
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.lock();
        match files.get(path) {
            Some(MockEntry::File { contents, .. }) => {
                String::from_utf8(contents.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        {
            let files = self.lock();
            if let Some(MockEntry::File { mode, .. }) = files.get(path) {
                if mode & 0o200 == 0 {
                    bail!("Permission denied: {:?}", path);
                }
            }
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.lock();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut files = self.lock();
        if let Some(MockEntry::File { .. }) = files.get(path) {
            bail!("File exists: {:?}", path);
        }
        Self::ensure_dir_entry(&mut files, path);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut files = self.lock();
        match files.get(path) {
            Some(MockEntry::File { .. }) => {
                files.remove(path);
                Self::unlink_child(&mut files, path);
                Ok(())
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let mut files = self.lock();
        match files.get(path) {
            Some(MockEntry::Dir(children)) if children.is_empty() => {
                files.remove(path);
                Self::unlink_child(&mut files, path);
                Ok(())
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Directory not empty: {:?}", path)),
            Some(MockEntry::File { .. }) => Err(anyhow!("Not a directory: {:?}", path)),
            None => Err(anyhow!("Directory not found: {:?}", path)),
        }
    }

    fn strip_write_permissions(&self, path: &Path) -> Result<()> {
        if self
            .unprotectable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|p| p == path)
        {
            bail!("Operation not permitted: {:?}", path);
        }

        let mut files = self.lock();
        match files.get_mut(path) {
            Some(MockEntry::File { mode, .. }) => {
                *mode &= !0o222;
                Ok(())
            }
            Some(MockEntry::Dir(_)) => Ok(()),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn mode(&self, path: &Path) -> Result<u32> {
        match self.lock().get(path) {
            Some(MockEntry::File { mode, .. }) => Ok(*mode),
            Some(MockEntry::Dir(_)) => Ok(0o755),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_dir_refuses_non_empty_directories() {
        let fs = MockFileSystem::new();
        fs.add_file("out/a.txt", b"a");

        assert!(fs.remove_dir(Path::new("out")).is_err());
        fs.remove_file(Path::new("out/a.txt")).unwrap();
        fs.remove_dir(Path::new("out")).unwrap();
        assert!(!fs.exists(Path::new("out")));
        assert!(fs.read_dir(Path::new(".")).unwrap().is_empty());
    }

    #[test]
    fn strip_write_permissions_keeps_read_bits() {
        let fs = MockFileSystem::new();
        fs.add_file("a.txt", b"a");

        fs.strip_write_permissions(Path::new("a.txt")).unwrap();
        assert_eq!(fs.mode(Path::new("a.txt")).unwrap(), 0o444);
        assert!(fs.write(Path::new("a.txt"), b"b").is_err());
    }
}
