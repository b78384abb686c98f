// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filesystem store: one directory per entry beneath a root, one file per blob
//!
//! Directory listings come back in whatever order the OS likes, so the store
//! keeps its own order index (`.order.json`) next to the entry directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::Result;

const ORDER_FILE: &str = ".order.json";

/// Directory-per-entry store rooted at a single path
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store, creating the root directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root)?;
            info!("Created storage root: {:?}", root);
        }
        Ok(Self { root })
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    pub fn file_path(&self, id: &str, name: &str) -> PathBuf {
        self.dir_path(id).join(name)
    }

    pub fn has_dir(&self, id: &str) -> bool {
        !id.is_empty() && !is_hidden(id) && self.dir_path(id).is_dir()
    }

    /// Like [`has_dir`](Self::has_dir), but the name must match a directory
    /// entry byte for byte
    ///
    /// Case-insensitive filesystems resolve `abc` to a directory named `ABC`;
    /// lookups by id must not.
    pub fn has_exact_dir(&self, id: &str) -> bool {
        if !self.has_dir(id) {
            return false;
        }
        match fs::read_dir(&self.root) {
            Ok(entries) => entries
                .flatten()
                .any(|entry| entry.file_name().to_str() == Some(id)),
            Err(e) => {
                warn!("Cannot list storage root {:?}: {}", self.root, e);
                false
            }
        }
    }

    /// List entry directories in registry order
    ///
    /// Indexed entries come first, in index order; directories created
    /// behind the store's back follow, sorted by name.
    pub fn list_dirs(&self) -> Result<Vec<String>> {
        let mut on_disk = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping non UTF-8 directory in {:?}", self.root);
                continue;
            };
            if !is_hidden(&name) {
                on_disk.push(name);
            }
        }

        let mut ordered: Vec<String> = self
            .read_order()?
            .into_iter()
            .filter(|id| on_disk.contains(id))
            .collect();

        let mut unindexed: Vec<String> = on_disk
            .into_iter()
            .filter(|id| !ordered.contains(id))
            .collect();
        unindexed.sort();
        ordered.extend(unindexed);

        Ok(ordered)
    }

    /// Create an entry directory and append it to the order index
    pub fn create_dir(&self, id: &str) -> Result<()> {
        fs::create_dir_all(self.dir_path(id))?;

        let mut order = self.read_order()?;
        if !order.iter().any(|o| o == id) {
            order.push(id.to_string());
            self.write_order(&order)?;
        }
        debug!("Created directory {}", id);
        Ok(())
    }

    /// Rename an entry directory, keeping its slot in the order index
    ///
    /// A single OS rename: if it fails the old directory is left untouched
    /// and the error is returned as is.
    pub fn rename_dir(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.dir_path(from), self.dir_path(to))?;

        let mut order = self.read_order()?;
        order.retain(|o| o != to);
        match order.iter().position(|o| o == from) {
            Some(idx) => order[idx] = to.to_string(),
            None => order.push(to.to_string()),
        }
        self.write_order(&order)?;
        debug!("Renamed directory {} -> {}", from, to);
        Ok(())
    }

    /// Recursively delete an entry directory
    pub fn remove_dir(&self, id: &str) -> Result<bool> {
        let path = self.dir_path(id);
        let existed = path.is_dir();
        if existed {
            fs::remove_dir_all(&path)?;
        }

        let mut order = self.read_order()?;
        let before = order.len();
        order.retain(|o| o != id);
        if order.len() != before {
            self.write_order(&order)?;
        }
        debug!("Removed directory {}", id);
        Ok(existed)
    }

    /// Delete every entry directory and the order index
    pub fn clear(&self) -> Result<()> {
        for id in self.list_dirs()? {
            fs::remove_dir_all(self.dir_path(&id))?;
        }
        let order = self.root.join(ORDER_FILE);
        if order.exists() {
            fs::remove_file(order)?;
        }
        info!("Cleared storage root {:?}", self.root);
        Ok(())
    }

    /// Copy a file from anywhere into an entry directory
    pub fn copy_into(&self, id: &str, source: &Path, stored_name: &str) -> Result<PathBuf> {
        let target = self.file_path(id, stored_name);
        fs::copy(source, &target)?;
        debug!("Copied {:?} -> {:?}", source, target);
        Ok(target)
    }

    /// Write raw bytes as a file inside an entry directory
    pub fn write_into(&self, id: &str, stored_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let target = self.file_path(id, stored_name);
        fs::write(&target, bytes)?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), target);
        Ok(target)
    }

    /// List the files of an entry directory, oldest first
    pub fn list_files(&self, id: &str) -> Result<Vec<String>> {
        let mut files: Vec<(SystemTime, String)> = Vec::new();
        for entry in fs::read_dir(self.dir_path(id))? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_hidden(&name) {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, name));
        }
        files.sort();
        Ok(files.into_iter().map(|(_, name)| name).collect())
    }

    pub fn remove_file(&self, id: &str, name: &str) -> Result<()> {
        fs::remove_file(self.file_path(id, name))?;
        debug!("Removed file {}/{}", id, name);
        Ok(())
    }

    /// Rename a file to `new_stem`, keeping the original extension
    ///
    /// Returns the new file name.
    pub fn rename_file(&self, id: &str, from: &str, new_stem: &str) -> Result<String> {
        let to = match Path::new(from).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", new_stem, ext),
            None => new_stem.to_string(),
        };
        fs::rename(self.file_path(id, from), self.file_path(id, &to))?;
        debug!("Renamed file {}/{} -> {}", id, from, to);
        Ok(to)
    }

    /// Read a stored file without blocking the runtime
    pub async fn read_file(&self, id: &str, name: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.file_path(id, name)).await?)
    }

    fn read_order(&self) -> Result<Vec<String>> {
        let path = self.root.join(ORDER_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(order) => Ok(order),
            Err(e) => {
                warn!("Ignoring unreadable order index {:?}: {}", path, e);
                Ok(Vec::new())
            }
        }
    }

    fn write_order(&self, order: &[String]) -> Result<()> {
        let content = serde_json::to_string(order)?;
        fs::write(self.root.join(ORDER_FILE), content)?;
        Ok(())
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsStore) {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::open(tmp.path().join("galleries")).unwrap();
        (tmp, store)
    }

    #[test]
    fn test_open_creates_root() {
        let (tmp, store) = store();
        assert!(tmp.path().join("galleries").is_dir());
        assert!(store.list_dirs().unwrap().is_empty());
    }

    #[test]
    fn test_list_dirs_keeps_creation_order() {
        let (_tmp, store) = store();
        for id in ["zeta", "alpha", "mid"] {
            store.create_dir(id).unwrap();
        }
        assert_eq!(store.list_dirs().unwrap(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_rename_dir_keeps_slot_and_contents() {
        let (_tmp, store) = store();
        store.create_dir("one").unwrap();
        store.create_dir("two").unwrap();
        store.write_into("one", "a.png", b"x").unwrap();

        store.rename_dir("one", "uno").unwrap();

        assert_eq!(store.list_dirs().unwrap(), vec!["uno", "two"]);
        assert_eq!(store.list_files("uno").unwrap(), vec!["a.png"]);
        assert!(!store.has_dir("one"));
    }

    #[test]
    fn test_has_exact_dir_matches_entry_name() {
        let (_tmp, store) = store();
        store.create_dir("AbC").unwrap();
        fs::create_dir(store.dir_path(".hidden")).unwrap();

        assert!(store.has_exact_dir("AbC"));
        assert!(!store.has_exact_dir("abc"));
        assert!(!store.has_exact_dir("ABC"));
        assert!(!store.has_exact_dir(".hidden"));
        assert!(!store.has_exact_dir(""));
    }

    #[test]
    fn test_rename_dir_failure_leaves_source() {
        let (_tmp, store) = store();
        store.create_dir("one").unwrap();
        assert!(store.rename_dir("missing", "other").is_err());
        assert_eq!(store.list_dirs().unwrap(), vec!["one"]);
    }

    #[test]
    fn test_unindexed_dirs_listed_after_indexed() {
        let (_tmp, store) = store();
        store.create_dir("b").unwrap();
        fs::create_dir(store.dir_path("z")).unwrap();
        fs::create_dir(store.dir_path("a")).unwrap();
        fs::create_dir(store.dir_path(".hidden")).unwrap();
        fs::write(store.root().join("stray.txt"), b"").unwrap();

        assert_eq!(store.list_dirs().unwrap(), vec!["b", "a", "z"]);
    }

    #[test]
    fn test_remove_dir_and_clear() {
        let (_tmp, store) = store();
        store.create_dir("a").unwrap();
        store.create_dir("b").unwrap();

        assert!(store.remove_dir("a").unwrap());
        assert!(!store.remove_dir("a").unwrap());
        assert_eq!(store.list_dirs().unwrap(), vec!["b"]);

        store.clear().unwrap();
        assert!(store.list_dirs().unwrap().is_empty());
        store.clear().unwrap();
        assert!(!store.root().join(ORDER_FILE).exists());
    }

    #[test]
    fn test_corrupt_order_index_is_ignored() {
        let (_tmp, store) = store();
        store.create_dir("b").unwrap();
        store.create_dir("a").unwrap();
        fs::write(store.root().join(ORDER_FILE), "{not json").unwrap();

        assert_eq!(store.list_dirs().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_rename_file_keeps_extension() {
        let (_tmp, store) = store();
        store.create_dir("g").unwrap();
        store.write_into("g", "old.name.jpeg", b"x").unwrap();
        store.write_into("g", "noext", b"x").unwrap();

        assert_eq!(store.rename_file("g", "old.name.jpeg", "new").unwrap(), "new.jpeg");
        assert_eq!(store.rename_file("g", "noext", "still").unwrap(), "still");

        let mut files = store.list_files("g").unwrap();
        files.sort();
        assert_eq!(files, vec!["new.jpeg", "still"]);
    }

    #[test]
    fn test_copy_into_and_remove_file() {
        let (tmp, store) = store();
        store.create_dir("g").unwrap();
        let source = tmp.path().join("source.png");
        fs::write(&source, b"pixels").unwrap();

        let stored = store.copy_into("g", &source, "abc_source.png").unwrap();
        assert_eq!(fs::read(stored).unwrap(), b"pixels");
        assert!(source.exists());

        store.remove_file("g", "abc_source.png").unwrap();
        assert!(store.list_files("g").unwrap().is_empty());
        assert!(store.remove_file("g", "abc_source.png").is_err());
    }

    #[tokio::test]
    async fn test_read_file() {
        let (_tmp, store) = store();
        store.create_dir("g").unwrap();
        store.write_into("g", "f.bin", b"bytes").unwrap();

        assert_eq!(store.read_file("g", "f.bin").await.unwrap(), b"bytes");
        assert!(store.read_file("g", "missing.bin").await.is_err());
    }
}
