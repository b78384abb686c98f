// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Gallery registry: CRUD and search over gallery directories

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::codec;
use crate::store::FsStore;
use crate::{GalleryError, Result};

/// A named collection of photos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub id: String,
    pub name: String,
}

impl Gallery {
    fn from_id(id: String) -> Option<Self> {
        let name = codec::decode(&id)?;
        Some(Self { id, name })
    }
}

/// Registry of galleries held in a [`FsStore`]
#[derive(Debug, Clone)]
pub struct GalleryRegistry {
    store: Arc<FsStore>,
}

impl GalleryRegistry {
    pub fn new(store: Arc<FsStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &FsStore {
        &self.store
    }

    /// All galleries in registry order
    pub fn all(&self) -> Result<Vec<Gallery>> {
        let galleries = self
            .store
            .list_dirs()?
            .into_iter()
            .filter_map(|id| {
                let gallery = Gallery::from_id(id.clone());
                if gallery.is_none() {
                    warn!("Skipping directory {:?}: not a gallery id", id);
                }
                gallery
            })
            .collect();
        Ok(galleries)
    }

    /// Create a gallery; names must be unique
    pub fn create(&self, name: &str) -> Result<Gallery> {
        validate_name(name)?;
        let id = codec::encode(name);
        if self.store.has_dir(&id) {
            return Err(GalleryError::GalleryExists(name.to_string()));
        }

        self.store.create_dir(&id)?;
        info!("Created gallery {:?} ({})", name, id);
        Ok(Gallery { id, name: name.to_string() })
    }

    /// Rename a gallery; its id follows the new name
    ///
    /// Returns `None` when no gallery has `id`.
    pub fn rename(&self, id: &str, new_name: &str) -> Result<Option<Gallery>> {
        validate_name(new_name)?;
        let Some(gallery) = self.find(id) else {
            return Ok(None);
        };

        let new_id = codec::encode(new_name);
        if new_id == gallery.id {
            return Ok(Some(gallery));
        }
        if self.store.has_dir(&new_id) {
            return Err(GalleryError::GalleryExists(new_name.to_string()));
        }

        self.store.rename_dir(&gallery.id, &new_id)?;
        info!("Renamed gallery {:?} -> {:?}", gallery.name, new_name);
        Ok(Some(Gallery { id: new_id, name: new_name.to_string() }))
    }

    /// Delete a gallery and every photo in it
    pub fn delete(&self, gallery: &Gallery) -> Result<bool> {
        if codec::decode(&gallery.id).is_none() {
            return Ok(false);
        }
        let removed = self.store.remove_dir(&gallery.id)?;
        if removed {
            info!("Deleted gallery {:?}", gallery.name);
        }
        Ok(removed)
    }

    pub fn find(&self, id: &str) -> Option<Gallery> {
        // only well-formed ids ever reach the filesystem
        let name = codec::decode(id)?;
        // ids are case sensitive even where the filesystem is not
        if !self.store.has_exact_dir(id) {
            debug!("Gallery {} not found", id);
            return None;
        }
        Some(Gallery { id: id.to_string(), name })
    }

    /// Case-sensitive substring search on gallery names
    pub fn search(&self, query: &str) -> Result<Vec<Gallery>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .all()?
            .into_iter()
            .filter(|g| g.name.contains(query))
            .collect())
    }

    /// Remove every gallery
    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GalleryError::InvalidName("gallery name is empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry() -> (TempDir, GalleryRegistry) {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::open(tmp.path()).unwrap();
        (tmp, GalleryRegistry::new(Arc::new(store)))
    }

    #[test]
    fn test_create_and_find() {
        let (_tmp, galleries) = registry();
        let created = galleries.create("Holidays 2024").unwrap();

        assert_eq!(created.id, codec::encode("Holidays 2024"));
        assert_eq!(galleries.find(&created.id), Some(created));
    }

    #[test]
    fn test_create_rejects_duplicate_and_empty_names() {
        let (_tmp, galleries) = registry();
        galleries.create("Dup").unwrap();

        assert!(matches!(galleries.create("Dup"), Err(GalleryError::GalleryExists(_))));
        assert!(matches!(galleries.create("   "), Err(GalleryError::InvalidName(_))));
        assert_eq!(galleries.all().unwrap().len(), 1);
    }

    #[test]
    fn test_find_missing_is_none() {
        let (_tmp, galleries) = registry();
        assert_eq!(galleries.find(&codec::encode("nope")), None);
        assert_eq!(galleries.find("!!not-an-id"), None);
        assert_eq!(galleries.find("../etc"), None);
        assert_eq!(galleries.find(""), None);
    }

    #[test]
    fn test_find_is_case_sensitive() {
        let (_tmp, galleries) = registry();
        let g = galleries.create("Mixed Case").unwrap();
        let swapped: String = g
            .id
            .chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect();

        assert_ne!(swapped, g.id);
        assert_eq!(galleries.find(&swapped), None);
        assert_eq!(galleries.find(&g.id), Some(g));
    }

    #[test]
    fn test_rename_unknown_and_same_name() {
        let (_tmp, galleries) = registry();
        let g = galleries.create("Same").unwrap();

        assert_eq!(galleries.rename(&codec::encode("Other"), "New").unwrap(), None);
        assert_eq!(galleries.rename(&g.id, "Same").unwrap(), Some(g));
    }

    #[test]
    fn test_rename_onto_existing_is_rejected() {
        let (_tmp, galleries) = registry();
        let a = galleries.create("A").unwrap();
        galleries.create("B").unwrap();

        assert!(matches!(galleries.rename(&a.id, "B"), Err(GalleryError::GalleryExists(_))));
        assert!(galleries.find(&a.id).is_some());
    }

    #[test]
    fn test_foreign_directories_are_skipped() {
        let (tmp, galleries) = registry();
        galleries.create("Real").unwrap();
        std::fs::create_dir(tmp.path().join("not base64!")).unwrap();

        let all = galleries.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Real");
    }

    #[test]
    fn test_search_empty_query() {
        let (_tmp, galleries) = registry();
        galleries.create("Anything").unwrap();
        assert!(galleries.search("").unwrap().is_empty());
        assert!(galleries.search("anything").unwrap().is_empty());
        assert_eq!(galleries.search("Any").unwrap().len(), 1);
    }
}
