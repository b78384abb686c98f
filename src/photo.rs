// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Photo registry: the files inside a gallery directory
//!
//! Each photo is stored as `<photo id>_<filename>` in its gallery's
//! directory, so both the id and the display name come back out of a plain
//! directory listing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gallery::{Gallery, GalleryRegistry};
use crate::store::FsStore;
use crate::tagger::TagInference;
use crate::{GalleryError, Result};

/// A stored image owned by one gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    /// Display name: the stored filename without id prefix or extension
    pub name: String,
    /// `<gallery id>/<stored filename>`, relative to the storage root
    pub file: String,
    pub gallery: String,
}

impl Photo {
    /// Build a photo from a stored filename, if it is one of ours
    fn from_stored(gallery_id: &str, stored: &str) -> Option<Self> {
        let (id, original) = stored.split_once('_')?;
        Uuid::try_parse(id).ok()?;
        if original.is_empty() {
            return None;
        }
        let name = Path::new(original).file_stem()?.to_str()?.to_string();

        Some(Self {
            id: id.to_string(),
            name,
            file: format!("{}/{}", gallery_id, stored),
            gallery: gallery_id.to_string(),
        })
    }

    /// Filename inside the gallery directory
    pub fn stored_name(&self) -> &str {
        self.file.split_once('/').map_or(self.file.as_str(), |(_, name)| name)
    }
}

/// Registry of photos across all galleries
#[derive(Clone)]
pub struct PhotoRegistry {
    galleries: GalleryRegistry,
    tagger: Arc<dyn TagInference>,
}

impl PhotoRegistry {
    pub fn new(galleries: GalleryRegistry, tagger: Arc<dyn TagInference>) -> Self {
        Self { galleries, tagger }
    }

    fn store(&self) -> &FsStore {
        self.galleries.store()
    }

    /// Photos of a gallery, oldest upload first; empty for unknown galleries
    pub fn gallery_photos(&self, gallery_id: &str) -> Result<Vec<Photo>> {
        let Some(gallery) = self.galleries.find(gallery_id) else {
            return Ok(Vec::new());
        };

        let photos = self
            .store()
            .list_files(&gallery.id)?
            .iter()
            .filter_map(|stored| {
                let photo = Photo::from_stored(&gallery.id, stored);
                if photo.is_none() {
                    debug!("Skipping foreign file {}/{}", gallery.id, stored);
                }
                photo
            })
            .collect();
        Ok(photos)
    }

    pub fn find(&self, gallery_id: &str, photo_id: &str) -> Result<Option<Photo>> {
        Ok(self
            .gallery_photos(gallery_id)?
            .into_iter()
            .find(|p| p.id == photo_id))
    }

    /// Case-sensitive substring search on photo names within one gallery
    pub fn search(&self, gallery_id: &str, query: &str) -> Result<Vec<Photo>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .gallery_photos(gallery_id)?
            .into_iter()
            .filter(|p| p.name.contains(query))
            .collect())
    }

    /// Delete a photo, returning it if it existed
    pub fn delete(&self, gallery_id: &str, photo_id: &str) -> Result<Option<Photo>> {
        let Some(photo) = self.find(gallery_id, photo_id)? else {
            return Ok(None);
        };

        self.store().remove_file(&photo.gallery, photo.stored_name())?;
        info!("Deleted photo {:?} from gallery {}", photo.name, photo.gallery);
        Ok(Some(photo))
    }

    /// Rename a photo; the id and the file extension stay the same
    pub fn rename(&self, gallery_id: &str, photo_id: &str, new_name: &str) -> Result<Option<Photo>> {
        validate_photo_name(new_name)?;
        let Some(photo) = self.find(gallery_id, photo_id)? else {
            return Ok(None);
        };
        // without an extension of its own, a dot in the new name would be
        // read back as one and truncate the display name
        if Path::new(photo.stored_name()).extension().is_none() && new_name.contains('.') {
            return Err(GalleryError::InvalidName(format!(
                "{:?} has a dot but {:?} has no extension to keep",
                new_name, photo.name
            )));
        }

        let stem = format!("{}_{}", photo.id, new_name);
        let stored = self.store().rename_file(&photo.gallery, photo.stored_name(), &stem)?;
        info!("Renamed photo {:?} -> {:?}", photo.name, new_name);

        Ok(Photo::from_stored(&photo.gallery, &stored))
    }

    /// Ask the tagger what is in a photo
    ///
    /// Never fails: an unknown photo, an unreadable file or a failed
    /// inference all come back as no tags.
    pub async fn tag(&self, gallery_id: &str, photo_id: &str) -> Vec<String> {
        match self.find(gallery_id, photo_id) {
            Ok(Some(photo)) => self.tag_photo(&photo).await,
            Ok(None) => {
                debug!("No photo {} in gallery {} to tag", photo_id, gallery_id);
                Vec::new()
            }
            Err(e) => {
                warn!("Cannot list gallery {} for tagging: {}", gallery_id, e);
                Vec::new()
            }
        }
    }

    async fn tag_photo(&self, photo: &Photo) -> Vec<String> {
        let bytes = match self.store().read_file(&photo.gallery, photo.stored_name()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read {} for tagging: {}", photo.file, e);
                return Vec::new();
            }
        };

        match self.tagger.infer(&bytes).await {
            Ok(tags) => {
                debug!("Tagged {} with {:?}", photo.file, tags);
                tags
            }
            Err(e) => {
                warn!("Tag inference failed for {}: {}", photo.file, e);
                Vec::new()
            }
        }
    }

    /// Copy a file into a gallery under a fresh photo id
    ///
    /// Returns `None` when the gallery does not exist.
    pub fn upload(&self, gallery: &Gallery, source: &Path) -> Result<Option<Photo>> {
        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| GalleryError::InvalidName(format!("no usable filename in {:?}", source)))?;
        let Some(stored) = self.stored_name_for(gallery, filename)? else {
            return Ok(None);
        };

        self.store().copy_into(&gallery.id, source, &stored)?;
        info!("Uploaded {:?} to gallery {:?}", filename, gallery.name);
        Ok(Photo::from_stored(&gallery.id, &stored))
    }

    /// Store raw bytes as a new photo
    ///
    /// Only the last path component of `filename` is kept.
    pub fn upload_bytes(&self, gallery: &Gallery, filename: &str, bytes: &[u8]) -> Result<Option<Photo>> {
        let Some(stored) = self.stored_name_for(gallery, filename)? else {
            return Ok(None);
        };

        self.store().write_into(&gallery.id, &stored, bytes)?;
        info!("Uploaded {:?} ({} bytes) to gallery {:?}", filename, bytes.len(), gallery.name);
        Ok(Photo::from_stored(&gallery.id, &stored))
    }

    fn stored_name_for(&self, gallery: &Gallery, filename: &str) -> Result<Option<String>> {
        let base = filename.rsplit(['/', '\\']).next().unwrap_or_default().trim();
        validate_photo_name(base)?;
        if self.galleries.find(&gallery.id).is_none() {
            debug!("Upload target gallery {} not found", gallery.id);
            return Ok(None);
        }
        Ok(Some(format!("{}_{}", Uuid::new_v4().simple(), base)))
    }
}

fn validate_photo_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GalleryError::InvalidName("photo name is empty".to_string()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(GalleryError::InvalidName(format!("{:?} is not a plain file name", name)));
    }
    Ok(())
}
