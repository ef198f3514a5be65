// Binary Upload Sink - external collaborator behind a trait
// The rules engine only ever sees an opaque stored-object reference

use crate::error::VoteError;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// 10 MiB, matching the upload limit of the hosted backend.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// An image as received from the transport, before it is persisted.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Check the upload constraints, returning every reason the image is
/// unacceptable. Emptiness is checked separately (`MissingImage`).
pub fn validate_image(upload: &ImageUpload) -> Vec<String> {
    let mut errors = Vec::new();

    if !upload.content_type.starts_with("image/") {
        errors.push("Only image files are allowed".to_string());
    }
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        errors.push("Image must be at most 10 MB".to_string());
    }

    errors
}

/// Reference to a stored binary: the object name plus the URL clients use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub file_name: String,
    pub url: String,
}

/// Where uploaded images actually go. A failed `store` must leave nothing
/// the rules engine could mistake for a committed upload.
pub trait ImageStore: Send + Sync {
    fn store(&self, upload: &ImageUpload) -> Result<StoredImage, VoteError>;

    /// Best-effort removal; callers log failures and move on.
    fn delete(&self, file_name: &str) -> Result<()>;
}

// ============================================================================
// DISK STORE
// ============================================================================

/// Writes images into a local uploads directory, served back under a public
/// URL prefix. Object names are `outfit-<uuid>.<ext>`.
pub struct DiskImageStore {
    dir: PathBuf,
    public_prefix: String,
}

impl DiskImageStore {
    /// Create the store, making sure the uploads directory exists.
    pub fn new(dir: impl Into<PathBuf>, public_prefix: &str) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create upload directory {:?}", dir))?;

        Ok(DiskImageStore {
            dir,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    fn object_name(original_name: &str) -> String {
        let ext = std::path::Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        format!("outfit-{}.{}", uuid::Uuid::new_v4(), ext)
    }
}

impl ImageStore for DiskImageStore {
    fn store(&self, upload: &ImageUpload) -> Result<StoredImage, VoteError> {
        let file_name = Self::object_name(&upload.original_name);
        let path = self.dir.join(&file_name);

        fs::write(&path, &upload.bytes)
            .map_err(|e| VoteError::StorageWrite(e.to_string()))?;

        Ok(StoredImage {
            url: format!("{}/{}", self.public_prefix, file_name),
            file_name,
        })
    }

    fn delete(&self, file_name: &str) -> Result<()> {
        let path = self.dir.join(file_name);
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete stored image {:?}", path))
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Keeps images in a map. Used by tests and handy for ephemeral deployments.
#[derive(Default)]
pub struct MemoryImageStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.files.lock().unwrap().contains_key(file_name)
    }
}

impl ImageStore for MemoryImageStore {
    fn store(&self, upload: &ImageUpload) -> Result<StoredImage, VoteError> {
        let file_name = DiskImageStore::object_name(&upload.original_name);
        self.files
            .lock()
            .unwrap()
            .insert(file_name.clone(), upload.bytes.clone());

        Ok(StoredImage {
            url: format!("memory://{}", file_name),
            file_name,
        })
    }

    fn delete(&self, file_name: &str) -> Result<()> {
        self.files.lock().unwrap().remove(file_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg_upload(bytes: Vec<u8>) -> ImageUpload {
        ImageUpload {
            original_name: "photo.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes,
        }
    }

    #[test]
    fn test_validate_image_accepts_normal_jpeg() {
        assert!(validate_image(&jpeg_upload(vec![0xff, 0xd8, 0xff])).is_empty());
    }

    #[test]
    fn test_validate_image_rejects_non_image_and_oversize() {
        let pdf = ImageUpload {
            original_name: "resume.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: vec![1, 2, 3],
        };
        let errors = validate_image(&pdf);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("image files"));

        let huge = jpeg_upload(vec![0; MAX_IMAGE_BYTES + 1]);
        let errors = validate_image(&huge);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("10 MB"));
    }

    #[test]
    fn test_object_name_keeps_extension() {
        let name = DiskImageStore::object_name("selfie.PNG");
        assert!(name.starts_with("outfit-"));
        assert!(name.ends_with(".PNG"));

        // No extension falls back to .bin
        assert!(DiskImageStore::object_name("selfie").ends_with(".bin"));
    }

    #[test]
    fn test_disk_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path(), "/uploads/").unwrap();

        let stored = store.store(&jpeg_upload(vec![1, 2, 3])).unwrap();
        assert!(stored.url.starts_with("/uploads/outfit-"));
        assert_eq!(
            std::fs::read(dir.path().join(&stored.file_name)).unwrap(),
            vec![1, 2, 3]
        );

        store.delete(&stored.file_name).unwrap();
        assert!(!dir.path().join(&stored.file_name).exists());
        // Deleting again reports the failure instead of panicking
        assert!(store.delete(&stored.file_name).is_err());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryImageStore::new();
        let stored = store.store(&jpeg_upload(vec![9])).unwrap();

        assert!(store.contains(&stored.file_name));
        assert_eq!(store.file_count(), 1);

        store.delete(&stored.file_name).unwrap();
        assert_eq!(store.file_count(), 0);
    }
}
