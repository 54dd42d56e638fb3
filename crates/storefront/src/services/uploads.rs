//! Image uploads for book covers, gallery images, author and profile photos.
//!
//! Files are written under `MEDIA_DIR` with random names and served from
//! `/media`. Stored paths are the public URL path, e.g.
//! `/media/covers/5f0c….jpg`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image extensions, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// URL prefix the media directory is served under.
pub const MEDIA_URL_PREFIX: &str = "/media/";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image must be less than 5MB.")]
    TooLarge,

    #[error("Unsupported file format. Please upload JPG, PNG, GIF, or WebP.")]
    UnsupportedType,

    #[error("could not store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an upload belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    BookCover,
    BookImage,
    AuthorPhoto,
    ProfilePhoto,
}

impl MediaKind {
    const ALL: [Self; 4] = [
        Self::BookCover,
        Self::BookImage,
        Self::AuthorPhoto,
        Self::ProfilePhoto,
    ];

    const fn dir(self) -> &'static str {
        match self {
            Self::BookCover => "covers",
            Self::BookImage => "book_images",
            Self::AuthorPhoto => "author_images",
            Self::ProfilePhoto => "profile_photos",
        }
    }
}

/// Check size and extension, returning the normalized extension.
///
/// # Errors
///
/// Returns `UploadError::TooLarge` or `UploadError::UnsupportedType`.
pub fn validate_image(filename: &str, len: usize) -> Result<&'static str, UploadError> {
    if len > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge);
    }
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or(UploadError::UnsupportedType)?;
    IMAGE_EXTENSIONS
        .iter()
        .find(|allowed| **allowed == extension)
        .copied()
        .ok_or(UploadError::UnsupportedType)
}

/// Filesystem-backed media storage.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and write an image, returning its public path.
    ///
    /// # Errors
    ///
    /// Returns a validation error or the I/O error from writing.
    pub async fn save_image(
        &self,
        kind: MediaKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        let extension = validate_image(filename, bytes.len())?;
        let name = format!("{}.{extension}", Uuid::new_v4().simple());

        let dir = self.root.join(kind.dir());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), bytes).await?;

        tracing::info!(kind = kind.dir(), file = %name, size = bytes.len(), "Image stored");
        Ok(format!("{MEDIA_URL_PREFIX}{}/{name}", kind.dir()))
    }

    /// Remove a previously stored image. Unknown paths are ignored.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!(path = %path.display(), "Image removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not remove image"),
        }
    }

    /// Map a public path back onto the media directory.
    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let relative = public_path.strip_prefix(MEDIA_URL_PREFIX)?;
        let mut parts = relative.split('/');
        let (Some(dir), Some(file), None) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };
        let known_dir = MediaKind::ALL.iter().any(|k| k.dir() == dir);
        if !known_dir || file.is_empty() || file.starts_with('.') || file.contains('\\') {
            return None;
        }
        Some(self.root.join(dir).join(file))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_image_extensions() {
        assert_eq!(validate_image("cover.JPG", 10).unwrap(), "jpg");
        assert_eq!(validate_image("me.webp", 10).unwrap(), "webp");
        assert!(matches!(
            validate_image("notes.pdf", 10),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            validate_image("noextension", 10),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[test]
    fn test_validate_image_size_limit() {
        assert!(validate_image("a.png", MAX_IMAGE_BYTES).is_ok());
        assert!(matches!(
            validate_image("a.png", MAX_IMAGE_BYTES + 1),
            Err(UploadError::TooLarge)
        ));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = MediaStore::new(PathBuf::from("/srv/media"));
        assert_eq!(
            store.resolve("/media/covers/abc.jpg"),
            Some(PathBuf::from("/srv/media/covers/abc.jpg"))
        );
        assert!(store.resolve("/media/covers/../../etc/passwd").is_none());
        assert_eq!(
            store.resolve("/media/author_images/me.png"),
            Some(PathBuf::from("/srv/media/author_images/me.png"))
        );
        assert!(store.resolve("/media/other/abc.jpg").is_none());
        assert!(store.resolve("/static/images/placeholder-book.svg").is_none());
    }

    #[tokio::test]
    async fn test_save_then_remove() {
        let root = std::env::temp_dir().join(format!("bookbazar-media-{}", Uuid::new_v4()));
        let store = MediaStore::new(root.clone());
        let path = store
            .save_image(MediaKind::ProfilePhoto, "me.png", b"\x89PNG")
            .await
            .unwrap();
        assert!(path.starts_with("/media/profile_photos/"));
        let on_disk = store.resolve(&path).unwrap();
        assert!(on_disk.exists());

        store.remove(&path).await;
        assert!(!on_disk.exists());
        let _ = std::fs::remove_dir_all(root);
    }
}
