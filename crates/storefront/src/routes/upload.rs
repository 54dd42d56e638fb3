//! Multipart form reading for pages with image uploads.

use axum::{body::Bytes, extract::Multipart};

use crate::error::Result;

/// Body limit for routes that accept an image: the 5 MB image plus the
/// text fields around it.
pub const UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

/// Body limit for the book forms, which carry a cover and a batch of
/// gallery images.
pub const PRODUCT_BODY_LIMIT: usize = 4 * UPLOAD_BODY_LIMIT;

/// A file part from a multipart body.
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// The file parts of a multipart body, keyed by field name.
#[derive(Default)]
pub struct UploadedFiles {
    files: Vec<(String, UploadedFile)>,
}

impl UploadedFiles {
    /// The first file chosen for `field`.
    pub fn take(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|(name, _)| name == field)?;
        Some(self.files.remove(index).1)
    }

    /// Every file chosen for `field`, in upload order.
    pub fn take_all(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition::<Vec<_>, _>(|(name, _)| name == field);
        self.files = rest;
        taken.into_iter().map(|(_, file)| file).collect()
    }
}

/// Read every part of a multipart body.
///
/// Text parts go to `set`. Parts carrying a filename are collected as
/// files; an empty file input (no file chosen) is skipped.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a malformed body.
pub async fn read_multipart(
    mut multipart: Multipart,
    mut set: impl FnMut(&str, String),
) -> Result<UploadedFiles> {
    let mut files = UploadedFiles::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if let Some(filename) = field.file_name().map(str::to_owned) {
            let bytes = field.bytes().await?;
            if !filename.is_empty() && !bytes.is_empty() {
                files.files.push((name, UploadedFile { filename, bytes }));
            }
        } else {
            let value = field.text().await?;
            set(&name, value);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_owned(),
            bytes: Bytes::from_static(b"img"),
        }
    }

    #[test]
    fn test_files_are_taken_by_field() {
        let mut files = UploadedFiles {
            files: vec![
                ("gallery_image".to_owned(), file("a.jpg")),
                ("cover_image".to_owned(), file("cover.png")),
                ("gallery_image".to_owned(), file("b.jpg")),
            ],
        };

        let gallery = files.take_all("gallery_image");
        assert_eq!(
            gallery.iter().map(|f| f.filename.as_str()).collect::<Vec<_>>(),
            ["a.jpg", "b.jpg"]
        );
        assert_eq!(files.take("cover_image").map(|f| f.filename), Some("cover.png".to_owned()));
        assert!(files.take("cover_image").is_none());
        assert!(files.take_all("gallery_image").is_empty());
    }
}
