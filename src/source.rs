use std::path::Path;

use anyhow::{Context, Result};

const FALLBACK_MIME: &str = "application/octet-stream";

/// An image picked or dropped by the user. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Reads a file from disk, sniffing the MIME type from its header.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = sniff_mime(&bytes);
        Ok(Self::new(name, mime, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Drop filter: only `image/*` files are taken from a drag-and-drop.
/// Files chosen through the picker dialog are not filtered.
pub fn accepts_drop(mime: &str) -> bool {
    mime.starts_with("image/")
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_accepts_drop_only_images() {
        assert!(accepts_drop("image/png"));
        assert!(accepts_drop("image/jpeg"));
        assert!(!accepts_drop("application/pdf"));
        assert!(!accepts_drop(""));
        assert!(!accepts_drop("text/image/png"));
    }

    #[test]
    fn test_from_path_sniffs_mime_and_name() {
        let mut img = image::RgbImage::new(4, 4);
        img.put_pixel(1, 1, image::Rgb([200, 10, 10]));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holiday.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(png.get_ref())
            .unwrap();

        let source = SourceImage::from_path(&path).unwrap();
        assert_eq!(source.name(), "holiday.png");
        assert_eq!(source.mime(), "image/png");
        assert_eq!(source.size(), png.get_ref().len() as u64);
    }

    #[test]
    fn test_from_path_unknown_bytes_are_still_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"plain text").unwrap();

        let source = SourceImage::from_path(&path).unwrap();
        assert_eq!(source.mime(), FALLBACK_MIME);
        assert_eq!(source.size(), 10);
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SourceImage::from_path(&dir.path().join("missing.jpg")).is_err());
    }
}
