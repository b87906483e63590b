//! Attachment media types and previews.

use std::{io::Cursor, path::Path};

use image::{ImageFormat, ImageReader};

use crate::Attachment;

/// Media type used when the extension is unknown or the declared one is
/// unusable.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Infer a media type from a file extension.
pub fn infer(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => FALLBACK_MEDIA_TYPE,
    }
}

/// Final path component, or `"attachment"` if the path has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| "attachment".to_string(), |name| name.to_string_lossy().into_owned())
}

/// Normalize a declared media type to lowercase `type/subtype`.
///
/// Parameters (`; charset=...`) are dropped. `None` if the value is not a
/// media type at all.
pub fn normalize(declared: &str) -> Option<String> {
    let essence = declared.split(';').next().unwrap_or_default().trim();
    let (kind, subtype) = essence.split_once('/')?;

    let valid = |part: &str| {
        !part.is_empty()
            && part.chars().all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    if !valid(kind) || !valid(subtype) {
        return None;
    }

    Some(essence.to_ascii_lowercase())
}

/// Displayable view of an attachment, built when the viewer opens it and
/// dropped when it closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Sender
    pub username: String,
    /// Original filename
    pub filename: String,
    /// Media type
    pub media_type: String,
    /// Size in bytes
    pub size: usize,
    /// Pixel dimensions (width, height). `None` if the bytes could not be
    /// decoded as the declared type.
    pub dimensions: Option<(u32, u32)>,
}

impl Preview {
    /// Decode enough of the attachment to describe it.
    pub fn decode(attachment: &Attachment) -> Self {
        let dimensions = dimensions(&attachment.data, &attachment.media_type);
        if dimensions.is_none() {
            tracing::warn!(
                filename = %attachment.filename,
                media_type = %attachment.media_type,
                "attachment is not a decodable image"
            );
        }

        Self {
            username: attachment.username.clone(),
            filename: attachment.filename.clone(),
            media_type: attachment.media_type.clone(),
            size: attachment.data.len(),
            dimensions,
        }
    }
}

fn dimensions(data: &[u8], media_type: &str) -> Option<(u32, u32)> {
    let reader = match ImageFormat::from_mime_type(media_type) {
        Some(format) => ImageReader::with_format(Cursor::new(data), format),
        None => ImageReader::new(Cursor::new(data)).with_guessed_format().ok()?,
    };
    reader.into_dimensions().ok()
}
