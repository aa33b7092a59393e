use std::future::Future;

use crate::error::UploadError;

pub const ATTACHMENT_ID_MARKER: &str = "|__aid__:";
pub const ALT_MARKER: &str = "|__alt__:";

/// An upload result string split into its parts.
///
/// Hosts append `|__aid__:<id>` and `|__alt__:<text>` to the returned URL; both suffixes
/// are optional and may come in either order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub attachment_id: Option<String>,
    pub alt: Option<String>,
}

impl UploadedImage {
    pub fn parse(raw: &str) -> Self {
        let aid_at = raw.find(ATTACHMENT_ID_MARKER);
        let alt_at = raw.find(ALT_MARKER);

        let url_end = [aid_at, alt_at].into_iter().flatten().min().unwrap_or(raw.len());
        let suffix = |start: Option<usize>, marker: &str, other: Option<usize>| {
            let start = start?;
            let value_start = start + marker.len();
            let end = other
                .filter(|other| *other > start)
                .unwrap_or(raw.len());
            Some(raw[value_start..end].to_string())
        };

        Self {
            url: raw[..url_end].trim().to_string(),
            attachment_id: suffix(aid_at, ATTACHMENT_ID_MARKER, alt_at)
                .filter(|id| !id.is_empty()),
            alt: suffix(alt_at, ALT_MARKER, aid_at),
        }
    }
}

/// A local image waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Shown while the upload runs, e.g. a blob URL.
    pub preview_src: Option<String>,
}

/// Host-provided upload backend. The returned string may carry the suffixes understood
/// by [`UploadedImage::parse`].
pub trait ImageUploader {
    fn upload(&self, image: PendingImage) -> impl Future<Output = Result<String, UploadError>>;
}
