use serde::Serialize;
use std::path::Path;

/// Container family a record was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFormat {
    Jpeg,
    Heic,
    XmlSidecar,
}

/// Marker hint for the map renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub colour: &'static str,
    pub icon: &'static str,
}

impl MediaFormat {
    pub const ALL: [MediaFormat; 3] = [MediaFormat::Jpeg, MediaFormat::Heic, MediaFormat::XmlSidecar];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "jpeg",
            MediaFormat::Heic => "heic",
            MediaFormat::XmlSidecar => "xml",
        }
    }

    /// Lowercase extensions routed to this format's extractor.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaFormat::Jpeg => &["jpg", "jpeg"],
            MediaFormat::Heic => &["heic", "heif"],
            MediaFormat::XmlSidecar => &["xml"],
        }
    }

    /// Find the format whose family contains `extension` (case-insensitive).
    pub fn from_extension(extension: &str) -> Option<MediaFormat> {
        MediaFormat::ALL.into_iter().find(|format| {
            format
                .extensions()
                .iter()
                .any(|e| e.eq_ignore_ascii_case(extension))
        })
    }

    pub fn marker_style(&self) -> MarkerStyle {
        match self {
            MediaFormat::Heic => MarkerStyle { colour: "red", icon: "camera" },
            MediaFormat::Jpeg => MarkerStyle { colour: "darkred", icon: "camera" },
            MediaFormat::XmlSidecar => MarkerStyle { colour: "blue", icon: "facetime-video" },
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extensions picked up by discovery (lowercase). Clips are listed so they show
/// up next to their sidecars, but no extractor handles them.
pub const DISCOVERY_EXTENSIONS: &[&str] = &["jpg", "jpeg", "heic", "heif", "mp4", "xml", "mts"];

/// Detect the extractor family for a path from its extension.
pub fn detect_media_format(path: &Path) -> Option<MediaFormat> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(MediaFormat::from_extension)
}

/// Case-insensitive comparison of a path's extension with `extension`.
/// A leading dot on `extension` is ignored.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_formats() {
        assert_eq!(detect_media_format(Path::new("IMG.JPG")), Some(MediaFormat::Jpeg));
        assert_eq!(detect_media_format(Path::new("img.jpg")), Some(MediaFormat::Jpeg));
        assert_eq!(detect_media_format(Path::new("img.jpeg")), Some(MediaFormat::Jpeg));
        assert_eq!(detect_media_format(Path::new("IMG_0001.HEIC")), Some(MediaFormat::Heic));
        assert_eq!(detect_media_format(Path::new("C0001M01.XML")), Some(MediaFormat::XmlSidecar));
    }

    #[test]
    fn test_clips_are_not_routed() {
        assert_eq!(detect_media_format(Path::new("clip.MTS")), None);
        assert_eq!(detect_media_format(Path::new("clip.mp4")), None);
        assert_eq!(detect_media_format(Path::new("noext")), None);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("/a/IMG.JPG"), "jpg"));
        assert!(has_extension(Path::new("/a/img.jpg"), "JPG"));
        assert!(has_extension(Path::new("/a/img.jpg"), ".jpg"));
        assert!(!has_extension(Path::new("/a/img.jpeg"), "jpg"));
        assert!(!has_extension(Path::new("/a/clip.MTS"), "xml"));
    }

    #[test]
    fn test_marker_styles() {
        assert_eq!(MediaFormat::Heic.marker_style().colour, "red");
        assert_eq!(MediaFormat::Jpeg.marker_style().colour, "darkred");
        assert_eq!(MediaFormat::XmlSidecar.marker_style().icon, "facetime-video");
    }
}
