use crate::geoplot_core::error::ExtractionError;
use crate::geoplot_core::media::MediaFormat;
use crate::geoplot_core::record::MediaGeoRecord;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Default maximum file size accepted by any extractor (512 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Default maximum pixel count declared by an image header.
pub const DEFAULT_MAX_PIXELS: u64 = 2 * 89_478_485;

/// Guard limits checked synchronously before any metadata parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    pub max_file_size: u64,
    pub max_pixels: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

/// One extractor per supported container.
///
/// `Ok` with `geolocation == None` means the file was readable but carries no
/// usable fix; `Err` means the file itself could not be read as this format.
pub trait FormatExtractor: Send + Sync {
    fn format(&self) -> MediaFormat;

    fn extract(&self, path: &Path) -> Result<MediaGeoRecord, ExtractionError>;
}

/// Open `path` for reading after checking it against the size guard.
pub fn open_guarded(path: &Path, limits: &ExtractLimits) -> Result<BufReader<File>, ExtractionError> {
    let metadata = fs::metadata(path).map_err(|e| ExtractionError::io(path, e))?;

    if !metadata.is_file() {
        return Err(ExtractionError::unreadable(path, "not a regular file"));
    }

    if metadata.len() > limits.max_file_size {
        return Err(ExtractionError::unreadable(
            path,
            format!(
                "file size {} exceeds limit of {} bytes",
                metadata.len(),
                limits.max_file_size
            ),
        ));
    }

    let file = File::open(path).map_err(|e| ExtractionError::io(path, e))?;
    Ok(BufReader::new(file))
}

/// Reject images whose declared dimensions exceed the pixel guard.
pub fn check_pixels(
    path: &Path,
    width: u32,
    height: u32,
    limits: &ExtractLimits,
) -> Result<(), ExtractionError> {
    let pixels = width as u64 * height as u64;
    if pixels > limits.max_pixels {
        return Err(ExtractionError::unreadable(
            path,
            format!(
                "decompression bomb guard: {}x{} ({} pixels) exceeds {}",
                width, height, pixels, limits.max_pixels
            ),
        ));
    }
    Ok(())
}
