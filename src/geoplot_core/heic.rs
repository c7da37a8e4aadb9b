use crate::geoplot_core::error::ExtractionError;
use crate::geoplot_core::exif::extract_from_container;
use crate::geoplot_core::extractor::{ExtractLimits, FormatExtractor, open_guarded};
use crate::geoplot_core::media::MediaFormat;
use crate::geoplot_core::record::MediaGeoRecord;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// HEIF brands accepted in the `ftyp` box.
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"hevm", b"hevs", b"mif1", b"msf1",
];

/// Extracts geodata from the EXIF item of HEIC/HEIF images.
#[derive(Debug, Clone, Default)]
pub struct HeicExtractor {
    limits: ExtractLimits,
}

impl HeicExtractor {
    pub fn new(limits: ExtractLimits) -> Self {
        Self { limits }
    }
}

impl FormatExtractor for HeicExtractor {
    fn format(&self) -> MediaFormat {
        MediaFormat::Heic
    }

    fn extract(&self, path: &Path) -> Result<MediaGeoRecord, ExtractionError> {
        let mut reader = open_guarded(path, &self.limits)?;

        let brand = probe_ftyp(&mut reader).map_err(|reason| ExtractionError::unreadable(path, reason))?;
        log::debug!("{}: HEIF brand {}", path.display(), String::from_utf8_lossy(&brand));

        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| ExtractionError::io(path, e))?;
        extract_from_container(path, MediaFormat::Heic, &mut reader)
    }
}

/// Read the leading ISO-BMFF `ftyp` box and return its major brand.
fn probe_ftyp<R: Read>(reader: &mut R) -> Result<[u8; 4], String> {
    let mut header = [0u8; 12];
    reader
        .read_exact(&mut header)
        .map_err(|_| "file too short for an ftyp box".to_string())?;

    if &header[4..8] != b"ftyp" {
        return Err("not an ISO-BMFF container".to_string());
    }

    let box_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if box_size != 1 && box_size < 12 {
        return Err(format!("ftyp box has invalid size {}", box_size));
    }

    let brand = [header[8], header[9], header[10], header[11]];
    if !HEIF_BRANDS.iter().any(|b| **b == brand) {
        return Err(format!("unsupported brand {:?}", String::from_utf8_lossy(&brand)));
    }

    Ok(brand)
}
