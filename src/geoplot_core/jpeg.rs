use crate::geoplot_core::error::ExtractionError;
use crate::geoplot_core::exif::extract_from_container;
use crate::geoplot_core::extractor::{ExtractLimits, FormatExtractor, check_pixels, open_guarded};
use crate::geoplot_core::media::MediaFormat;
use crate::geoplot_core::record::MediaGeoRecord;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

/// Extracts geodata from EXIF blocks embedded in JPEG files.
#[derive(Debug, Clone, Default)]
pub struct JpegExtractor {
    limits: ExtractLimits,
}

impl JpegExtractor {
    pub fn new(limits: ExtractLimits) -> Self {
        Self { limits }
    }
}

impl FormatExtractor for JpegExtractor {
    fn format(&self) -> MediaFormat {
        MediaFormat::Jpeg
    }

    fn extract(&self, path: &Path) -> Result<MediaGeoRecord, ExtractionError> {
        let mut reader = open_guarded(path, &self.limits)?;

        let probe = probe_jpeg(&mut reader).map_err(|reason| ExtractionError::unreadable(path, reason))?;
        if let Some((width, height)) = probe {
            check_pixels(path, width, height, &self.limits)?;
        }

        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| ExtractionError::io(path, e))?;
        extract_from_container(path, MediaFormat::Jpeg, &mut reader)
    }
}

/// Check the JPEG signature and walk segment headers up to the first scan.
///
/// Returns the frame dimensions from the first SOF segment, if one appears
/// before the image data. Only headers are read.
fn probe_jpeg<R: Read + Seek>(reader: &mut R) -> Result<Option<(u32, u32)>, String> {
    let mut signature = [0u8; 2];
    reader
        .read_exact(&mut signature)
        .map_err(|_| "file too short for a JPEG signature".to_string())?;
    if signature != [0xFF, 0xD8] {
        return Err("not a JPEG file".to_string());
    }

    loop {
        let prefix = match read_byte(reader) {
            Ok(byte) => byte,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.to_string()),
        };
        if prefix != 0xFF {
            return Err(format!("invalid segment marker prefix {:02X}", prefix));
        }

        // Any number of 0xFF fill bytes may precede the marker code
        let mut code = 0xFF;
        while code == 0xFF {
            code = read_byte(reader).map_err(|e| e.to_string())?;
        }

        match code {
            // End of image or start of scan: no more headers
            0xD9 | 0xDA => return Ok(None),
            0xD8 | 0x01 => continue,
            0xD0..=0xD7 => continue,
            code => {
                let mut len_bytes = [0u8; 2];
                reader.read_exact(&mut len_bytes).map_err(|e| e.to_string())?;
                let segment_len = u16::from_be_bytes(len_bytes) as i64;
                if segment_len < 2 {
                    return Err(format!("segment {:02X} has invalid length {}", code, segment_len));
                }

                if is_start_of_frame(code) {
                    let mut header = [0u8; 5];
                    reader.read_exact(&mut header).map_err(|e| e.to_string())?;
                    let height = u16::from_be_bytes([header[1], header[2]]) as u32;
                    let width = u16::from_be_bytes([header[3], header[4]]) as u32;
                    return Ok(Some((width, height)));
                }

                reader
                    .seek(SeekFrom::Current(segment_len - 2))
                    .map_err(|e| e.to_string())?;
            }
        }
    }
}

fn read_byte<R: Read>(reader: &mut R) -> std::io::Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// SOF0..SOF15, excluding DHT (C4), JPG (C8) and DAC (CC).
fn is_start_of_frame(code: u8) -> bool {
    (0xC0..=0xCF).contains(&code) && !matches!(code, 0xC4 | 0xC8 | 0xCC)
}
