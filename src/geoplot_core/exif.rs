//! Geodata derivation shared by the EXIF-family extractors (JPEG, HEIC).
//!
//! The containers differ only in how the EXIF block is located; once the block
//! is parsed, fields are classified through a fixed tag table and the same
//! derivation produces the canonical record.

use crate::geoplot_core::convert::{self, RawAngularValue};
use crate::geoplot_core::error::ExtractionError;
use crate::geoplot_core::media::MediaFormat;
use crate::geoplot_core::record::{GeoLocation, MediaGeoRecord};
use exif::{Context, Exif, Field, In, Value};
use std::io::{BufRead, Seek};
use std::path::Path;

/// EXIF fields this crate understands. Everything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeoTag {
    LatitudeRef,
    Latitude,
    LongitudeRef,
    Longitude,
    AltitudeRef,
    Altitude,
    DateTime,
    DateTimeOriginal,
}

/// Map an EXIF tag (IFD context + number) to a recognized field.
fn classify(context: Context, number: u16) -> Option<GeoTag> {
    match (context, number) {
        (Context::Gps, 0x0001) => Some(GeoTag::LatitudeRef),
        (Context::Gps, 0x0002) => Some(GeoTag::Latitude),
        (Context::Gps, 0x0003) => Some(GeoTag::LongitudeRef),
        (Context::Gps, 0x0004) => Some(GeoTag::Longitude),
        (Context::Gps, 0x0005) => Some(GeoTag::AltitudeRef),
        (Context::Gps, 0x0006) => Some(GeoTag::Altitude),
        (Context::Tiff, 0x0132) => Some(GeoTag::DateTime),
        (Context::Exif, 0x9003) => Some(GeoTag::DateTimeOriginal),
        _ => None,
    }
}

/// Recognized fields collected from the primary image's directories.
#[derive(Debug, Default, Clone)]
pub struct ExifGeoFields {
    pub latitude: Option<Value>,
    pub latitude_ref: Option<Vec<u8>>,
    pub longitude: Option<Value>,
    pub longitude_ref: Option<Vec<u8>>,
    pub altitude: Option<Value>,
    pub altitude_ref: Option<u32>,
    pub date_time: Option<String>,
    pub date_time_original: Option<String>,
}

impl ExifGeoFields {
    pub fn from_exif(exif: &Exif) -> Self {
        Self::from_fields(exif.fields())
    }

    /// Single pass over the fields. Thumbnail IFDs are skipped.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Self {
        let mut collected = ExifGeoFields::default();

        for field in fields {
            if field.ifd_num != In::PRIMARY {
                continue;
            }
            let Some(tag) = classify(field.tag.context(), field.tag.number()) else {
                continue;
            };

            match tag {
                GeoTag::Latitude => collected.latitude = Some(field.value.clone()),
                GeoTag::LatitudeRef => collected.latitude_ref = ascii_bytes(&field.value),
                GeoTag::Longitude => collected.longitude = Some(field.value.clone()),
                GeoTag::LongitudeRef => collected.longitude_ref = ascii_bytes(&field.value),
                GeoTag::Altitude => collected.altitude = Some(field.value.clone()),
                GeoTag::AltitudeRef => collected.altitude_ref = field.value.get_uint(0),
                GeoTag::DateTime => collected.date_time = ascii_string(&field.value),
                GeoTag::DateTimeOriginal => {
                    collected.date_time_original = ascii_string(&field.value)
                }
            }
        }

        collected
    }

    /// Creation time: `DateTime`, falling back to `DateTimeOriginal`.
    pub fn creation_timestamp(&self) -> Option<String> {
        self.date_time
            .clone()
            .or_else(|| self.date_time_original.clone())
    }

    /// Derive the signed fix, or `None` when latitude or longitude is missing.
    pub fn geolocation(&self) -> Result<Option<GeoLocation>, ExtractionError> {
        let (Some(lat_value), Some(lon_value)) = (&self.latitude, &self.longitude) else {
            return Ok(None);
        };

        let lat_ref = self.latitude_ref.as_deref().ok_or_else(|| {
            ExtractionError::InvalidHemisphere("GPSLatitudeRef is missing".to_string())
        })?;
        let lon_ref = self.longitude_ref.as_deref().ok_or_else(|| {
            ExtractionError::InvalidHemisphere("GPSLongitudeRef is missing".to_string())
        })?;

        let latitude = convert::latitude(&rational_triplet(lat_value)?, lat_ref)?;
        let longitude = convert::longitude(&rational_triplet(lon_value)?, lon_ref)?;

        let magnitude = self.altitude.as_ref().map(altitude_magnitude).transpose()?;
        let altitude = convert::signed_altitude(magnitude, self.altitude_ref);

        GeoLocation::new(latitude, longitude, altitude).map(Some)
    }
}

/// Build the canonical record from an already-parsed set of fields.
pub fn derive_record(
    path: &Path,
    format: MediaFormat,
    fields: &ExifGeoFields,
) -> Result<MediaGeoRecord, ExtractionError> {
    let geolocation = fields.geolocation()?;
    if geolocation.is_none() {
        log::debug!("No GPS fix in {}", path.display());
    }

    Ok(MediaGeoRecord::new(
        path.to_path_buf(),
        format,
        fields.creation_timestamp(),
        geolocation,
    ))
}

/// Parse the EXIF block from a container reader and derive the record.
///
/// A container without an EXIF block yields an empty record rather than an error.
pub fn extract_from_container<R: BufRead + Seek>(
    path: &Path,
    format: MediaFormat,
    reader: &mut R,
) -> Result<MediaGeoRecord, ExtractionError> {
    match read_exif_block(path, reader) {
        Ok(exif) => derive_record(path, format, &ExifGeoFields::from_exif(&exif)),
        Err(ExtractionError::NoMetadataBlock(_)) => {
            log::debug!("No EXIF block in {}", path.display());
            Ok(MediaGeoRecord::empty(path.to_path_buf(), format))
        }
        Err(e) => Err(e),
    }
}

fn read_exif_block<R: BufRead + Seek>(path: &Path, reader: &mut R) -> Result<Exif, ExtractionError> {
    match exif::Reader::new().read_from_container(reader) {
        Ok(exif) => Ok(exif),
        Err(exif::Error::NotFound(_)) => Err(ExtractionError::NoMetadataBlock(path.to_path_buf())),
        Err(exif::Error::Io(e)) => Err(ExtractionError::io(path, e)),
        Err(e) => Err(ExtractionError::unreadable(path, e.to_string())),
    }
}

fn rational_triplet(value: &Value) -> Result<RawAngularValue, ExtractionError> {
    match value {
        Value::Rational(parts) if parts.len() >= 3 => Ok(RawAngularValue::Rational([
            (parts[0].num, parts[0].denom),
            (parts[1].num, parts[1].denom),
            (parts[2].num, parts[2].denom),
        ])),
        other => Err(ExtractionError::InvalidAngle(format!(
            "expected three rationals, got {:?}",
            other
        ))),
    }
}

fn altitude_magnitude(value: &Value) -> Result<f64, ExtractionError> {
    match value {
        Value::Rational(parts) if !parts.is_empty() => {
            convert::rational_to_f64((parts[0].num, parts[0].denom))
                .map_err(|e| ExtractionError::InvalidAltitude(e.to_string()))
        }
        other => Err(ExtractionError::InvalidAltitude(format!(
            "expected a rational, got {:?}",
            other
        ))),
    }
}

fn ascii_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Ascii(strings) => strings.first().cloned(),
        Value::Byte(bytes) => Some(bytes.clone()),
        _ => None,
    }
}

fn ascii_string(value: &Value) -> Option<String> {
    let bytes = ascii_bytes(value)?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.trim_end_matches('\0').trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
