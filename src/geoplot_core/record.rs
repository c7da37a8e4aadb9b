use crate::geoplot_core::error::ExtractionError;
use crate::geoplot_core::media::MediaFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Date format used in EXIF `DateTime` fields.
const EXIF_DATE_FORMAT: &[time::format_description::FormatItem] =
    time::macros::format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");

/// A signed 3D fix. Altitude is metres relative to sea level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GeoLocation {
    /// Build a fix, rejecting coordinates outside the valid ranges.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Result<Self, ExtractionError> {
        if !latitude.is_finite() || latitude.abs() > 90.0 {
            return Err(ExtractionError::CoordinateOutOfRange { value: latitude, limit: 90.0 });
        }
        if !longitude.is_finite() || longitude.abs() > 180.0 {
            return Err(ExtractionError::CoordinateOutOfRange { value: longitude, limit: 180.0 });
        }
        if !altitude.is_finite() {
            return Err(ExtractionError::InvalidAltitude(altitude.to_string()));
        }

        Ok(GeoLocation {
            latitude,
            longitude,
            altitude,
        })
    }
}

/// Canonical per-file result. Created once by an extractor and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaGeoRecord {
    source_path: PathBuf,
    format: MediaFormat,
    creation_timestamp: Option<String>,
    geolocation: Option<GeoLocation>,
}

impl MediaGeoRecord {
    pub fn new(
        source_path: PathBuf,
        format: MediaFormat,
        creation_timestamp: Option<String>,
        geolocation: Option<GeoLocation>,
    ) -> Self {
        MediaGeoRecord {
            source_path,
            format,
            creation_timestamp,
            geolocation,
        }
    }

    /// A record for a file that opened but carries no usable metadata.
    pub fn empty(source_path: PathBuf, format: MediaFormat) -> Self {
        MediaGeoRecord::new(source_path, format, None, None)
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn format(&self) -> MediaFormat {
        self.format
    }

    /// Creation time exactly as the container stored it.
    pub fn creation_timestamp(&self) -> Option<&str> {
        self.creation_timestamp.as_deref()
    }

    pub fn geolocation(&self) -> Option<GeoLocation> {
        self.geolocation
    }

    pub fn has_geolocation(&self) -> bool {
        self.geolocation.is_some()
    }

    /// Parsed creation time, if the stored string is RFC 3339 or an EXIF date.
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        self.creation_timestamp.as_deref().and_then(parse_creation_timestamp)
    }
}

/// Parse an RFC 3339 timestamp or an EXIF `YYYY:MM:DD hh:mm:ss` date.
/// EXIF dates carry no offset and are taken as UTC.
pub fn parse_creation_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim().trim_end_matches('\0');
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(dt);
    }

    match PrimitiveDateTime::parse(value, EXIF_DATE_FORMAT) {
        Ok(dt) => Some(dt.assume_utc()),
        Err(e) => {
            log::debug!("Unparseable creation timestamp {:?}: {}", value, e);
            None
        }
    }
}
