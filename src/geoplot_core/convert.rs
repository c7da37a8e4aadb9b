//! Degree/minute/second to signed decimal degree conversion.
//!
//! Source formats always store angle magnitudes as non-negative values and carry
//! the sign separately as a hemisphere reference (`N`/`S`/`E`/`W`). EXIF stores
//! the magnitude as three rationals, camcorder sidecars as a `"D:M:S"` string;
//! both are normalized to `(degrees, minutes, seconds)` before the sign is applied.

use crate::geoplot_core::error::ExtractionError;

type Result<T> = std::result::Result<T, ExtractionError>;

/// Hemisphere reference accompanying a latitude or longitude magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Parse a reference given either as text (`"S"`) or as raw EXIF bytes (`b"S\0"`).
    ///
    /// Trailing NULs and surrounding whitespace are ignored and the letter is
    /// case-insensitive, so `"W"`, `b"W"` and `b"w\0"` all mean West.
    pub fn from_ref<R: AsRef<[u8]>>(reference: R) -> Result<Self> {
        let raw = reference.as_ref();
        let trimmed: Vec<u8> = raw
            .iter()
            .copied()
            .filter(|b| *b != 0 && !b.is_ascii_whitespace())
            .collect();

        match trimmed.as_slice() {
            [b] => match b.to_ascii_uppercase() {
                b'N' => Ok(Hemisphere::North),
                b'S' => Ok(Hemisphere::South),
                b'E' => Ok(Hemisphere::East),
                b'W' => Ok(Hemisphere::West),
                _ => Err(invalid_hemisphere(raw)),
            },
            _ => Err(invalid_hemisphere(raw)),
        }
    }

    /// South and West are negative.
    pub fn is_negative(self) -> bool {
        matches!(self, Hemisphere::South | Hemisphere::West)
    }

    /// Largest magnitude allowed on this axis.
    pub fn limit(self) -> f64 {
        match self {
            Hemisphere::North | Hemisphere::South => 90.0,
            Hemisphere::East | Hemisphere::West => 180.0,
        }
    }
}

fn invalid_hemisphere(raw: &[u8]) -> ExtractionError {
    ExtractionError::InvalidHemisphere(format!("{:?}", String::from_utf8_lossy(raw)))
}

/// Altitude reference flag: `0` above sea level, `1` below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AltitudeRef {
    #[default]
    AboveSeaLevel,
    BelowSeaLevel,
}

impl AltitudeRef {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(AltitudeRef::AboveSeaLevel),
            1 => Some(AltitudeRef::BelowSeaLevel),
            _ => None,
        }
    }

    /// Sign a non-negative altitude magnitude.
    pub fn apply(self, magnitude: f64) -> f64 {
        match self {
            AltitudeRef::AboveSeaLevel => magnitude,
            AltitudeRef::BelowSeaLevel => -magnitude,
        }
    }
}

/// An angle as stored by a source format, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAngularValue {
    /// EXIF style: `(numerator, denominator)` for degrees, minutes and seconds.
    Rational([(u32, u32); 3]),
    /// Sidecar style: `"D:M:S"`.
    Colon(String),
}

impl RawAngularValue {
    /// Normalize to `(degrees, minutes, seconds)`.
    pub fn to_dms(&self) -> Result<(f64, f64, f64)> {
        match self {
            RawAngularValue::Rational([d, m, s]) => {
                Ok((rational_to_f64(*d)?, rational_to_f64(*m)?, rational_to_f64(*s)?))
            }
            RawAngularValue::Colon(value) => split_colon_angle(value),
        }
    }

    /// Convert to signed decimal degrees using `hemisphere_ref`.
    pub fn to_decimal_degrees<R: AsRef<[u8]>>(&self, hemisphere_ref: R) -> Result<f64> {
        let (degrees, minutes, seconds) = self.to_dms()?;
        to_decimal_degrees(degrees, minutes, seconds, hemisphere_ref)
    }
}

/// Convert a degree/minute/second triple to signed decimal degrees.
///
/// The sign comes only from `hemisphere_ref`; the components must be finite
/// and non-negative. The result is range-checked against the axis implied by
/// the reference (±90 for N/S, ±180 for E/W) and never clamped.
pub fn to_decimal_degrees<R: AsRef<[u8]>>(
    degrees: f64,
    minutes: f64,
    seconds: f64,
    hemisphere_ref: R,
) -> Result<f64> {
    for (name, component) in [("degrees", degrees), ("minutes", minutes), ("seconds", seconds)] {
        if !component.is_finite() || component < 0.0 {
            return Err(ExtractionError::InvalidAngle(format!(
                "{} must be a non-negative number, got {}",
                name, component
            )));
        }
    }

    let hemisphere = Hemisphere::from_ref(hemisphere_ref)?;
    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;

    if magnitude > hemisphere.limit() {
        return Err(ExtractionError::CoordinateOutOfRange {
            value: magnitude,
            limit: hemisphere.limit(),
        });
    }

    Ok(if hemisphere.is_negative() { -magnitude } else { magnitude })
}

/// Convert a `"D:M:S"` string to signed decimal degrees.
pub fn colon_to_decimal_degrees<R: AsRef<[u8]>>(value: &str, hemisphere_ref: R) -> Result<f64> {
    let (degrees, minutes, seconds) = split_colon_angle(value)?;
    to_decimal_degrees(degrees, minutes, seconds, hemisphere_ref)
}

/// Signed latitude from a raw angle; the reference must be `N` or `S`.
pub fn latitude<R: AsRef<[u8]>>(value: &RawAngularValue, reference: R) -> Result<f64> {
    on_axis(value, reference, false)
}

/// Signed longitude from a raw angle; the reference must be `E` or `W`.
pub fn longitude<R: AsRef<[u8]>>(value: &RawAngularValue, reference: R) -> Result<f64> {
    on_axis(value, reference, true)
}

fn on_axis<R: AsRef<[u8]>>(value: &RawAngularValue, reference: R, east_west: bool) -> Result<f64> {
    let hemisphere = Hemisphere::from_ref(reference.as_ref())?;
    let is_east_west = matches!(hemisphere, Hemisphere::East | Hemisphere::West);
    if is_east_west != east_west {
        let axis = if east_west { "longitude" } else { "latitude" };
        return Err(ExtractionError::InvalidHemisphere(format!(
            "{:?} is not a {} reference",
            hemisphere, axis
        )));
    }
    value.to_decimal_degrees(reference)
}

/// Apply an altitude reference code to an optional magnitude.
///
/// A missing magnitude is `0.0` and a missing code means above sea level.
/// Codes other than 0/1 leave the altitude unusable, so it falls back to `0.0`.
pub fn signed_altitude(magnitude: Option<f64>, reference_code: Option<u32>) -> f64 {
    let magnitude = magnitude.unwrap_or(0.0);
    match reference_code.map(AltitudeRef::from_code) {
        None => AltitudeRef::default().apply(magnitude),
        Some(Some(reference)) => reference.apply(magnitude),
        Some(None) => {
            log::warn!(
                "Unknown altitude reference {:?}, discarding altitude {}",
                reference_code,
                magnitude
            );
            0.0
        }
    }
}

/// Divide an EXIF rational. A zero denominator is an invalid angle.
pub fn rational_to_f64((num, denom): (u32, u32)) -> Result<f64> {
    if denom == 0 {
        return Err(ExtractionError::InvalidAngle(format!("{}/0 has a zero denominator", num)));
    }
    Ok(num as f64 / denom as f64)
}

fn split_colon_angle(value: &str) -> Result<(f64, f64, f64)> {
    let parts: Vec<&str> = value.trim().split(':').collect();
    let [d, m, s] = parts.as_slice() else {
        return Err(ExtractionError::InvalidAngle(format!(
            "expected D:M:S, got {:?}",
            value
        )));
    };

    Ok((parse_component(d, value)?, parse_component(m, value)?, parse_component(s, value)?))
}

fn parse_component(part: &str, whole: &str) -> Result<f64> {
    let parsed: f64 = part.trim().parse().map_err(|_| {
        ExtractionError::InvalidAngle(format!("{:?} is not a number in {:?}", part, whole))
    })?;

    if !parsed.is_finite() || parsed < 0.0 {
        return Err(ExtractionError::InvalidAngle(format!(
            "{:?} is not a non-negative number in {:?}",
            part, whole
        )));
    }
    Ok(parsed)
}
