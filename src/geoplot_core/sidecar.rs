//! Camcorder XML sidecars.
//!
//! The geodata lives in a flat list of `<Item name="..." value="..."/>` elements
//! (`Latitude`, `LatitudeRef`, `Longitude`, ...) with angles written as `"D:M:S"`
//! strings. The recording time is a separate `<CreationDate value="..."/>`.

use crate::geoplot_core::convert::{self, RawAngularValue};
use crate::geoplot_core::error::ExtractionError;
use crate::geoplot_core::extractor::{ExtractLimits, FormatExtractor, open_guarded};
use crate::geoplot_core::media::MediaFormat;
use crate::geoplot_core::record::{GeoLocation, MediaGeoRecord};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::Read;
use std::path::Path;

/// Named values collected from one sidecar document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SidecarItems {
    /// Number of `Latitude` items seen. Zero means no GPS fix was recorded.
    pub latitude_count: usize,
    pub latitude: Option<String>,
    pub latitude_ref: Option<String>,
    pub longitude: Option<String>,
    pub longitude_ref: Option<String>,
    pub altitude: Option<String>,
    pub altitude_ref: Option<String>,
    pub creation_date: Option<String>,
}

impl SidecarItems {
    /// Derive the signed fix from the collected items.
    ///
    /// Each axis is converted with its own reference. A document without
    /// `Latitude` items has no fix and nothing else is parsed.
    pub fn geolocation(&self) -> Result<Option<GeoLocation>, ExtractionError> {
        if self.latitude_count == 0 {
            return Ok(None);
        }

        let (Some(lat), Some(lon)) = (&self.latitude, &self.longitude) else {
            return Ok(None);
        };

        let lat_ref = self.latitude_ref.as_deref().ok_or_else(|| {
            ExtractionError::InvalidHemisphere("LatitudeRef item is missing".to_string())
        })?;
        let lon_ref = self.longitude_ref.as_deref().ok_or_else(|| {
            ExtractionError::InvalidHemisphere("LongitudeRef item is missing".to_string())
        })?;

        let latitude = convert::latitude(&RawAngularValue::Colon(lat.clone()), lat_ref)?;
        let longitude = convert::longitude(&RawAngularValue::Colon(lon.clone()), lon_ref)?;

        let magnitude = self.altitude.as_deref().map(parse_altitude).transpose()?;
        let reference_code = self.altitude_ref.as_deref().map(parse_altitude_ref).transpose()?;
        let altitude = convert::signed_altitude(magnitude, reference_code);

        GeoLocation::new(latitude, longitude, altitude).map(Some)
    }
}

/// Extracts geodata from camcorder XML sidecar files.
#[derive(Debug, Clone, Default)]
pub struct XmlSidecarExtractor {
    limits: ExtractLimits,
}

impl XmlSidecarExtractor {
    pub fn new(limits: ExtractLimits) -> Self {
        Self { limits }
    }
}

impl FormatExtractor for XmlSidecarExtractor {
    fn format(&self) -> MediaFormat {
        MediaFormat::XmlSidecar
    }

    fn extract(&self, path: &Path) -> Result<MediaGeoRecord, ExtractionError> {
        let mut reader = open_guarded(path, &self.limits)?;
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ExtractionError::io(path, e))?;

        let items = parse_sidecar(&bytes).map_err(|reason| ExtractionError::MalformedDocument {
            path: path.to_path_buf(),
            reason,
        })?;
        log::debug!("{}: {:?}", path.display(), items);

        let geolocation = items.geolocation()?;
        Ok(MediaGeoRecord::new(
            path.to_path_buf(),
            MediaFormat::XmlSidecar,
            items.creation_date,
            geolocation,
        ))
    }
}

/// Scan the document once, collecting `Item` values and the `CreationDate`.
pub fn parse_sidecar(xml: &[u8]) -> Result<SidecarItems, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut items = SidecarItems::default();
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut saw_root = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format!("at byte {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(ref e) => {
                saw_root = true;
                depth += 1;
                collect_element(e, &mut items)?;
            }
            Event::Empty(ref e) => {
                saw_root = true;
                collect_element(e, &mut items)?;
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or("unbalanced end tag")?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err("document has no root element".to_string());
    }
    if depth != 0 {
        return Err(format!("{} unclosed element(s) at end of document", depth));
    }

    Ok(items)
}

fn collect_element(element: &BytesStart, items: &mut SidecarItems) -> Result<(), String> {
    match element.local_name().as_ref() {
        b"Item" => {
            let name = attribute(element, b"name")?;
            let value = attribute(element, b"value")?;
            let (Some(name), Some(value)) = (name, value) else {
                return Ok(());
            };
            let value = value.trim().to_string();

            match name.trim() {
                "Latitude" => {
                    items.latitude_count += 1;
                    items.latitude = Some(value);
                }
                "LatitudeRef" => items.latitude_ref = Some(value),
                "Longitude" => items.longitude = Some(value),
                "LongitudeRef" => items.longitude_ref = Some(value),
                "Altitude" => items.altitude = Some(value),
                "AltitudeRef" => items.altitude_ref = Some(value),
                _ => {}
            }
        }
        b"CreationDate" => {
            if let Some(value) = attribute(element, b"value")? {
                items.creation_date = Some(value);
            }
        }
        _ => {}
    }
    Ok(())
}

fn attribute(element: &BytesStart, key: &[u8]) -> Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.local_name().as_ref() == key {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_altitude(value: &str) -> Result<f64, ExtractionError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| ExtractionError::InvalidAltitude(format!("{:?} is not a number", value)))?;
    if !parsed.is_finite() {
        return Err(ExtractionError::InvalidAltitude(format!("{:?} is not finite", value)));
    }
    Ok(parsed)
}

fn parse_altitude_ref(value: &str) -> Result<u32, ExtractionError> {
    value.trim().parse().map_err(|_| {
        ExtractionError::InvalidAltitude(format!("AltitudeRef {:?} is not an integer code", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn sidecar(items: &[(&str, &str)]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<NonRealTimeMeta xmlns="urn:schemas-professionalDisc:nonRealTimeMeta:ver.2.00" lastUpdate="2021-07-12T10:30:00+02:00">
	<CreationDate value="2021-07-12T10:23:45+02:00"/>
	<AcquisitionRecord>
		<Group name="ExifGPS">
"#,
        );
        for (name, value) in items {
            xml.push_str(&format!("\t\t\t<Item name=\"{}\" value=\"{}\"/>\n", name, value));
        }
        xml.push_str("\t\t</Group>\n\t</AcquisitionRecord>\n</NonRealTimeMeta>\n");
        xml
    }

    #[test]
    fn test_full_fix() {
        let xml = sidecar(&[
            ("LatitudeRef", "N"),
            ("Latitude", "45:4:8.7"),
            ("LongitudeRef", "E"),
            ("Longitude", "5:7:22.8"),
            ("AltitudeRef", "0"),
            ("Altitude", "850"),
        ]);
        let items = parse_sidecar(xml.as_bytes()).unwrap();
        assert_eq!(items.creation_date.as_deref(), Some("2021-07-12T10:23:45+02:00"));

        let fix = items.geolocation().unwrap().unwrap();
        assert!((fix.latitude - 45.069083).abs() < 1e-6);
        assert!((fix.longitude - 5.123).abs() < 1e-6);
        assert_eq!(fix.altitude, 850.0);
    }

    #[test]
    fn test_creation_date_is_kept_verbatim() {
        let xml = r#"<NonRealTimeMeta>
	<CreationDate value=" 2021-07-12T10:23:45+02:00 "/>
	<Item name="Latitude" value=" 45:4:8.7 "/>
	<Item name="LatitudeRef" value="N "/>
	<Item name="Longitude" value="5:7:22.8"/>
	<Item name="LongitudeRef" value=" E"/>
</NonRealTimeMeta>"#;
        let items = parse_sidecar(xml.as_bytes()).unwrap();
        assert_eq!(items.creation_date.as_deref(), Some(" 2021-07-12T10:23:45+02:00 "));
        assert_eq!(items.latitude.as_deref(), Some("45:4:8.7"));
        assert_eq!(items.latitude_ref.as_deref(), Some("N"));
        assert!(items.geolocation().unwrap().is_some());
    }

    #[test]
    fn test_no_latitude_items() {
        let xml = sidecar(&[("Status", "V"), ("Longitude", "garbage"), ("Altitude", "x")]);
        let items = parse_sidecar(xml.as_bytes()).unwrap();
        assert_eq!(items.latitude_count, 0);
        // nothing beyond the latitude count is looked at
        assert!(items.geolocation().unwrap().is_none());
    }

    #[test]
    fn test_missing_altitude_defaults_to_zero() {
        let xml = sidecar(&[
            ("LatitudeRef", "N"),
            ("Latitude", "45:4:8.7"),
            ("LongitudeRef", "E"),
            ("Longitude", "5:7:22.8"),
        ]);
        let fix = parse_sidecar(xml.as_bytes()).unwrap().geolocation().unwrap().unwrap();
        assert_eq!(fix.altitude, 0.0);
    }

    #[test]
    fn test_below_sea_level() {
        let xml = sidecar(&[
            ("AltitudeRef", "1"),
            ("LatitudeRef", "N"),
            ("Latitude", "31:30:0"),
            ("LongitudeRef", "E"),
            ("Longitude", "35:28:0"),
            ("Altitude", "120"),
        ]);
        let fix = parse_sidecar(xml.as_bytes()).unwrap().geolocation().unwrap().unwrap();
        assert_eq!(fix.altitude, -120.0);
    }

    #[test]
    fn test_each_axis_uses_its_own_reference() {
        let xml = sidecar(&[
            ("LatitudeRef", "N"),
            ("Latitude", "45:0:0"),
            ("LongitudeRef", "W"),
            ("Longitude", "5:0:0"),
        ]);
        let fix = parse_sidecar(xml.as_bytes()).unwrap().geolocation().unwrap().unwrap();
        assert_eq!(fix.latitude, 45.0);
        assert_eq!(fix.longitude, -5.0);
    }

    #[test]
    fn test_bad_angle_is_invalid_angle() {
        let xml = sidecar(&[
            ("LatitudeRef", "N"),
            ("Latitude", "45:four:8.7"),
            ("LongitudeRef", "E"),
            ("Longitude", "5:7:22.8"),
        ]);
        let err = parse_sidecar(xml.as_bytes()).unwrap().geolocation().unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidAngle(_)));
    }

    #[test]
    fn test_bad_altitude_ref() {
        let xml = sidecar(&[
            ("LatitudeRef", "N"),
            ("Latitude", "45:4:8.7"),
            ("LongitudeRef", "E"),
            ("Longitude", "5:7:22.8"),
            ("AltitudeRef", "below"),
        ]);
        let err = parse_sidecar(xml.as_bytes()).unwrap().geolocation().unwrap_err();
        assert_eq!(err.kind(), "invalid-altitude");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_sidecar(b"<NonRealTimeMeta><Item name=\"Latitude\"></Wrong>").is_err());
        assert!(parse_sidecar(b"<NonRealTimeMeta><AcquisitionRecord>").is_err());
        assert!(parse_sidecar(b"").is_err());
        assert!(parse_sidecar(b"just some text").is_err());
    }

    #[test]
    fn test_extractor_reports_malformed_document() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let file = temp_dir.child("C0001M01.XML");
        file.write_str("<NonRealTimeMeta><Item></NonRealTimeMeta").unwrap();

        let err = XmlSidecarExtractor::default().extract(file.path()).unwrap_err();
        assert_eq!(err.kind(), "malformed-document");
    }

    #[test]
    fn test_extractor_reads_file() {
        let temp_dir = assert_fs::TempDir::new().unwrap();
        let file = temp_dir.child("C0002M01.XML");
        file.write_str(&sidecar(&[
            ("LatitudeRef", "S"),
            ("Latitude", "33:51:21.5"),
            ("LongitudeRef", "E"),
            ("Longitude", "151:12:55.1"),
        ]))
        .unwrap();

        let record = XmlSidecarExtractor::default().extract(file.path()).unwrap();
        assert_eq!(record.format(), MediaFormat::XmlSidecar);
        assert_eq!(record.creation_timestamp(), Some("2021-07-12T10:23:45+02:00"));
        assert!(record.geolocation().unwrap().latitude < 0.0);
    }
}
