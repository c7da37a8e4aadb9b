#![allow(dead_code)]

use assert_fs::TempDir;
use assert_fs::prelude::*;
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use std::io::Cursor;
use std::path::PathBuf;

/// GPS block written into generated JPEG fixtures.
pub struct GpsFix {
    pub latitude: [(u32, u32); 3],
    pub latitude_ref: &'static str,
    pub longitude: [(u32, u32); 3],
    pub longitude_ref: &'static str,
    pub altitude: Option<(u32, u32)>,
    pub altitude_ref: Option<u8>,
}

/// 45°4'8.7"N 5°7'22.8"E, 212 m above sea level.
pub fn alpine_fix() -> GpsFix {
    GpsFix {
        latitude: [(45, 1), (4, 1), (87, 10)],
        latitude_ref: "N",
        longitude: [(5, 1), (7, 1), (228, 10)],
        longitude_ref: "E",
        altitude: Some((212, 1)),
        altitude_ref: Some(0),
    }
}

fn rationals(values: &[(u32, u32)]) -> Value {
    Value::Rational(
        values
            .iter()
            .map(|&(num, denom)| Rational { num, denom })
            .collect(),
    )
}

fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// Serialize EXIF fields into a minimal JPEG: SOI, APP1 "Exif", SOF0, EOI.
pub fn exif_jpeg(fix: Option<&GpsFix>, date_time: Option<&str>) -> Vec<u8> {
    let mut fields = vec![field(Tag::Make, ascii("GeoplotTest"))];
    if let Some(date) = date_time {
        fields.push(field(Tag::DateTime, ascii(date)));
    }
    if let Some(fix) = fix {
        fields.push(field(Tag::GPSLatitudeRef, ascii(fix.latitude_ref)));
        fields.push(field(Tag::GPSLatitude, rationals(&fix.latitude)));
        fields.push(field(Tag::GPSLongitudeRef, ascii(fix.longitude_ref)));
        fields.push(field(Tag::GPSLongitude, rationals(&fix.longitude)));
        if let Some(code) = fix.altitude_ref {
            fields.push(field(Tag::GPSAltitudeRef, Value::Byte(vec![code])));
        }
        if let Some(altitude) = fix.altitude {
            fields.push(field(Tag::GPSAltitude, rationals(&[altitude])));
        }
    }

    let mut writer = Writer::new();
    for f in &fields {
        writer.push_field(f);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1];
    bytes.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    bytes.extend_from_slice(b"Exif\0\0");
    bytes.extend_from_slice(&tiff);
    // SOF0, 16x16, three components
    bytes.extend_from_slice(&[
        0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x10, 0x03, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1,
    ]);
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

/// An ISO-BMFF `ftyp` box with a HEIC brand and nothing else.
pub fn bare_heic() -> Vec<u8> {
    let mut bytes = vec![0, 0, 0, 20];
    bytes.extend_from_slice(b"ftyp");
    bytes.extend_from_slice(b"heic");
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(b"mif1");
    bytes
}

/// Camcorder NonRealTimeMeta sidecar carrying `items` in its GPS group.
pub fn sidecar_xml(creation_date: &str, items: &[(&str, &str)]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <NonRealTimeMeta xmlns=\"urn:schemas-professionalDisc:nonRealTimeMeta:ver.2.00\">\n\
         \t<CreationDate value=\"{}\"/>\n\
         \t<AcquisitionRecord>\n\
         \t\t<Group name=\"ExifGPS\">\n",
        creation_date
    );
    for (name, value) in items {
        xml.push_str(&format!("\t\t\t<Item name=\"{}\" value=\"{}\"/>\n", name, value));
    }
    xml.push_str("\t\t</Group>\n\t</AcquisitionRecord>\n</NonRealTimeMeta>\n");
    xml
}

/// Lay out the three-file batch: a geotagged JPEG, a HEIC without EXIF and a
/// sidecar above sea level. Returns the media directory.
pub fn mixed_batch(temp_dir: &TempDir) -> PathBuf {
    let media = temp_dir.child("media");
    media.create_dir_all().unwrap();

    media
        .child("IMG_0001.JPG")
        .write_binary(&exif_jpeg(Some(&alpine_fix()), Some("2023:08:14 09:12:55")))
        .unwrap();
    media.child("IMG_0002.HEIC").write_binary(&bare_heic()).unwrap();
    media
        .child("clips/C0001M01.XML")
        .write_str(&sidecar_xml(
            "2021-07-12T10:23:45+02:00",
            &[
                ("LatitudeRef", "N"),
                ("Latitude", "46:12:0"),
                ("LongitudeRef", "E"),
                ("Longitude", "6:9:0"),
                ("AltitudeRef", "0"),
                ("Altitude", "850"),
            ],
        ))
        .unwrap();
    media.child("clips/C0001.MTS").write_binary(&[0x47; 188]).unwrap();

    media.path().to_path_buf()
}
