use crate::geoplot_core::cli::OutputFormat;
use crate::geoplot_core::error::{GeoplotError, Result};
use crate::geoplot_core::media::MediaFormat;
use crate::geoplot_core::record::MediaGeoRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;

/// Normalized, format-agnostic collection of geotagged records.
///
/// Only records with a geolocation are ever stored. Row order carries no
/// meaning; `source_path` identifies a row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalTable {
    records: Vec<MediaGeoRecord>,
}

const CSV_HEADER: [&str; 6] = ["path", "format", "creationdate", "latitude", "longitude", "altitude"];

/// Flat row shape used for CSV output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub path: String,
    pub format: MediaFormat,
    pub creationdate: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl CanonicalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Records without a geolocation are refused.
    pub fn push(&mut self, record: MediaGeoRecord) -> bool {
        if !record.has_geolocation() {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Concatenate another table onto this one.
    pub fn append(&mut self, mut other: CanonicalTable) {
        self.records.append(&mut other.records);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaGeoRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&MediaGeoRecord> {
        self.records.iter().find(|r| r.source_path() == path)
    }

    pub fn rows(&self) -> Vec<TableRow> {
        self.records
            .iter()
            .filter_map(|r| {
                let fix = r.geolocation()?;
                Some(TableRow {
                    path: r.source_path().display().to_string(),
                    format: r.format(),
                    creationdate: r.creation_timestamp().map(str::to_string),
                    latitude: fix.latitude,
                    longitude: fix.longitude,
                    altitude: fix.altitude,
                })
            })
            .collect()
    }

    /// Mean latitude and longitude, used to centre a map.
    pub fn centre(&self) -> Option<(f64, f64)> {
        if self.records.is_empty() {
            return None;
        }
        let (lat_sum, lon_sum) = self
            .records
            .iter()
            .filter_map(|r| r.geolocation())
            .fold((0.0, 0.0), |(lat, lon), fix| (lat + fix.latitude, lon + fix.longitude));
        let n = self.records.len() as f64;
        Some((lat_sum / n, lon_sum / n))
    }

    /// Order by parsed creation time; undated records go last, ties by path.
    pub fn sort_chronologically(&mut self) {
        self.records.sort_by(|a, b| match (a.created_at(), b.created_at()) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.source_path().cmp(b.source_path())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.source_path().cmp(b.source_path()),
        });
    }
}

impl Extend<MediaGeoRecord> for CanonicalTable {
    fn extend<I: IntoIterator<Item = MediaGeoRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

impl FromIterator<MediaGeoRecord> for CanonicalTable {
    fn from_iter<I: IntoIterator<Item = MediaGeoRecord>>(iter: I) -> Self {
        let mut table = CanonicalTable::new();
        table.extend(iter);
        table
    }
}

impl IntoIterator for CanonicalTable {
    type Item = MediaGeoRecord;
    type IntoIter = std::vec::IntoIter<MediaGeoRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Render the table in the requested output format.
pub fn format_table(table: &CanonicalTable, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Paths => Ok(table
            .iter()
            .map(|r| r.source_path().display().to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(table)?),
        OutputFormat::Csv => {
            // Header written by hand so an empty table still has one
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(Vec::new());
            writer.write_record(CSV_HEADER)?;
            for row in table.rows() {
                writer.serialize(row)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| GeoplotError::Io(e.into_error()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        OutputFormat::Table => {
            let mut output = String::new();
            output.push_str(&format!(
                "{:<40} {:>5} {:>20} {:>11} {:>11} {:>9}\n",
                "Filename", "Type", "Date", "Latitude", "Longitude", "Altitude"
            ));
            output.push_str(&format!("{}\n", "─".repeat(101)));
            for row in table.rows() {
                let filename = Path::new(&row.path)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| row.path.clone());
                output.push_str(&format!(
                    "{:<40} {:>5} {:>20} {:>11.6} {:>11.6} {:>9.1}\n",
                    truncate_str(&filename, 40),
                    row.format.as_str(),
                    truncate_str(row.creationdate.as_deref().unwrap_or("-"), 20),
                    row.latitude,
                    row.longitude,
                    row.altitude
                ));
            }
            output.push_str(&format!("\nTotal: {} files", table.len()));
            Ok(output)
        }
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
