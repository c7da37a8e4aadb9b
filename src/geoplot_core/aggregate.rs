use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::geoplot_core::error::{ExtractionError, GeoplotError, Result};
use crate::geoplot_core::extractor::{ExtractLimits, FormatExtractor};
use crate::geoplot_core::heic::HeicExtractor;
use crate::geoplot_core::jpeg::JpegExtractor;
use crate::geoplot_core::media::{MediaFormat, detect_media_format, has_extension};
use crate::geoplot_core::record::MediaGeoRecord;
use crate::geoplot_core::sidecar::XmlSidecarExtractor;
use crate::geoplot_core::table::CanonicalTable;
use crate::geoplot_core::workers::run_extraction_pool;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Worker threads; 0 means one per CPU.
    pub jobs: usize,
    /// Draw a progress bar on stderr.
    pub progress: bool,
    pub limits: ExtractLimits,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            progress: false,
            limits: ExtractLimits::default(),
        }
    }
}

/// Why a file did not make it into the table.
#[derive(Debug)]
pub enum SkipReason {
    NoGeodata,
    Failed(ExtractionError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoGeodata => write!(f, "no geodata"),
            SkipReason::Failed(e) => write!(f, "{}: {}", e.kind(), e),
        }
    }
}

#[derive(Debug)]
pub struct SkipNotice {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Dispatches candidate files to the extractor registered for their format
/// and collects every geotagged result into one table.
pub struct GeoAggregator {
    extractors: Vec<Box<dyn FormatExtractor>>,
    config: AggregatorConfig,
}

impl GeoAggregator {
    /// Aggregator with the JPEG, HEIC and XML sidecar extractors registered.
    pub fn new(config: AggregatorConfig) -> Self {
        let limits = config.limits;
        let extractors: Vec<Box<dyn FormatExtractor>> = vec![
            Box::new(JpegExtractor::new(limits)),
            Box::new(HeicExtractor::new(limits)),
            Box::new(XmlSidecarExtractor::new(limits)),
        ];
        Self::with_extractors(config, extractors)
    }

    pub fn with_extractors(config: AggregatorConfig, extractors: Vec<Box<dyn FormatExtractor>>) -> Self {
        Self { extractors, config }
    }

    pub fn extractor_for(&self, format: MediaFormat) -> Option<&dyn FormatExtractor> {
        self.extractors
            .iter()
            .find(|e| e.format() == format)
            .map(|e| &**e)
    }

    /// Extract every file whose extension matches `extension` and keep the
    /// records that carry a geolocation.
    pub fn aggregate(&self, files: &[PathBuf], extension: &str) -> CanonicalTable {
        self.aggregate_with_diagnostics(files, extension).0
    }

    /// Same as [`aggregate`](Self::aggregate), also returning a notice for
    /// every matching file that was left out.
    pub fn aggregate_with_diagnostics(
        &self,
        files: &[PathBuf],
        extension: &str,
    ) -> (CanonicalTable, Vec<SkipNotice>) {
        let mut table = CanonicalTable::new();
        let mut skipped = Vec::new();

        let Some(format) = MediaFormat::from_extension(extension.trim_start_matches('.')) else {
            log::warn!("No extractor handles .{} files", extension);
            return (table, skipped);
        };
        let Some(extractor) = self.extractor_for(format) else {
            log::warn!("No extractor registered for {}", format);
            return (table, skipped);
        };

        let mut seen = HashSet::new();
        let candidates: Vec<PathBuf> = files
            .iter()
            .filter(|p| has_extension(p, extension))
            .filter(|p| seen.insert(p.to_path_buf()))
            .cloned()
            .collect();

        if candidates.is_empty() {
            log::info!("No .{} files to process", extension);
            return (table, skipped);
        }
        log::info!("Extracting {} .{} files as {}", candidates.len(), extension, format);

        let bar = self.progress_bar(candidates.len() as u64);
        let mut results = run_extraction_pool(extractor, candidates.clone(), self.config.jobs, &bar);
        bar.finish_and_clear();

        for path in candidates {
            let reason = match results.remove(&path) {
                Some(Ok(record)) if record.has_geolocation() => {
                    table.push(record);
                    continue;
                }
                Some(Ok(_)) => SkipReason::NoGeodata,
                Some(Err(e)) => SkipReason::Failed(e),
                None => {
                    log::error!("Worker pool returned no result for {}", path.display());
                    continue;
                }
            };

            match &reason {
                SkipReason::NoGeodata => log::info!("Skipping {}: {}", path.display(), reason),
                SkipReason::Failed(_) => log::warn!("Skipping {}: {}", path.display(), reason),
            }
            skipped.push(SkipNotice { path, reason });
        }

        log::info!(
            ".{}: {} records with geodata, {} skipped",
            extension,
            table.len(),
            skipped.len()
        );
        (table, skipped)
    }

    /// Run the extractor matching `path` on that one file.
    pub fn extract_one(&self, path: &Path) -> Result<MediaGeoRecord> {
        let extractor = detect_media_format(path)
            .and_then(|format| self.extractor_for(format))
            .ok_or_else(|| GeoplotError::UnsupportedFile(path.to_path_buf()))?;
        Ok(extractor.extract(path)?)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        ProgressBar::new(len).with_style(style)
    }
}
