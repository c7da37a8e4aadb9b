pub mod aggregate;
pub mod cli;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod exif;
pub mod extractor;
pub mod heic;
pub mod jpeg;
pub mod media;
pub mod record;
pub mod sidecar;
pub mod table;
pub mod workers;

pub use aggregate::{AggregatorConfig, GeoAggregator, SkipNotice, SkipReason};
pub use cli::{Cli, Commands, OutputFormat};
pub use discovery::{discover_media_files, resolve_roots};
pub use error::{ExtractionError, GeoplotError, Result};
pub use extractor::{ExtractLimits, FormatExtractor};
pub use heic::HeicExtractor;
pub use jpeg::JpegExtractor;
pub use media::{MediaFormat, detect_media_format};
pub use record::{GeoLocation, MediaGeoRecord};
pub use sidecar::XmlSidecarExtractor;
pub use table::{CanonicalTable, format_table};
pub use workers::{process_media_file, run_extraction_pool};
