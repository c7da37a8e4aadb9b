use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crossbeam_channel::unbounded;
use indicatif::ProgressBar;

use crate::geoplot_core::{ExtractionError, FormatExtractor, MediaGeoRecord};

/// Outcome of running one file through its extractor.
pub type FileResult = Result<MediaGeoRecord, ExtractionError>;

/// Run a single file through `extractor`.
pub fn process_media_file(extractor: &dyn FormatExtractor, path: &Path) -> FileResult {
    log::debug!("Extracting {} as {}", path.display(), extractor.format());
    let result = extractor.extract(path);

    match &result {
        Ok(record) => log::debug!(
            "{}: timestamp {:?}, geolocation {:?}",
            path.display(),
            record.creation_timestamp(),
            record.geolocation()
        ),
        Err(e) => log::warn!("Failed to extract {}: {}", path.display(), e),
    }

    result
}

/// Resolve a requested worker count; zero means one per CPU.
pub fn worker_count(jobs: usize) -> usize {
    if jobs == 0 { num_cpus::get() } else { jobs }
}

/// Extract every path on a pool of `jobs` workers fed through a channel.
///
/// The queue is filled and closed before any worker starts. Results arrive in
/// completion order, so they are keyed by path.
pub fn run_extraction_pool(
    extractor: &dyn FormatExtractor,
    paths: Vec<PathBuf>,
    jobs: usize,
    bar: &ProgressBar,
) -> HashMap<PathBuf, FileResult> {
    let num_workers = worker_count(jobs).min(paths.len().max(1));
    let (job_tx, job_rx) = unbounded::<PathBuf>();
    let (result_tx, result_rx) = unbounded::<(PathBuf, FileResult)>();

    for path in paths {
        if job_tx.send(path).is_err() {
            log::error!("Failed to queue job for workers");
            break;
        }
    }
    drop(job_tx);

    rayon::scope(|s| {
        for _ in 0..num_workers {
            let job_rx_clone = job_rx.clone();
            let result_tx_clone = result_tx.clone();
            let bar_clone = bar.clone();

            s.spawn(move |_| {
                for path in job_rx_clone {
                    let result = process_media_file(extractor, &path);
                    bar_clone.inc(1);
                    if result_tx_clone.send((path, result)).is_err() {
                        log::error!("Failed to send result to main thread");
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    result_rx.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoplot_core::{GeoLocation, MediaFormat};

    /// Marks every path containing "gps" as geotagged and fails on "bad".
    struct FakeExtractor;

    impl FormatExtractor for FakeExtractor {
        fn format(&self) -> MediaFormat {
            MediaFormat::Jpeg
        }

        fn extract(&self, path: &Path) -> FileResult {
            let name = path.to_string_lossy();
            if name.contains("bad") {
                return Err(ExtractionError::unreadable(path, "fake failure"));
            }
            let fix = name
                .contains("gps")
                .then(|| GeoLocation::new(1.0, 2.0, 3.0).unwrap());
            Ok(MediaGeoRecord::new(path.to_path_buf(), MediaFormat::Jpeg, None, fix))
        }
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(3), 3);
        assert!(worker_count(0) >= 1);
    }

    #[test]
    fn test_pool_returns_every_path() {
        let paths: Vec<PathBuf> = (0..50)
            .map(|i| match i % 3 {
                0 => PathBuf::from(format!("/m/{}_gps.jpg", i)),
                1 => PathBuf::from(format!("/m/{}_plain.jpg", i)),
                _ => PathBuf::from(format!("/m/{}_bad.jpg", i)),
            })
            .collect();

        let results = run_extraction_pool(&FakeExtractor, paths.clone(), 4, &ProgressBar::hidden());
        assert_eq!(results.len(), paths.len());

        for path in &paths {
            let result = &results[path];
            let name = path.to_string_lossy();
            if name.contains("bad") {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref().unwrap().has_geolocation(), name.contains("gps"));
            }
        }
    }

    #[test]
    fn test_pool_finishes_on_a_single_thread() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            let paths: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("/m/{}_gps.jpg", i))).collect();
            let results = pool.install(|| run_extraction_pool(&FakeExtractor, paths, 3, &ProgressBar::hidden()));
            let _ = done_tx.send(results.len());
        });

        let count = done_rx
            .recv_timeout(std::time::Duration::from_secs(20))
            .expect("extraction pool did not finish on a one-thread pool");
        assert_eq!(count, 5);
    }

    #[test]
    fn test_pool_with_no_paths() {
        let results = run_extraction_pool(&FakeExtractor, Vec::new(), 0, &ProgressBar::hidden());
        assert!(results.is_empty());
    }
}
