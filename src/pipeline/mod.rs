pub mod cancel;
pub mod config;
pub mod pool;

pub use cancel::CancellationToken;
pub use config::ExtractorConfig;
pub use pool::WorkerPool;

use crate::errors::{TelemetryError, TelemetryResult};
use crate::mp4::udta::extract_highlights;
use crate::speed::{SpeedAnomalyFilter, SpeedStatistics};
use crate::streams::LocalSeekableStream;
use crate::telemetry::extractor::TelemetryExtractor;
use crate::telemetry::types::{Highlight, SpeedSample, Telemetry};
use log::{info, warn};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Everything recovered from one video
#[derive(Debug, Serialize)]
pub struct VideoReport {
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_outcome")]
    pub telemetry: TelemetryResult<Telemetry>,
    pub highlights: Vec<Highlight>,
    /// Filtered and smoothed speed series; empty without telemetry
    pub cleaned_speeds: Vec<SpeedSample>,
    pub statistics: Option<SpeedStatistics>,
}

impl VideoReport {
    fn cancelled(path: PathBuf) -> Self {
        VideoReport {
            path,
            telemetry: Err(TelemetryError::Cancelled),
            highlights: Vec::new(),
            cleaned_speeds: Vec::new(),
            statistics: None,
        }
    }
}

#[derive(Serialize)]
struct FailureReport {
    error: &'static str,
    message: String,
}

fn serialize_outcome<S: Serializer>(
    outcome: &TelemetryResult<Telemetry>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match outcome {
        Ok(telemetry) => telemetry.serialize(serializer),
        Err(e) => FailureReport {
            error: e.kind(),
            message: e.to_string(),
        }
        .serialize(serializer),
    }
}

/// Extract telemetry and highlights from one local video, then clean its
/// speed series. Highlight and telemetry failures do not affect each other.
pub fn process_video(
    path: &Path,
    extractor: &TelemetryExtractor,
    filter: &SpeedAnomalyFilter,
) -> VideoReport {
    let telemetry = extractor.extract_from_path(path, None);
    match &telemetry {
        Ok(t) => info!(
            "{}: {} speed samples via {:?}",
            path.display(),
            t.speed_samples.len(),
            t.method
        ),
        Err(e) if e.is_no_metadata() => info!("{}: {}", path.display(), e),
        Err(e) => warn!("{}: {}", path.display(), e),
    }

    let highlights = match LocalSeekableStream::open(path) {
        Ok(mut stream) => extract_highlights(&mut stream),
        Err(e) => {
            warn!("{}: highlight scan skipped: {}", path.display(), e);
            Vec::new()
        }
    };

    let (cleaned_speeds, statistics) = match &telemetry {
        Ok(t) => {
            let filtered = filter.apply(&t.speed_samples);
            (filtered.cleaned, Some(filtered.statistics))
        }
        Err(_) => (Vec::new(), None),
    };

    VideoReport {
        path: path.to_path_buf(),
        telemetry,
        highlights,
        cleaned_speeds,
        statistics,
    }
}

/// Process videos on a bounded worker pool. Reports come back in input
/// order; videos not started before cancellation report `Cancelled`.
pub fn process_videos(
    paths: Vec<PathBuf>,
    config: &ExtractorConfig,
    cancel: &CancellationToken,
) -> Vec<VideoReport> {
    let extractor = TelemetryExtractor::new(config.clone(), cancel.clone());
    let filter = SpeedAnomalyFilter::default();
    let pool = WorkerPool::new(config.worker_count);
    info!(
        "Processing {} videos on {} workers",
        paths.len(),
        pool.workers()
    );

    let results = pool.run(paths.clone(), cancel, |path| {
        process_video(&path, &extractor, &filter)
    });
    paths
        .into_iter()
        .zip(results)
        .map(|(path, report)| report.unwrap_or_else(|| VideoReport::cancelled(path)))
        .collect()
}
