pub mod bits;

pub mod mp4;
pub use mp4::{extract_highlights, TelemetryTrack};

pub mod gpmf;
pub use gpmf::RawGpsPoint;

pub mod streams;
pub use streams::{seekable_stream, LocalSeekableStream, SeekableStream};

pub mod telemetry;
pub use telemetry::{
    ExtractionMethod, GpsPoint, Highlight, HighlightKind, SpeedSample, Telemetry,
    TelemetryExtractor,
};

pub mod speed;
pub use speed::{FilteredSpeeds, SpeedAnomalyFilter, SpeedStatistics};

pub mod pipeline;
pub use pipeline::{process_videos, CancellationToken, ExtractorConfig, VideoReport};

pub mod errors;
pub use errors::{Mp4Error, Mp4Result, OpenError, ParseError, TelemetryError, TelemetryResult};

#[cfg(test)]
mod test_support;

use std::path::Path;

/// Extract telemetry from a local file with default settings.
///
/// `duration` (seconds) overrides the duration recorded in the file.
pub fn extract_telemetry<P: AsRef<Path>>(
    path: P,
    duration: Option<f64>,
) -> TelemetryResult<Telemetry> {
    telemetry::extract_local_telemetry(path, duration)
}

/// Highlight markers of a local file. Unreadable files yield an empty list.
pub fn extract_local_highlights<P: AsRef<Path>>(path: P) -> Vec<Highlight> {
    match LocalSeekableStream::open(path.as_ref()) {
        Ok(mut stream) => extract_highlights(&mut stream),
        Err(e) => {
            log::warn!("{}: {}", path.as_ref().display(), e);
            Vec::new()
        }
    }
}
