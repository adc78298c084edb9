use crate::errors::TelemetryResult;
use crate::gpmf::klv::{parse_klv, parse_range, DEVC, STRM};
use crate::gpmf::{points_from_forest, RawGpsPoint};
use crate::mp4::trak::TelemetryTrack;
use crate::pipeline::cancel::CancellationToken;
use crate::streams::seekable_stream::SeekableStream;
use log::{debug, warn};

/// Samples larger than this are corrupt index entries, not metadata payloads
const MAX_SAMPLE_SIZE: u32 = 64 * 1024 * 1024;

/// Points recovered from one sample buffer
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SampleParse {
    pub points: Vec<RawGpsPoint>,
    /// The plain parse found nothing and container-tag resync did
    pub resynced: bool,
}

/// Parse one metadata sample.
///
/// The buffer is parsed as a KLV forest first. When that yields no points,
/// every occurrence of a device or stream container tag is tried as a new
/// parse origin and the results are concatenated in buffer order.
pub fn parse_sample(buf: &[u8]) -> SampleParse {
    let points = points_from_forest(&parse_klv(buf));
    if !points.is_empty() {
        return SampleParse {
            points,
            resynced: false,
        };
    }

    let points = resync_points(buf);
    SampleParse {
        resynced: !points.is_empty(),
        points,
    }
}

fn container_tag_offsets(buf: &[u8]) -> Vec<usize> {
    buf.windows(4)
        .enumerate()
        .filter(|(_, w)| *w == DEVC || *w == STRM)
        .map(|(i, _)| i)
        .collect()
}

fn resync_points(buf: &[u8]) -> Vec<RawGpsPoint> {
    let mut points = Vec::new();
    // Matches inside an already parsed forest would report its points twice
    let mut covered_until = 0usize;

    for offset in container_tag_offsets(buf) {
        if offset < covered_until {
            continue;
        }
        let forest = parse_range(buf, offset, buf.len());
        let found = points_from_forest(&forest);
        if found.is_empty() {
            continue;
        }
        debug!("Resync at offset {} recovered {} points", offset, found.len());
        // Trailing garbage parses as an oversized leaf; only containers count
        covered_until = forest
            .iter()
            .filter(|e| e.header.is_container())
            .map(|e| e.end().min(buf.len()))
            .max()
            .unwrap_or(offset + 1);
        points.extend(found);
    }
    points
}

/// Result of walking a telemetry track sample by sample
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StructuredOutcome {
    pub points: Vec<RawGpsPoint>,
    /// At least one sample needed resync to yield its points
    pub resynced: bool,
    pub samples_read: usize,
}

/// Read every sample of the telemetry track and parse it.
///
/// Samples that point outside the source or cannot be read are skipped.
/// Cancellation is checked before each sample.
pub fn extract_structured<S: SeekableStream>(
    stream: &mut S,
    track: &TelemetryTrack,
    cancel: &CancellationToken,
) -> TelemetryResult<StructuredOutcome> {
    let source_len = stream.stream_len()?;
    let mut outcome = StructuredOutcome::default();
    let mut buf = Vec::new();

    for range in track.sample_table.sample_ranges() {
        cancel.check()?;
        if range.size == 0 {
            continue;
        }
        if range.size > MAX_SAMPLE_SIZE {
            warn!(
                "Sample {} declares {} bytes, skipping",
                range.index, range.size
            );
            continue;
        }
        let end = range.offset.saturating_add(range.size as u64);
        if end > source_len {
            warn!(
                "Sample {} at {}..{} lies past the end of the source ({} bytes)",
                range.index, range.offset, end, source_len
            );
            continue;
        }

        buf.resize(range.size as usize, 0);
        if let Err(e) = stream.read_exact_at(range.offset, &mut buf) {
            warn!("Failed to read sample {}: {}", range.index, e);
            continue;
        }
        outcome.samples_read += 1;

        let parsed = parse_sample(&buf);
        outcome.resynced |= parsed.resynced;
        outcome.points.extend(parsed.points);
    }

    debug!(
        "Structured walk read {} of {} samples, {} points",
        outcome.samples_read,
        track.sample_table.sample_count(),
        outcome.points.len()
    );
    Ok(outcome)
}
