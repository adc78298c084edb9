use crate::errors::{OpenError, TelemetryError, TelemetryResult};
use crate::gpmf::RawGpsPoint;
use crate::mp4::moov_finder::read_moov_payload;
use crate::mp4::mvhd::extract_duration_from_mvhd;
use crate::mp4::r#box::find_box;
use crate::mp4::trak::{find_telemetry_track, TelemetryTrack};
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::config::ExtractorConfig;
use crate::streams::seekable_stream::{LocalSeekableStream, SeekableStream};
use crate::telemetry::builder::build_telemetry;
use crate::telemetry::external::extract_external;
use crate::telemetry::raw_scan::RawScanner;
use crate::telemetry::structured::extract_structured;
use crate::telemetry::types::{ExtractionMethod, Telemetry};
use log::{debug, info, warn};
use std::io::SeekFrom;
use std::path::Path;

/// Runs the recovery cascade over one source.
///
/// Strategies run in order and the first one producing a GPS point wins:
/// the sample-table walk (with per-sample resync), the external demuxer
/// (only when no telemetry track could be located), then a chunked scan of
/// the whole source. Each strategy runs at most once.
#[derive(Debug, Clone, Default)]
pub struct TelemetryExtractor {
    config: ExtractorConfig,
    cancel: CancellationToken,
}

/// What the container structure told us before any sample was read
struct ContainerProbe {
    track: Option<TelemetryTrack>,
    movie_duration: Option<f64>,
    /// Set when the structure is present but could not be decoded
    structure_error: Option<TelemetryError>,
}

impl TelemetryExtractor {
    pub fn new(config: ExtractorConfig, cancel: CancellationToken) -> Self {
        TelemetryExtractor { config, cancel }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Open a local file and extract its telemetry.
    ///
    /// `duration` overrides the duration recorded in the file.
    pub fn extract_from_path<P: AsRef<Path>>(
        &self,
        path: P,
        duration: Option<f64>,
    ) -> TelemetryResult<Telemetry> {
        let path = path.as_ref();
        let mut stream = LocalSeekableStream::open(path)
            .map_err(|e| TelemetryError::OpenFailed(OpenError::new(path.display().to_string(), e)))?;
        self.extract_from_stream(&mut stream, duration)
    }

    pub fn extract_from_stream<S: SeekableStream>(
        &self,
        stream: &mut S,
        duration: Option<f64>,
    ) -> TelemetryResult<Telemetry> {
        self.cancel.check()?;
        let probe = probe_container(stream);

        let duration = duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .or(probe.movie_duration)
            .or_else(|| probe.track.as_ref().and_then(|t| t.info.media_duration))
            .unwrap_or(0.0);

        if let Some(track) = &probe.track {
            info!(
                "Telemetry track #{} with {} samples",
                track.info.index,
                track.sample_table.sample_count()
            );
            match extract_structured(stream, track, &self.cancel) {
                Ok(outcome) if !outcome.points.is_empty() => {
                    let method = if outcome.resynced {
                        ExtractionMethod::Resync
                    } else {
                        ExtractionMethod::Structured
                    };
                    return Ok(self.finish(&outcome.points, duration, method));
                }
                Ok(_) => info!("Telemetry track yielded no GPS points"),
                Err(TelemetryError::Cancelled) => return Err(TelemetryError::Cancelled),
                Err(e) => warn!("Sample table walk failed: {}", e),
            }
        } else if self.config.use_external_tools {
            if let Some(path) = stream.source_path().map(Path::to_path_buf) {
                match extract_external(&path, &self.config, &self.cancel) {
                    Ok(points) if !points.is_empty() => {
                        return Ok(self.finish(&points, duration, ExtractionMethod::External));
                    }
                    Ok(_) => debug!("External extraction found nothing"),
                    Err(TelemetryError::Cancelled) => return Err(TelemetryError::Cancelled),
                    Err(e) => warn!("External extraction failed: {}", e),
                }
            }
        }

        info!("Falling back to full-file scan");
        let points = self.full_scan(stream)?;
        if !points.is_empty() {
            return Ok(self.finish(&points, duration, ExtractionMethod::FullScan));
        }

        Err(probe.structure_error.unwrap_or(TelemetryError::NoMetadata))
    }

    fn full_scan<S: SeekableStream>(&self, stream: &mut S) -> TelemetryResult<Vec<RawGpsPoint>> {
        stream.seek(SeekFrom::Start(0))?;
        match RawScanner::from_config(&self.config).scan(stream, &self.cancel) {
            Err(TelemetryError::Cancelled) => Err(TelemetryError::Cancelled),
            Err(e) => {
                warn!("Full-file scan failed: {}", e);
                Ok(Vec::new())
            }
            ok => ok,
        }
    }

    fn finish(&self, points: &[RawGpsPoint], duration: f64, method: ExtractionMethod) -> Telemetry {
        let telemetry = build_telemetry(points, duration, method);
        info!(
            "{:?} extraction: {} speed samples, {} positions over {:.2}s",
            method,
            telemetry.speed_samples.len(),
            telemetry.gps_points.len(),
            telemetry.duration
        );
        telemetry
    }
}

fn probe_container<S: SeekableStream>(stream: &mut S) -> ContainerProbe {
    let moov = match read_moov_payload(stream) {
        Ok(Some(moov)) => moov,
        Ok(None) => {
            debug!("No moov box found");
            return ContainerProbe {
                track: None,
                movie_duration: None,
                structure_error: None,
            };
        }
        Err(e) => {
            warn!("Failed to read moov box: {}", e);
            return ContainerProbe {
                track: None,
                movie_duration: None,
                structure_error: Some(e.into()),
            };
        }
    };

    let movie_duration = find_box(&moov, "mvhd").and_then(extract_duration_from_mvhd);
    match find_telemetry_track(&moov) {
        Ok(track) => ContainerProbe {
            track,
            movie_duration,
            structure_error: None,
        },
        Err(e) => {
            warn!("Telemetry track has unusable index tables: {}", e);
            ContainerProbe {
                track: None,
                movie_duration,
                structure_error: Some(e.into()),
            }
        }
    }
}

/// Extract telemetry from a local file with default settings
pub fn extract_local_telemetry<P: AsRef<Path>>(
    path: P,
    duration: Option<f64>,
) -> TelemetryResult<Telemetry> {
    TelemetryExtractor::default().extract_from_path(path, duration)
}
