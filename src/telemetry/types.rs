use serde::Serialize;

/// Which recovery strategy produced the GPS points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtractionMethod {
    /// Sample table walk with KLV parsing
    Structured,
    /// Sample table walk, with at least one sample re-synchronized on a container tag
    Resync,
    /// Stream extracted by the external demuxer
    External,
    /// Chunked byte scan of the whole file
    FullScan,
}

/// Position fix with its synthesized timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Seconds from the start of the video
    pub timestamp: f64,
    pub accuracy: Option<f64>,
}

/// Ground speed at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedSample {
    /// Meters per second
    pub speed: f64,
    /// Seconds from the start of the video
    pub timestamp: f64,
    pub is_anomaly: bool,
}

impl SpeedSample {
    pub fn new(speed: f64, timestamp: f64) -> Self {
        SpeedSample {
            speed,
            timestamp,
            is_anomaly: false,
        }
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed * 3.6
    }
}

/// Telemetry recovered from one video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telemetry {
    pub gps_points: Vec<GpsPoint>,
    pub speed_samples: Vec<SpeedSample>,
    pub timestamps: Vec<f64>,
    /// Seconds the timestamps were spread over
    pub duration: f64,
    pub method: ExtractionMethod,
}

/// Origin of a highlight marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HighlightKind {
    Manual,
    Automated,
    Fusion,
}

/// A moment of interest marked in the file
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Highlight {
    /// Seconds from the start of the video
    pub timestamp: f64,
    pub kind: HighlightKind,
    pub confidence: Option<f64>,
}

impl Highlight {
    pub fn manual_from_millis(millis: u32) -> Self {
        Highlight {
            timestamp: millis as f64 / 1000.0,
            kind: HighlightKind::Manual,
            confidence: None,
        }
    }
}
