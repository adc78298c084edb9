pub mod builder;
pub mod external;
pub mod extractor;
pub mod raw_scan;
pub mod structured;
pub mod types;

pub use builder::build_telemetry;
pub use extractor::{extract_local_telemetry, TelemetryExtractor};
pub use types::{ExtractionMethod, GpsPoint, Highlight, HighlightKind, SpeedSample, Telemetry};
