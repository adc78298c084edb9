pub mod gps;
pub mod klv;
pub mod scale;

pub use gps::{points_from_forest, GpsRecordKind, RawGpsPoint};
pub use klv::{parse_klv, KlvBody, KlvElement, KlvHeader};
pub use scale::ScaleVector;
