pub mod r#box;
pub use r#box::{find_box, find_box_path, walk_boxes, Mp4Box};
pub mod moov_finder;
pub use moov_finder::{find_moov_box, read_moov_payload};
pub mod mdhd;
pub use mdhd::parse_mdhd;
pub mod mvhd;
pub mod stco;
pub use stco::parse_stco_or_co64;
pub mod stsz;
pub use stsz::parse_stsz;
pub mod stsc;
pub use stsc::{parse_stsc, SampleToChunkEntry};
pub mod sample_table;
pub use sample_table::{SampleRange, SampleTable};
pub mod stsd;
pub mod trak;
pub use trak::{find_telemetry_track, TelemetryTrack, TrackInfo, TrackKind};
pub mod udta;
pub use udta::extract_highlights;

#[cfg(test)]
mod udta_test;
