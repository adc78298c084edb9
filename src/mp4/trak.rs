use crate::errors::{Mp4Error, Mp4Result};
use crate::mp4::mdhd::media_duration_seconds;
use crate::mp4::r#box::{find_all_boxes, find_box, find_box_path};
use crate::mp4::sample_table::SampleTable;
use crate::mp4::stsd::sample_entry_tags;
use log::debug;

/// Sample-entry tag of the camera's metadata track
pub const TELEMETRY_SAMPLE_ENTRY: &[u8; 4] = b"gpmd";

/// Track role according to its handler box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
    Metadata,
    Other([u8; 4]),
}

impl TrackKind {
    fn from_handler(handler: &[u8]) -> Self {
        match handler {
            b"vide" => TrackKind::Video,
            b"soun" => TrackKind::Audio,
            b"meta" => TrackKind::Metadata,
            other => {
                let mut tag = [0u8; 4];
                tag.copy_from_slice(&other[..4.min(other.len())]);
                TrackKind::Other(tag)
            }
        }
    }

    /// Audio and video tracks carry essence, never telemetry
    pub fn is_essence(&self) -> bool {
        matches!(self, TrackKind::Video | TrackKind::Audio)
    }
}

/// Summary of one trak box
#[derive(Debug, Clone)]
pub struct TrackInfo {
    pub index: usize,
    pub kind: TrackKind,
    pub handler_name: Option<String>,
    pub sample_entries: Vec<[u8; 4]>,
    pub media_duration: Option<f64>,
}

impl TrackInfo {
    pub fn is_telemetry(&self) -> bool {
        !self.kind.is_essence()
            && self
                .sample_entries
                .iter()
                .any(|tag| tag == TELEMETRY_SAMPLE_ENTRY)
    }
}

/// The telemetry track with its decoded index tables
#[derive(Debug, Clone)]
pub struct TelemetryTrack {
    pub info: TrackInfo,
    pub sample_table: SampleTable,
}

/// Extract track info from a trak payload
pub fn extract_track_info(trak: &[u8], index: usize) -> Option<TrackInfo> {
    let mdia = find_box(trak, "mdia")?;

    let (kind, handler_name) = match find_box(mdia, "hdlr") {
        Some(hdlr) if hdlr.len() >= 12 => (
            TrackKind::from_handler(&hdlr[8..12]),
            hdlr.get(24..).and_then(handler_name),
        ),
        _ => (TrackKind::Other(*b"????"), None),
    };

    let sample_entries = find_box_path(mdia, &["minf", "stbl", "stsd"])
        .map(sample_entry_tags)
        .unwrap_or_default();

    Some(TrackInfo {
        index,
        kind,
        handler_name,
        sample_entries,
        media_duration: find_box(mdia, "mdhd").and_then(media_duration_seconds),
    })
}

// Handler names are C strings in MP4 and Pascal strings in QuickTime files.
fn handler_name(raw: &[u8]) -> Option<String> {
    let text: String = String::from_utf8_lossy(raw)
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Every track in a moov payload, in file order
pub fn list_tracks(moov: &[u8]) -> Vec<TrackInfo> {
    find_all_boxes(moov, "trak")
        .into_iter()
        .enumerate()
        .filter_map(|(index, trak)| extract_track_info(trak, index))
        .collect()
}

/// Locate the telemetry track in a moov payload and decode its sample table.
///
/// `Ok(None)` means no track is tagged as telemetry; an error means the track
/// exists but its index tables cannot be decoded.
pub fn find_telemetry_track(moov: &[u8]) -> Mp4Result<Option<TelemetryTrack>> {
    let traks = find_all_boxes(moov, "trak");
    for info in list_tracks(moov) {
        debug!(
            "Track #{}: {:?}, entries {:?}",
            info.index,
            info.kind,
            info.sample_entries
                .iter()
                .map(|t| String::from_utf8_lossy(t).into_owned())
                .collect::<Vec<_>>()
        );
        if !info.is_telemetry() {
            continue;
        }
        let stbl = traks
            .get(info.index)
            .and_then(|trak| find_box_path(trak, &["mdia", "minf", "stbl"]))
            .ok_or(Mp4Error::MissingBox {
                name: "stbl",
                parent: "trak",
            })?;
        let sample_table = SampleTable::from_stbl(stbl)?;
        return Ok(Some(TelemetryTrack { info, sample_table }));
    }
    Ok(None)
}
