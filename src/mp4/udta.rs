use crate::bits::reader::{be_u32_at, read_u32};
use crate::mp4::moov_finder::read_moov_payload;
use crate::mp4::r#box::find_box;
use crate::streams::seekable_stream::SeekableStream;
use crate::telemetry::types::Highlight;
use log::{debug, warn};

/// Distance from a manual-marker tag back to its millisecond timestamp
const MARKER_TIMESTAMP_OFFSET: usize = 20;
/// Bytes per record in the marker table
const MARKER_RECORD_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagState {
    Searching,
    InHighlights,
    InMarkerList,
}

/// Tagged highlight markers, as embedded in the user-data metadata region.
///
/// Walks the region in 4-byte steps. The highlights tag pair
/// (`High` `ligh`) opens the section, `HLMT` opens the marker list and each
/// following `MANL` tag is one manual marker whose millisecond timestamp sits
/// 20 bytes before the tag. Zero timestamps are unset slots.
pub fn parse_tagged_markers(region: &[u8]) -> Vec<u32> {
    let mut state = TagState::Searching;
    let mut markers = Vec::new();
    let mut pos = 0usize;

    while pos + 4 <= region.len() {
        let word = &region[pos..pos + 4];
        match state {
            TagState::Searching => {
                if word == b"High" && region.get(pos + 4..pos + 8) == Some(&b"ligh"[..]) {
                    state = TagState::InHighlights;
                    pos += 4;
                }
            }
            TagState::InHighlights => {
                if word == b"HLMT" {
                    state = TagState::InMarkerList;
                }
            }
            TagState::InMarkerList => {
                if word == b"MANL" {
                    let timestamp = pos
                        .checked_sub(MARKER_TIMESTAMP_OFFSET)
                        .and_then(|at| be_u32_at(region, at));
                    match timestamp {
                        Some(0) | None => debug!("Skipping unset marker at {}", pos),
                        Some(ms) => markers.push(ms),
                    }
                }
            }
        }
        pos += 4;
    }
    markers
}

/// Marker table: flat 8-byte records (timestamp in milliseconds, then 4
/// unused bytes), terminated by a zero timestamp or the end of the box.
pub fn parse_marker_table(table: &[u8]) -> Vec<u32> {
    let mut markers = Vec::new();
    let mut pos = 0usize;
    while pos + MARKER_RECORD_SIZE <= table.len() {
        let record_start = pos;
        match read_u32(table, &mut pos) {
            Some(0) | None => break,
            Some(ms) => markers.push(ms),
        }
        pos = record_start + MARKER_RECORD_SIZE;
    }
    markers
}

/// Highlights from a udta payload. The tagged encoding is tried first.
pub fn highlights_from_udta(udta: &[u8]) -> Vec<Highlight> {
    let region = find_box(udta, "GPMF").unwrap_or(udta);
    let mut markers = parse_tagged_markers(region);
    if markers.is_empty() {
        if let Some(table) = find_box(udta, "HMMT") {
            markers = parse_marker_table(table);
        }
    }
    markers.into_iter().map(Highlight::manual_from_millis).collect()
}

/// Highlights from a moov payload; empty when there is no udta box
pub fn highlights_from_moov(moov: &[u8]) -> Vec<Highlight> {
    find_box(moov, "udta")
        .map(highlights_from_udta)
        .unwrap_or_default()
}

/// Locate moov in the source and scan its user data. Never fails: read
/// errors are logged and produce an empty list.
pub fn extract_highlights<S: SeekableStream>(stream: &mut S) -> Vec<Highlight> {
    match read_moov_payload(stream) {
        Ok(Some(moov)) => highlights_from_moov(&moov),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Highlight scan skipped: {}", e);
            Vec::new()
        }
    }
}
