/*
# Full-File Scan

 Last-resort recovery for files whose container structure is unusable. The
 source is read sequentially in fixed-size chunks; each chunk is appended to
 whatever the previous chunk left unparsed. Headers are only examined up to
 `len - tail_reserve` so a header straddling two reads is seen whole in the
 next round. The last decoded scale vector survives across chunks.
*/

use crate::errors::TelemetryResult;
use crate::gpmf::gps::{decode_gps_rows, is_plausible_gps_header, GpsRecordKind, RawGpsPoint};
use crate::gpmf::klv::{KlvHeader, KLV_HEADER_SIZE};
use crate::gpmf::scale::{decode_scale, find_scale_backward, is_plausible_scale_header, ScaleVector};
use crate::pipeline::cancel::CancellationToken;
use crate::pipeline::config::ExtractorConfig;
use crate::streams::seekable_stream::read_up_to;
use log::debug;
use std::io::Read;

/// Chunked byte scanner for GPS records
#[derive(Debug, Clone, Copy)]
pub struct RawScanner {
    chunk_size: usize,
    tail_reserve: usize,
}

impl RawScanner {
    pub fn new(chunk_size: usize, tail_reserve: usize) -> Self {
        RawScanner {
            chunk_size: chunk_size.max(tail_reserve + KLV_HEADER_SIZE),
            tail_reserve,
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.scan_chunk_size, config.scan_tail_reserve)
    }

    /// Scan `reader` from its current position to the end.
    ///
    /// Cancellation is checked before each chunk read.
    pub fn scan<R: Read>(&self, reader: &mut R, cancel: &CancellationToken) -> TelemetryResult<Vec<RawGpsPoint>> {
        let mut state = ScanState::default();
        let mut buffer: Vec<u8> = Vec::with_capacity(self.chunk_size + self.tail_reserve);
        let mut chunks = 0usize;

        loop {
            cancel.check()?;
            let carried = buffer.len();
            buffer.resize(carried + self.chunk_size, 0);
            let read = read_up_to(reader, &mut buffer[carried..])?;
            buffer.truncate(carried + read);
            chunks += 1;
            let eof = read < self.chunk_size;

            let limit = if eof {
                buffer.len()
            } else {
                buffer.len().saturating_sub(self.tail_reserve)
            };
            let consumed = state.scan_buffer(&buffer, limit, eof);
            buffer.drain(..consumed);

            if eof {
                break;
            }
        }

        debug!(
            "Full scan read {} chunks, {} GPS records, {} points",
            chunks,
            state.records,
            state.points.len()
        );
        Ok(state.points)
    }
}

#[derive(Default)]
struct ScanState {
    last_scale: Option<ScaleVector>,
    points: Vec<RawGpsPoint>,
    records: usize,
}

impl ScanState {
    /// Scan headers starting before `limit`; returns how many leading bytes
    /// of `buffer` are done with.
    fn scan_buffer(&mut self, buffer: &[u8], limit: usize, eof: bool) -> usize {
        let mut pos = 0usize;
        while pos + KLV_HEADER_SIZE <= limit {
            let Some(header) = KlvHeader::parse(buffer, pos) else {
                break;
            };
            let data_start = pos + KLV_HEADER_SIZE;
            let data_end = data_start + header.data_size();

            if is_plausible_scale_header(&header) {
                if data_end > buffer.len() {
                    if !eof {
                        return pos;
                    }
                    pos += 1;
                    continue;
                }
                if let Some(scale) = decode_scale(&header, &buffer[data_start..data_end]) {
                    self.last_scale = Some(scale);
                }
                pos = data_start + header.padded_size();
                continue;
            }

            if is_plausible_gps_header(&header) {
                if data_end > buffer.len() && !eof {
                    return pos;
                }
                if let Some(kind) = GpsRecordKind::from_key(&header.key) {
                    let scale = find_scale_backward(buffer, pos)
                        .or_else(|| self.last_scale.clone())
                        .unwrap_or_else(ScaleVector::unit);
                    let payload = &buffer[data_start..data_end.min(buffer.len())];
                    self.points.extend(decode_gps_rows(kind, &header, payload, &scale));
                    self.records += 1;
                }
                pos = (data_start + header.padded_size()).min(buffer.len());
                continue;
            }

            pos += 1;
        }
        pos.min(buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TelemetryError;
    use crate::test_support::{gps5_payload, gps5_row, i32_leaf, GPS5_SCALE};
    use std::io::Cursor;

    fn scan(data: &[u8], chunk: usize, reserve: usize) -> Vec<RawGpsPoint> {
        RawScanner::new(chunk, reserve)
            .scan(&mut Cursor::new(data), &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_finds_record_in_noise() {
        let mut data = vec![0x55u8; 37];
        data.extend_from_slice(&gps5_payload(&GPS5_SCALE, &[gps5_row(4.0), gps5_row(5.0)]));
        data.extend_from_slice(&[0u8; 19]);
        let points = scan(&data, 1 << 20, 1024);
        assert_eq!(points.len(), 2);
        assert!((points[1].speed_2d - 5.0).abs() < 1e-9);
        assert!((points[0].latitude - 47.5).abs() < 1e-9);
    }

    #[test]
    fn test_record_split_across_chunks() {
        let mut data = vec![0u8; 50];
        data.extend_from_slice(&gps5_payload(&GPS5_SCALE, &[gps5_row(7.0); 6]));
        data.extend_from_slice(&[0u8; 33]);
        for chunk in [17, 32, 64, 100] {
            let points = scan(&data, chunk, 16);
            assert_eq!(points.len(), 6, "chunk size {}", chunk);
            assert!(points.iter().all(|p| (p.speed_2d - 7.0).abs() < 1e-9));
        }
    }

    #[test]
    fn test_scale_carried_past_search_window() {
        let mut data = i32_leaf(b"SCAL", 4, &GPS5_SCALE);
        data.extend_from_slice(&vec![0u8; 3000]);
        data.extend_from_slice(&i32_leaf(b"GPS5", 20, &gps5_row(2.0)));
        let points = scan(&data, 256, 32);
        assert_eq!(points.len(), 1);
        assert!((points[0].speed_2d - 2.0).abs() < 1e-9);
        assert!((points[0].longitude - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_scale_uses_unit() {
        let data = i32_leaf(b"GPS5", 20, &[1, 2, 3, 4, 5]);
        let points = scan(&data, 64, 16);
        assert_eq!(points[0].latitude, 1.0);
        assert_eq!(points[0].speed_3d, 5.0);
    }

    #[test]
    fn test_all_zero_source() {
        assert!(scan(&vec![0u8; 10_000], 1024, 64).is_empty());
    }

    #[test]
    fn test_cancel_between_chunks() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = RawScanner::new(64, 16).scan(&mut Cursor::new(vec![0u8; 256]), &cancel);
        assert!(matches!(result, Err(TelemetryError::Cancelled)));
    }
}
