use crate::bits::reader::{be_u32_at, be_u64_at};

/// Extract duration in seconds from an mvhd payload
pub fn extract_duration_from_mvhd(mvhd: &[u8]) -> Option<f64> {
    let (timescale, duration) = match mvhd.first()? {
        // Version 0: 32-bit values
        0 => (be_u32_at(mvhd, 12)?, be_u32_at(mvhd, 16)? as u64),
        // Version 1: 64-bit values
        1 => (be_u32_at(mvhd, 20)?, be_u64_at(mvhd, 24)?),
        _ => return None,
    };
    if timescale > 0 {
        Some(duration as f64 / timescale as f64)
    } else {
        None
    }
}
