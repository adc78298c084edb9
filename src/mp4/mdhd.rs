use crate::bits::reader::{be_u32_at, be_u64_at};
use crate::errors::{Mp4Error, Mp4Result};

/// Parse mdhd box to get timescale and duration
pub fn parse_mdhd(mdhd: &[u8]) -> Mp4Result<(u32, u64)> {
    let version = *mdhd.first().ok_or(Mp4Error::Truncated {
        name: "mdhd",
        expected: 20,
        actual: 0,
    })?;
    let parsed = if version == 1 {
        // Version 1: 64-bit creation/modification times and duration
        be_u32_at(mdhd, 20).zip(be_u64_at(mdhd, 24))
    } else {
        be_u32_at(mdhd, 12).zip(be_u32_at(mdhd, 16).map(u64::from))
    };
    parsed.ok_or(Mp4Error::Truncated {
        name: "mdhd",
        expected: if version == 1 { 32 } else { 20 },
        actual: mdhd.len(),
    })
}

/// Media duration in seconds, if the timescale is usable
pub fn media_duration_seconds(mdhd: &[u8]) -> Option<f64> {
    let (timescale, duration) = parse_mdhd(mdhd).ok()?;
    (timescale > 0).then(|| duration as f64 / timescale as f64)
}
