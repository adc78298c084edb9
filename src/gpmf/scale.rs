use crate::bits::reader::{be_i16_at, be_i32_at};
use crate::gpmf::klv::{KlvHeader, KLV_HEADER_SIZE, SCAL};

/// How far back from a GPS record the raw-scan fallback looks for SCAL
pub const SCALE_SEARCH_WINDOW: usize = 1024;
/// SCAL headers with more values than this are treated as noise
pub const MAX_SCALE_VALUES: u16 = 64;

/// Per-field divisors for a GPS record
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleVector(Vec<f64>);

impl ScaleVector {
    /// Divisors as stored, with zero entries already mapped to 1
    pub fn new(divisors: Vec<f64>) -> Self {
        ScaleVector(
            divisors
                .into_iter()
                .map(|d| if d == 0.0 { 1.0 } else { d })
                .collect(),
        )
    }

    /// No scaling at all
    pub fn unit() -> Self {
        ScaleVector(Vec::new())
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Divisor for field `index`, padding missing entries with 1.0
    pub fn divisor(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(1.0)
    }

    /// Divisors for `field_count` fields, right-padded with 1.0
    pub fn divisors_for(&self, field_count: usize) -> Vec<f64> {
        (0..field_count).map(|i| self.divisor(i)).collect()
    }

    /// Descale one raw record
    pub fn apply(&self, raw: &[i32]) -> Vec<f64> {
        self.divisors_for(raw.len())
            .iter()
            .zip(raw)
            .map(|(d, v)| *v as f64 / d)
            .collect()
    }
}

/// Decode a SCAL payload according to its declared element width.
///
/// Width comes from the type code (`l`/`L` 32-bit, `s`/`S` 16-bit) and
/// falls back to the struct size when the type is unexpected.
pub fn decode_scale(header: &KlvHeader, payload: &[u8]) -> Option<ScaleVector> {
    let width = match header.type_code {
        b'l' | b'L' => 4,
        b's' | b'S' => 2,
        _ => match header.struct_size {
            4 => 4,
            2 => 2,
            _ => return None,
        },
    };
    if header.struct_size as usize % width != 0 {
        return None;
    }
    let count = header.data_size().min(payload.len()) / width;
    let divisors = (0..count)
        .filter_map(|i| {
            let pos = i * width;
            if width == 4 {
                be_i32_at(payload, pos).map(f64::from)
            } else {
                be_i16_at(payload, pos).map(f64::from)
            }
        })
        .collect();
    Some(ScaleVector::new(divisors))
}

/// Header sanity check used by the byte scanners
pub fn is_plausible_scale_header(header: &KlvHeader) -> bool {
    header.key == SCAL
        && matches!(header.struct_size, 2 | 4)
        && header.repeat > 0
        && header.repeat <= MAX_SCALE_VALUES
}

/// Find the nearest SCAL element that ends before `record_start`, searching at
/// most [`SCALE_SEARCH_WINDOW`] bytes back.
pub fn find_scale_backward(buffer: &[u8], record_start: usize) -> Option<ScaleVector> {
    let floor = record_start.saturating_sub(SCALE_SEARCH_WINDOW);
    let mut pos = record_start.checked_sub(KLV_HEADER_SIZE)?;
    loop {
        if buffer.get(pos..pos + 4) == Some(&SCAL[..]) {
            if let Some(header) = KlvHeader::parse(buffer, pos) {
                let data_start = pos + KLV_HEADER_SIZE;
                let declared_end = data_start + header.data_size();
                if is_plausible_scale_header(&header) && declared_end <= record_start {
                    if let Some(scale) = decode_scale(&header, &buffer[data_start..declared_end]) {
                        return Some(scale);
                    }
                }
            }
        }
        if pos == floor {
            return None;
        }
        pos -= 1;
    }
}
