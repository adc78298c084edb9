use super::r#box::find_box;
use crate::bits::reader::be_u32_at;
use crate::errors::{Mp4Error, Mp4Result};

/// Upper bound on a uniform-size sample count; about 10 days of 18 Hz samples
pub const MAX_UNIFORM_SAMPLES: usize = 1 << 24;

/// Parse stsz (sample size) box
///
/// A nonzero uniform size means every sample has that size; zero means a
/// per-sample 32-bit table follows. A table shorter than its declared count
/// yields the entries actually present.
pub fn parse_stsz(stbl: &[u8]) -> Mp4Result<Vec<u32>> {
    let stsz = find_box(stbl, "stsz").ok_or(Mp4Error::MissingBox {
        name: "stsz",
        parent: "stbl",
    })?;

    if stsz.len() < 12 {
        return Err(Mp4Error::Truncated {
            name: "stsz",
            expected: 12,
            actual: stsz.len(),
        });
    }

    let sample_size = be_u32_at(stsz, 4).unwrap_or(0);
    let sample_count = be_u32_at(stsz, 8).unwrap_or(0) as usize;

    if sample_size != 0 {
        // All samples have the same size
        if sample_count > MAX_UNIFORM_SAMPLES {
            return Err(Mp4Error::new(format!(
                "stsz declares {} uniform samples, limit is {}",
                sample_count, MAX_UNIFORM_SAMPLES
            )));
        }
        return Ok(vec![sample_size; sample_count]);
    }

    let present = (stsz.len() - 12) / 4;
    if present < sample_count {
        log::warn!(
            "stsz declares {} samples but holds {}, truncating",
            sample_count,
            present
        );
    }
    Ok((0..sample_count.min(present))
        .filter_map(|i| be_u32_at(stsz, 12 + i * 4))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::r#box::write_box_header;

    fn stsz_box(uniform: u32, count: u32, sizes: &[u32]) -> Vec<u8> {
        let mut payload = vec![0u8; 4];
        payload.extend_from_slice(&uniform.to_be_bytes());
        payload.extend_from_slice(&count.to_be_bytes());
        for s in sizes {
            payload.extend_from_slice(&s.to_be_bytes());
        }
        let mut out = Vec::new();
        write_box_header(&mut out, "stsz", (payload.len() + 8) as u32);
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn test_uniform_sizes_are_synthesized() {
        assert_eq!(parse_stsz(&stsz_box(64, 3, &[])).unwrap(), vec![64, 64, 64]);
    }

    #[test]
    fn test_huge_uniform_count_is_rejected() {
        assert!(parse_stsz(&stsz_box(64, u32::MAX, &[])).is_err());
        assert!(parse_stsz(&stsz_box(64, MAX_UNIFORM_SAMPLES as u32 + 1, &[])).is_err());
    }

    #[test]
    fn test_per_sample_sizes() {
        assert_eq!(parse_stsz(&stsz_box(0, 2, &[10, 20])).unwrap(), vec![10, 20]);
    }

    #[test]
    fn test_short_table_is_clipped() {
        assert_eq!(parse_stsz(&stsz_box(0, 5, &[10, 20])).unwrap(), vec![10, 20]);
    }

    #[test]
    fn test_missing_box() {
        assert!(parse_stsz(&[]).is_err());
    }
}
