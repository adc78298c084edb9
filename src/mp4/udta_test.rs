#[cfg(test)]
mod tests {
    use crate::mp4::udta::*;
    use crate::telemetry::types::HighlightKind;
    use crate::test_support::make_box;
    use std::io::Cursor;

    /// Highlights section with one marker per timestamp, each 20 bytes
    /// after its timestamp field
    fn tagged_region(timestamps: &[u32]) -> Vec<u8> {
        let mut region = b"DEVCHighlighHLMT".to_vec();
        for ts in timestamps {
            region.extend_from_slice(&ts.to_be_bytes());
            region.extend_from_slice(&[0u8; 16]);
            region.extend_from_slice(b"MANL");
        }
        region
    }

    fn hmmt(timestamps: &[u32]) -> Vec<u8> {
        let mut payload = Vec::new();
        for ts in timestamps {
            payload.extend_from_slice(&ts.to_be_bytes());
            payload.extend_from_slice(&[0u8; 4]);
        }
        make_box("HMMT", &payload)
    }

    #[test]
    fn test_tagged_marker_timestamp() {
        let highlights = highlights_from_udta(&make_box("GPMF", &tagged_region(&[12345])));
        assert_eq!(highlights.len(), 1);
        assert!((highlights[0].timestamp - 12.345).abs() < 1e-9);
        assert_eq!(highlights[0].kind, HighlightKind::Manual);
        assert_eq!(highlights[0].confidence, None);
    }

    #[test]
    fn test_tagged_zero_timestamp_is_skipped() {
        assert_eq!(parse_tagged_markers(&tagged_region(&[1000, 0, 2500])), vec![1000, 2500]);
    }

    #[test]
    fn test_markers_need_opening_tags() {
        let mut region = 500u32.to_be_bytes().to_vec();
        region.extend_from_slice(&[0u8; 16]);
        region.extend_from_slice(b"MANL");
        assert!(parse_tagged_markers(&region).is_empty());

        // Marker list tag without the highlights section
        let mut region = b"HLMT".to_vec();
        region.extend_from_slice(&500u32.to_be_bytes());
        region.extend_from_slice(&[0u8; 16]);
        region.extend_from_slice(b"MANL");
        assert!(parse_tagged_markers(&region).is_empty());
    }

    #[test]
    fn test_marker_table_stops_at_zero() {
        let table = hmmt(&[4000, 9000, 0, 7000]);
        let highlights = highlights_from_udta(&table);
        let times: Vec<f64> = highlights.iter().map(|h| h.timestamp).collect();
        assert_eq!(times, vec![4.0, 9.0]);
    }

    #[test]
    fn test_marker_table_first_record_at_start() {
        let mut payload = Vec::new();
        for ts in [4000u32, 9000, 0] {
            payload.extend_from_slice(&ts.to_be_bytes());
            payload.extend_from_slice(&[0u8; 4]);
        }
        assert_eq!(parse_marker_table(&payload), vec![4000, 9000]);
        let times: Vec<f64> = highlights_from_udta(&make_box("HMMT", &payload))
            .iter()
            .map(|h| h.timestamp)
            .collect();
        assert_eq!(times, vec![4.0, 9.0]);
    }

    #[test]
    fn test_marker_table_ignores_partial_record() {
        let mut payload = 3000u32.to_be_bytes().to_vec();
        payload.extend_from_slice(&[0u8; 4]);
        payload.extend_from_slice(&6000u32.to_be_bytes());
        assert_eq!(parse_marker_table(&payload), vec![3000]);
    }

    #[test]
    fn test_tagged_encoding_wins() {
        let udta = [make_box("GPMF", &tagged_region(&[1500])), hmmt(&[8000])].concat();
        let highlights = highlights_from_udta(&udta);
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].timestamp, 1.5);
    }

    #[test]
    fn test_extract_from_source() {
        let moov = make_box("moov", &make_box("udta", &hmmt(&[2000])));
        let file = [make_box("ftyp", b"mp41"), moov].concat();
        let highlights = extract_highlights(&mut Cursor::new(&file));
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].timestamp, 2.0);
    }

    #[test]
    fn test_no_user_data() {
        let file = [make_box("ftyp", b"mp41"), make_box("moov", &[])].concat();
        assert!(extract_highlights(&mut Cursor::new(&file)).is_empty());
        assert!(extract_highlights(&mut Cursor::new(vec![0u8; 64])).is_empty());
    }
}
