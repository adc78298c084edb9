// Synthetic camera files for the integration tests.
#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

pub fn make_box(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    buf.extend_from_slice(name);
    buf.extend_from_slice(payload);
    buf
}

fn full_box(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(payload);
    make_box(name, &body)
}

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn klv(key: &[u8; 4], type_code: u8, struct_size: u8, repeat: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = key.to_vec();
    out.extend_from_slice(&[type_code, struct_size]);
    out.extend_from_slice(&repeat.to_be_bytes());
    out.extend_from_slice(payload);
    out.resize(8 + ((payload.len() + 3) & !3), 0);
    out
}

fn i32_leaf(key: &[u8; 4], struct_size: u8, values: &[i32]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    let per = struct_size as usize / 4;
    klv(key, b'l', struct_size, (values.len() / per) as u16, &payload)
}

fn container(key: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let body = children.concat();
    klv(key, 0, 1, body.len() as u16, &body)
}

/// Scale giving both speed fields millimetre-per-second resolution
pub const SCALE: [i32; 5] = [10_000_000, 10_000_000, 1000, 1000, 1000];

/// One metadata sample carrying a single GPS5 fix at `kmh`
pub fn gps_sample(kmh: f64) -> Vec<u8> {
    let speed = (kmh / 3.6 * 1000.0).round() as i32;
    let row = [475_000_000, 85_000_000, 420_000, speed, speed];
    container(
        b"DEVC",
        &[container(
            b"STRM",
            &[i32_leaf(b"SCAL", 4, &SCALE), i32_leaf(b"GPS5", 20, &row)],
        )],
    )
}

fn mvhd(duration_secs: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 96];
    payload[8..12].copy_from_slice(&1000u32.to_be_bytes());
    payload[12..16].copy_from_slice(&(duration_secs * 1000).to_be_bytes());
    full_box(b"mvhd", &payload)
}

fn telemetry_trak(sizes: &[u32], offsets: &[u32], runs: &[(u32, u32)]) -> Vec<u8> {
    let mut hdlr = vec![0u8; 4];
    hdlr.extend_from_slice(b"meta");
    hdlr.extend_from_slice(&[0u8; 12]);
    hdlr.extend_from_slice(b"GoPro MET\0");

    let mut stsd = u32s(&[1, 16]);
    stsd.extend_from_slice(b"gpmd");
    stsd.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);

    let mut stsz = u32s(&[0, sizes.len() as u32]);
    stsz.extend_from_slice(&u32s(sizes));
    let mut stco = u32s(&[offsets.len() as u32]);
    stco.extend_from_slice(&u32s(offsets));
    let mut stsc = u32s(&[runs.len() as u32]);
    for (first, per) in runs {
        stsc.extend_from_slice(&u32s(&[*first, *per, 1]));
    }

    let stbl = make_box(
        b"stbl",
        &[
            full_box(b"stsd", &stsd),
            full_box(b"stsz", &stsz),
            full_box(b"stco", &stco),
            full_box(b"stsc", &stsc),
        ]
        .concat(),
    );
    let mdia = make_box(
        b"mdia",
        &[full_box(b"hdlr", &hdlr), make_box(b"minf", &stbl)].concat(),
    );
    make_box(b"trak", &mdia)
}

/// A complete file: `prefix`, ftyp, mdat with one sample per chunk, moov.
/// `runs` overrides the chunk-run table; `udta` is appended to moov.
pub fn camera_file(
    prefix: &[u8],
    samples: &[Vec<u8>],
    duration_secs: u32,
    runs: Option<&[(u32, u32)]>,
    udta: Option<Vec<u8>>,
) -> Vec<u8> {
    let ftyp = make_box(b"ftyp", b"mp41\0\0\0\0mp41");
    let mdat = make_box(b"mdat", &samples.concat());

    let mut offset = (prefix.len() + ftyp.len() + 8) as u32;
    let mut offsets = Vec::new();
    for s in samples {
        offsets.push(offset);
        offset += s.len() as u32;
    }
    let sizes: Vec<u32> = samples.iter().map(|s| s.len() as u32).collect();

    let mut moov = vec![
        mvhd(duration_secs),
        telemetry_trak(&sizes, &offsets, runs.unwrap_or(&[(1, 1)])),
    ];
    moov.extend(udta);

    [prefix.to_vec(), ftyp, mdat, make_box(b"moov", &moov.concat())].concat()
}

/// udta holding the tagged highlight encoding with one marker per timestamp
pub fn tagged_highlights_udta(timestamps_ms: &[u32]) -> Vec<u8> {
    let mut region = b"DEVCHighlighHLMT".to_vec();
    for ts in timestamps_ms {
        region.extend_from_slice(&ts.to_be_bytes());
        region.extend_from_slice(&[0u8; 16]);
        region.extend_from_slice(b"MANL");
    }
    make_box(b"udta", &make_box(b"GPMF", &region))
}

pub fn write_temp(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(data).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
