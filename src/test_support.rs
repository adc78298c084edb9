// Synthetic container and KLV builders shared by unit tests.

use crate::gpmf::klv::{padded_len, KLV_HEADER_SIZE};
use crate::mp4::r#box::write_box_header;

pub fn make_box(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    write_box_header(&mut buf, name, (payload.len() + 8) as u32);
    buf.extend_from_slice(payload);
    buf
}

pub fn klv(key: &[u8; 4], type_code: u8, struct_size: u8, repeat: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = key.to_vec();
    out.push(type_code);
    out.push(struct_size);
    out.extend_from_slice(&repeat.to_be_bytes());
    out.extend_from_slice(payload);
    out.resize(KLV_HEADER_SIZE + padded_len(payload.len()), 0);
    out
}

pub fn container(key: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let body = children.concat();
    klv(key, 0, 1, body.len() as u16, &body)
}

pub fn i32_leaf(key: &[u8; 4], struct_size: u8, values: &[i32]) -> Vec<u8> {
    let per = struct_size as usize / 4;
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    klv(key, b'l', struct_size, (values.len() / per.max(1)) as u16, &payload)
}

/// DEVC > STRM > {SCAL, GPS5}
pub fn gps5_payload(scale: &[i32], rows: &[[i32; 5]]) -> Vec<u8> {
    let flat: Vec<i32> = rows.iter().flatten().copied().collect();
    container(
        b"DEVC",
        &[container(
            b"STRM",
            &[i32_leaf(b"SCAL", 4, scale), i32_leaf(b"GPS5", 20, &flat)],
        )],
    )
}

pub const GPS5_SCALE: [i32; 5] = [10_000_000, 10_000_000, 1000, 1000, 100];

/// One GPS5 row at a fixed position moving at `speed_ms`
pub fn gps5_row(speed_ms: f64) -> [i32; 5] {
    let speed2d = (speed_ms * 1000.0).round() as i32;
    let speed3d = (speed_ms * 100.0).round() as i32;
    [475_000_000, 85_000_000, 420_000, speed2d, speed3d]
}

fn full_box(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(payload);
    make_box(name, &body)
}

fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn mvhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 96];
    payload[8..12].copy_from_slice(&timescale.to_be_bytes());
    payload[12..16].copy_from_slice(&duration.to_be_bytes());
    full_box("mvhd", &payload)
}

pub fn trak(handler: &[u8; 4], entry: &[u8; 4], stbl_tables: &[Vec<u8>]) -> Vec<u8> {
    let mut hdlr = vec![0u8; 4];
    hdlr.extend_from_slice(handler);
    hdlr.extend_from_slice(&[0u8; 12]);
    hdlr.extend_from_slice(b"GoPro MET\0");
    let mut stsd = u32s(&[1, 16]);
    stsd.extend_from_slice(entry);
    stsd.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);
    let mut stbl_children = vec![full_box("stsd", &stsd)];
    stbl_children.extend_from_slice(stbl_tables);
    let stbl = make_box("stbl", &stbl_children.concat());
    let minf = make_box("minf", &stbl);
    let mdia = make_box("mdia", &[full_box("hdlr", &hdlr), minf].concat());
    make_box("trak", &mdia)
}

pub fn stsz(sizes: &[u32]) -> Vec<u8> {
    let mut payload = u32s(&[0, sizes.len() as u32]);
    payload.extend_from_slice(&u32s(sizes));
    full_box("stsz", &payload)
}

pub fn stco(offsets: &[u32]) -> Vec<u8> {
    let mut payload = u32s(&[offsets.len() as u32]);
    payload.extend_from_slice(&u32s(offsets));
    full_box("stco", &payload)
}

pub fn stsc(runs: &[(u32, u32)]) -> Vec<u8> {
    let mut payload = u32s(&[runs.len() as u32]);
    for (first, per) in runs {
        payload.extend_from_slice(&u32s(&[*first, *per, 1]));
    }
    full_box("stsc", &payload)
}

/// ftyp, mdat holding `samples` one per chunk, then moov with a telemetry
/// track and optional extra moov children (e.g. udta)
pub fn telemetry_mp4(samples: &[Vec<u8>], duration_secs: u32, extra_moov: &[Vec<u8>]) -> Vec<u8> {
    let ftyp = make_box("ftyp", b"mp41\0\0\0\0mp41");
    let mdat = make_box("mdat", &samples.concat());

    let mut offsets = Vec::new();
    let mut offset = (ftyp.len() + 8) as u32;
    for s in samples {
        offsets.push(offset);
        offset += s.len() as u32;
    }
    let sizes: Vec<u32> = samples.iter().map(|s| s.len() as u32).collect();

    let track = trak(b"meta", b"gpmd", &[stsz(&sizes), stco(&offsets), stsc(&[(1, 1)])]);
    let mut moov_children = vec![mvhd(1000, duration_secs * 1000), track];
    moov_children.extend_from_slice(extra_moov);
    let moov = make_box("moov", &moov_children.concat());

    [ftyp, mdat, moov].concat()
}
