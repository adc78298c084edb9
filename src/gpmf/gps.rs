use crate::bits::reader::{be_i32_at, be_u16_at};
use crate::gpmf::klv::{find_containers, KlvElement, KlvHeader, GPSP, SCAL, STRM};
use crate::gpmf::scale::{decode_scale, ScaleVector};
use log::debug;

/// Speeds at or beyond this (m/s) are corrupt data
pub const MAX_PLAUSIBLE_SPEED: f64 = 2000.0;
/// GPS record headers with more rows than this are treated as noise
pub const MAX_GPS_ROWS: u16 = 20000;

/// The two recognized GPS record layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsRecordKind {
    /// lat, lon, alt, 2D speed, 3D speed
    Gps5,
    /// GPS5 fields plus days, seconds, DOP, fix
    Gps9,
}

impl GpsRecordKind {
    pub fn from_key(key: &[u8; 4]) -> Option<Self> {
        match key {
            b"GPS5" => Some(GpsRecordKind::Gps5),
            b"GPS9" => Some(GpsRecordKind::Gps9),
            _ => None,
        }
    }

    pub fn field_count(&self) -> usize {
        match self {
            GpsRecordKind::Gps5 => 5,
            GpsRecordKind::Gps9 => 9,
        }
    }

    /// Every field is a big-endian i32
    pub fn struct_size(&self) -> usize {
        self.field_count() * 4
    }
}

/// One descaled GPS fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawGpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed_2d: f64,
    pub speed_3d: f64,
    /// Dilution of precision, when the record or its stream reports one
    pub dop: Option<f64>,
}

impl RawGpsPoint {
    /// Build a point from descaled fields, rejecting corrupt values
    pub fn from_fields(kind: GpsRecordKind, fields: &[f64]) -> Option<Self> {
        if fields.len() < kind.field_count() {
            return None;
        }
        let point = RawGpsPoint {
            latitude: fields[0],
            longitude: fields[1],
            altitude: fields[2],
            speed_2d: fields[3],
            speed_3d: fields[4],
            dop: match kind {
                GpsRecordKind::Gps9 => Some(fields[7]),
                GpsRecordKind::Gps5 => None,
            },
        };
        point.is_sane().then_some(point)
    }

    /// Finite values and speeds under the plausibility bound
    pub fn is_sane(&self) -> bool {
        [
            self.latitude,
            self.longitude,
            self.altitude,
            self.speed_2d,
            self.speed_3d,
        ]
        .iter()
        .all(|v| v.is_finite())
            && self.speed_2d.abs() < MAX_PLAUSIBLE_SPEED
            && self.speed_3d.abs() < MAX_PLAUSIBLE_SPEED
            && self.dop.map_or(true, f64::is_finite)
    }
}

/// Header sanity check used by the byte scanners
pub fn is_plausible_gps_header(header: &KlvHeader) -> bool {
    let Some(kind) = GpsRecordKind::from_key(&header.key) else {
        return false;
    };
    matches!(header.type_code, b'l' | b'?')
        && header.struct_size as usize == kind.struct_size()
        && header.repeat > 0
        && header.repeat <= MAX_GPS_ROWS
}

/// Decode every complete row of a GPS record payload
pub fn decode_gps_rows(
    kind: GpsRecordKind,
    header: &KlvHeader,
    payload: &[u8],
    scale: &ScaleVector,
) -> Vec<RawGpsPoint> {
    let stride = header.struct_size as usize;
    let fields = kind.field_count();
    if stride < kind.struct_size() {
        debug!(
            "{:?} record with struct size {} is too narrow",
            kind, header.struct_size
        );
        return Vec::new();
    }
    let divisors = scale.divisors_for(fields);

    payload
        .chunks_exact(stride)
        .take(header.repeat as usize)
        .filter_map(|row| {
            let values: Vec<f64> = (0..fields)
                .map(|i| be_i32_at(row, i * 4).map(|v| v as f64 / divisors[i]))
                .collect::<Option<_>>()?;
            RawGpsPoint::from_fields(kind, &values)
        })
        .collect()
}

/// GPSP leaf: DOP x 100 as an unsigned 16-bit value
fn stream_precision(stream: &KlvElement<'_>) -> Option<f64> {
    let leaf = stream.child_leaf(&GPSP)?;
    let payload = leaf.payload()?;
    let raw = match leaf.header.struct_size {
        2 => be_u16_at(payload, 0).map(f64::from),
        4 => be_i32_at(payload, 0).map(f64::from),
        _ => None,
    }?;
    Some(raw / 100.0)
}

/// Extract the GPS points of one STRM container
pub fn points_from_stream(stream: &KlvElement<'_>) -> Vec<RawGpsPoint> {
    let Some((kind, record)) = stream
        .children()
        .iter()
        .find_map(|c| GpsRecordKind::from_key(c.key()).map(|k| (k, c)))
    else {
        return Vec::new();
    };
    let Some(payload) = record.payload() else {
        return Vec::new();
    };

    let scale = stream
        .child_leaf(&SCAL)
        .and_then(|s| decode_scale(&s.header, s.payload().unwrap_or_default()))
        .unwrap_or_else(ScaleVector::unit);

    let mut points = decode_gps_rows(kind, &record.header, payload, &scale);
    if kind == GpsRecordKind::Gps5 {
        if let Some(dop) = stream_precision(stream) {
            for p in &mut points {
                p.dop = Some(dop);
            }
        }
    }
    points
}

/// Extract GPS points from every STRM container of a parsed forest, in order
pub fn points_from_forest(forest: &[KlvElement<'_>]) -> Vec<RawGpsPoint> {
    find_containers(forest, &STRM)
        .into_iter()
        .flat_map(points_from_stream)
        .collect()
}
