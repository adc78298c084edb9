use super::types::{ExtractionMethod, GpsPoint, SpeedSample, Telemetry};
use crate::gpmf::RawGpsPoint;

/// Nominal GPS5 rate, used to estimate a duration when the file reports none
pub const DEFAULT_GPS_RATE_HZ: f64 = 18.0;

/// Timestamp of point `index` of `count` spread linearly over `[0, duration]`
pub fn interpolated_timestamp(index: usize, count: usize, duration: f64) -> f64 {
    if count <= 1 {
        return 0.0;
    }
    index as f64 / (count - 1) as f64 * duration
}

/// Coordinates a position series can carry
pub fn is_valid_position(latitude: f64, longitude: f64) -> bool {
    latitude.abs() <= 90.0 && longitude.abs() <= 180.0 && !(latitude == 0.0 && longitude == 0.0)
}

/// Assemble raw points (in sample order) into a time series.
///
/// Every point yields a speed sample; points with unusable coordinates are
/// left out of the position series only.
pub fn build_telemetry(points: &[RawGpsPoint], duration: f64, method: ExtractionMethod) -> Telemetry {
    let count = points.len();
    let duration = if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        count.saturating_sub(1) as f64 / DEFAULT_GPS_RATE_HZ
    };

    let mut gps_points = Vec::with_capacity(count);
    let mut speed_samples = Vec::with_capacity(count);
    let mut timestamps = Vec::with_capacity(count);

    for (index, point) in points.iter().enumerate() {
        let timestamp = interpolated_timestamp(index, count, duration);
        timestamps.push(timestamp);
        speed_samples.push(SpeedSample::new(
            point.speed_2d.max(point.speed_3d).max(0.0),
            timestamp,
        ));
        if is_valid_position(point.latitude, point.longitude) {
            gps_points.push(GpsPoint {
                latitude: point.latitude,
                longitude: point.longitude,
                altitude: point.altitude,
                timestamp,
                accuracy: point.dop,
            });
        }
    }

    Telemetry {
        gps_points,
        speed_samples,
        timestamps,
        duration,
        method,
    }
}
