use crate::telemetry::types::SpeedSample;
use log::debug;
use serde::Serialize;

const MS_TO_KMH: f64 = 3.6;

/// Summary of a cleaned speed series. Speeds are in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpeedStatistics {
    pub max_speed_kmh: f64,
    /// Seconds from the start of the video; `None` for an empty series
    pub max_speed_timestamp: Option<f64>,
    /// Mean over samples above the moving threshold; 0 when none are
    pub avg_speed_kmh: f64,
    /// Samples removed by the hard filters
    pub filtered_sample_count: usize,
}

/// Output of [`SpeedAnomalyFilter::apply`]
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilteredSpeeds {
    /// Surviving samples with median-smoothed speeds
    pub cleaned: Vec<SpeedSample>,
    pub statistics: SpeedStatistics,
}

/// Removes implausible speed samples and smooths the rest.
///
/// Pass one drops samples outright: speeds above `max_speed_kmh`, negative or
/// non-finite speeds, and samples whose change from the previous retained
/// sample exceeds `max_acceleration_kmh_per_s`. Pass two replaces each
/// survivor's speed with the median of a centered window, clipped at the ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedAnomalyFilter {
    pub max_speed_kmh: f64,
    pub max_acceleration_kmh_per_s: f64,
    pub median_window: usize,
    /// Samples at or below this are stationary and left out of the average
    pub moving_threshold_kmh: f64,
}

impl Default for SpeedAnomalyFilter {
    fn default() -> Self {
        SpeedAnomalyFilter {
            max_speed_kmh: 200.0,
            max_acceleration_kmh_per_s: 50.0,
            median_window: 5,
            moving_threshold_kmh: 5.0,
        }
    }
}

impl SpeedAnomalyFilter {
    pub fn apply(&self, samples: &[SpeedSample]) -> FilteredSpeeds {
        let retained = self.drop_anomalies(samples);
        let statistics = self.statistics(&retained, samples.len());
        debug!(
            "Speed filter kept {} of {} samples",
            retained.len(),
            samples.len()
        );
        FilteredSpeeds {
            cleaned: median_smooth(&retained, self.median_window),
            statistics,
        }
    }

    fn drop_anomalies(&self, samples: &[SpeedSample]) -> Vec<SpeedSample> {
        let mut retained: Vec<SpeedSample> = Vec::with_capacity(samples.len());
        for sample in samples {
            let kmh = sample.speed * MS_TO_KMH;
            if !kmh.is_finite() || kmh < 0.0 || kmh > self.max_speed_kmh {
                continue;
            }
            if let Some(prev) = retained.last() {
                let dt = sample.timestamp - prev.timestamp;
                if dt > 0.0 && (kmh - prev.speed_kmh()).abs() / dt > self.max_acceleration_kmh_per_s {
                    continue;
                }
            }
            retained.push(*sample);
        }
        retained
    }

    fn statistics(&self, retained: &[SpeedSample], original_count: usize) -> SpeedStatistics {
        let max = retained
            .iter()
            .fold(None::<&SpeedSample>, |best, s| match best {
                Some(b) if b.speed >= s.speed => Some(b),
                _ => Some(s),
            });
        let moving: Vec<f64> = retained
            .iter()
            .map(SpeedSample::speed_kmh)
            .filter(|kmh| *kmh > self.moving_threshold_kmh)
            .collect();
        let avg_speed_kmh = if moving.is_empty() {
            0.0
        } else {
            moving.iter().sum::<f64>() / moving.len() as f64
        };

        SpeedStatistics {
            max_speed_kmh: max.map(SpeedSample::speed_kmh).unwrap_or(0.0),
            max_speed_timestamp: max.map(|s| s.timestamp),
            avg_speed_kmh,
            filtered_sample_count: original_count - retained.len(),
        }
    }
}

/// Centered moving median. Windows are clipped at the series ends; an even
/// sized window takes the mean of its two middle values.
pub fn median_smooth(samples: &[SpeedSample], window: usize) -> Vec<SpeedSample> {
    let half = window.max(1) / 2;
    let speeds: Vec<f64> = samples.iter().map(|s| s.speed).collect();
    samples
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(speeds.len());
            SpeedSample {
                speed: median(&speeds[lo..hi]),
                ..*s
            }
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[mid],
        _ => (sorted[mid - 1] + sorted[mid]) / 2.0,
    }
}
