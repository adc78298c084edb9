pub mod filter;
pub use filter::{median_smooth, FilteredSpeeds, SpeedAnomalyFilter, SpeedStatistics};
