pub mod collector;
pub mod model;

pub use collector::StatsCollector;
pub use model::{DeviceStat, HourlyDeviceStat, HourlyEntry, Stats};
