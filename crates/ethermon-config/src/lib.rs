pub mod loader;
pub mod paths;
pub mod schedule;

pub use loader::ConfigLoader;
pub use paths::StoragePaths;
pub use schedule::{
    parse_time, ArchivingConfig, DailyArchiveConfig, MonthDay, MonthlyZipConfig, RetentionConfig,
    ScheduleConfig,
};
