pub mod cleanup;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod store;
pub mod zipper;

pub use cleanup::CleanupManager;
pub use error::{ArchiveError, Result};
pub use model::{ArchiveFileInfo, CleanupStats, DayArchive, DeviceDayRecord, ZipInfo};
pub use scheduler::ArchiveScheduler;
pub use store::ArchiveStore;
pub use zipper::ZipArchiver;
