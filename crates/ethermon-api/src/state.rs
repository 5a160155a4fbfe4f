use crate::auth::JwtAuth;
use ethermon_archive::{ArchiveStore, ZipArchiver};
use ethermon_device::{DataStore, DeviceRegistry};
use ethermon_modbus::PollingManager;
use ethermon_stats::StatsCollector;
use std::sync::Arc;

/// API 共享状态
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DeviceRegistry>,
    pub store: DataStore,
    pub stats: Arc<StatsCollector>,
    pub archive: Arc<ArchiveStore>,
    pub zipper: Arc<ZipArchiver>,
    pub poller: Arc<PollingManager>,
    pub auth: Arc<JwtAuth>,
}
