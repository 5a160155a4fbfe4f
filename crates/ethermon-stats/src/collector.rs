use crate::model::{DeviceStat, HourlyDeviceStat, HourlyEntry, Stats};
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use ethermon_config::StoragePaths;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 统计自动保存间隔
const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// 小时桶滚动检查间隔
const HOURLY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// 小时桶保留窗口（天）
const HOURLY_RETENTION_DAYS: i64 = 7;

/// 统计收集器
///
/// 维护累计与每小时的轮询/错误计数，定期持久化到
/// `configs/stats.json` 与 `configs/hourly-stats.json`。
/// 持久化是尽力而为的：写失败只记日志，绝不向轮询器传播。
///
/// 显式构造并注入使用；不需要统计时用 [`StatsCollector::disabled`]
/// 得到同接口的空实现。
pub struct StatsCollector {
    paths: Option<StoragePaths>,
    stats: Arc<RwLock<Stats>>,
    hourly: Arc<RwLock<Vec<HourlyEntry>>>,
    running: Arc<RwLock<bool>>,
}

impl StatsCollector {
    /// 创建统计收集器
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths: Some(paths),
            stats: Arc::new(RwLock::new(Stats::default())),
            hourly: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// 创建空实现
    ///
    /// 计数与持久化全部为空操作，在启动时显式选择，
    /// 而不是运行期探测模块是否存在。
    pub fn disabled() -> Self {
        Self {
            paths: None,
            stats: Arc::new(RwLock::new(Stats::default())),
            hourly: Arc::new(RwLock::new(Vec::new())),
            running: Arc::new(RwLock::new(false)),
        }
    }

    fn is_enabled(&self) -> bool {
        self.paths.is_some()
    }

    /// 从磁盘加载统计
    ///
    /// 文件缺失时写出默认值，损坏时保留默认值并告警。
    pub async fn load(&self) {
        let Some(paths) = &self.paths else {
            return;
        };

        match tokio::fs::read_to_string(paths.stats_file()).await {
            Ok(contents) => match serde_json::from_str::<Stats>(&contents) {
                Ok(stats) => {
                    *self.stats.write().await = stats;
                    info!("Stats loaded from file");
                }
                Err(e) => warn!(error = %e, "Failed to parse stats file, using defaults"),
            },
            Err(_) => {
                info!("Stats file not found, creating defaults");
                self.save_stats().await;
            }
        }

        match tokio::fs::read_to_string(paths.hourly_stats_file()).await {
            Ok(contents) => match serde_json::from_str::<Vec<HourlyEntry>>(&contents) {
                Ok(hourly) => {
                    *self.hourly.write().await = hourly;
                    info!("Hourly stats loaded from file");
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse hourly stats file, using defaults");
                    *self.hourly.write().await = Self::initial_hourly_entries();
                }
            },
            Err(_) => {
                info!("Hourly stats file not found, creating defaults");
                *self.hourly.write().await = Self::initial_hourly_entries();
                self.save_hourly().await;
            }
        }
    }

    /// 启动后台任务：定期保存与小时桶滚动
    pub async fn start(&self) {
        if !self.is_enabled() {
            return;
        }

        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Stats collector is already running");
                return;
            }
            *running = true;
        }

        info!("Stats collector started");

        let collector = self.clone_handles();
        let running = self.running.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(AUTOSAVE_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !*running.read().await {
                    break;
                }
                collector.save_stats().await;
            }
        });

        let collector = self.clone_handles();
        let running = self.running.clone();
        tokio::spawn(async move {
            collector.roll_forward().await;
            let mut ticker = tokio::time::interval(HOURLY_CHECK_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !*running.read().await {
                    info!("Stats collector stopped");
                    break;
                }
                collector.roll_forward().await;
            }
        });
    }

    /// 停止后台任务
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    /// 登记一次成功轮询
    pub async fn register_poll(&self, device_id: &str) {
        if !self.is_enabled() {
            return;
        }

        let now = Utc::now();
        {
            let mut stats = self.stats.write().await;
            stats.total_polls += 1;
            stats.last_poll = Some(now);

            let device = stats.device_stats.entry(device_id.to_string()).or_default();
            device.polls += 1;
            device.last_poll = Some(now);
        }

        self.update_hourly(device_id, true, false, now).await;
    }

    /// 登记一次轮询错误
    pub async fn register_error(&self, device_id: &str) {
        if !self.is_enabled() {
            return;
        }

        let now = Utc::now();
        {
            let mut stats = self.stats.write().await;
            stats.errors += 1;

            let device = stats.device_stats.entry(device_id.to_string()).or_default();
            device.errors += 1;
        }

        self.update_hourly(device_id, false, true, now).await;
    }

    /// 获取累计统计
    pub async fn stats(&self) -> Stats {
        self.stats.read().await.clone()
    }

    /// 获取每小时统计
    pub async fn hourly(&self) -> Vec<HourlyEntry> {
        self.hourly.read().await.clone()
    }

    /// 获取单设备统计（未知设备返回零值）
    pub async fn device_stats(&self, device_id: &str) -> DeviceStat {
        self.stats
            .read()
            .await
            .device_stats
            .get(device_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 重置统计
    ///
    /// 清零所有计数器并为当天重建 24 个空小时桶，立即持久化。
    pub async fn reset(&self) {
        {
            let mut stats = self.stats.write().await;
            *stats = Stats::default();
        }
        {
            let mut hourly = self.hourly.write().await;
            *hourly = Self::initial_hourly_entries();
        }

        self.save_stats().await;
        self.save_hourly().await;

        info!("Stats reset");
    }

    /// 确保当前小时桶存在，并裁剪 7 天窗口之外的桶
    ///
    /// 返回是否新建了桶。
    pub async fn roll_forward(&self) -> bool {
        let now = Utc::now();
        let created = {
            let mut hourly = self.hourly.write().await;
            if Self::find_bucket(&hourly, now).is_some() {
                false
            } else {
                hourly.push(HourlyEntry::empty(Self::truncate_to_hour(now)));

                let cutoff = now - ChronoDuration::days(HOURLY_RETENTION_DAYS);
                hourly.retain(|entry| entry.timestamp >= cutoff);
                true
            }
        };

        if created {
            debug!("Hour bucket rolled forward");
            self.save_hourly().await;
        }
        created
    }

    async fn update_hourly(&self, device_id: &str, is_poll: bool, is_error: bool, now: DateTime<Utc>) {
        let mut hourly = self.hourly.write().await;

        let entry = match Self::find_bucket(&hourly, now) {
            Some(index) => &mut hourly[index],
            None => {
                hourly.push(HourlyEntry::empty(Self::truncate_to_hour(now)));
                let last = hourly.len() - 1;
                &mut hourly[last]
            }
        };

        if is_poll {
            entry.polls += 1;
        }
        if is_error {
            entry.errors += 1;
        }

        let device = entry
            .device_stats
            .entry(device_id.to_string())
            .or_insert_with(HourlyDeviceStat::default);
        if is_poll {
            device.polls += 1;
        }
        if is_error {
            device.errors += 1;
        }
    }

    /// 查找与 now 同一 (小时, 日, 月, 年) 的桶
    fn find_bucket(hourly: &[HourlyEntry], now: DateTime<Utc>) -> Option<usize> {
        hourly.iter().position(|entry| {
            entry.timestamp.hour() == now.hour()
                && entry.timestamp.date_naive() == now.date_naive()
        })
    }

    fn truncate_to_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
        timestamp
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(timestamp)
    }

    /// 为当天生成 24 个空桶
    fn initial_hourly_entries() -> Vec<HourlyEntry> {
        let today = Utc::now().date_naive();
        (0..24)
            .filter_map(|hour| today.and_hms_opt(hour, 0, 0))
            .map(|naive| HourlyEntry::empty(naive.and_utc()))
            .collect()
    }

    async fn save_stats(&self) {
        let Some(paths) = &self.paths else {
            return;
        };

        if let Err(e) = tokio::fs::create_dir_all(paths.configs_dir()).await {
            error!(error = %e, "Failed to create configs directory");
            return;
        }

        let stats = self.stats.read().await.clone();
        match serde_json::to_string_pretty(&stats) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(paths.stats_file(), json).await {
                    error!(error = %e, "Failed to save stats");
                } else {
                    debug!("Stats saved to file");
                }
            }
            Err(e) => error!(error = %e, "Failed to serialize stats"),
        }
    }

    async fn save_hourly(&self) {
        let Some(paths) = &self.paths else {
            return;
        };

        if let Err(e) = tokio::fs::create_dir_all(paths.configs_dir()).await {
            error!(error = %e, "Failed to create configs directory");
            return;
        }

        let hourly = self.hourly.read().await.clone();
        match serde_json::to_string_pretty(&hourly) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(paths.hourly_stats_file(), json).await {
                    error!(error = %e, "Failed to save hourly stats");
                } else {
                    debug!("Hourly stats saved to file");
                }
            }
            Err(e) => error!(error = %e, "Failed to serialize hourly stats"),
        }
    }

    fn clone_handles(&self) -> Self {
        Self {
            paths: self.paths.clone(),
            stats: self.stats.clone(),
            hourly: self.hourly.clone(),
            running: self.running.clone(),
        }
    }
}
