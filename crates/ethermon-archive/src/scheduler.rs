use crate::cleanup::CleanupManager;
use crate::error::ArchiveError;
use crate::store::ArchiveStore;
use crate::zipper::ZipArchiver;
use chrono::{Datelike, Duration, Utc};
use ethermon_config::{parse_time, ScheduleConfig, StoragePaths};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// 归档任务调度器
///
/// 按 `configs/schedule.json` 安排三类后台任务：
/// 每日归档检查、上个月的 ZIP 打包、保留策略清理（固定每天 01:00:00）。
pub struct ArchiveScheduler {
    scheduler: JobScheduler,
    store: Arc<ArchiveStore>,
    zipper: Arc<ZipArchiver>,
    cleaner: Arc<CleanupManager>,
    config: ScheduleConfig,
}

impl ArchiveScheduler {
    /// 创建调度器
    pub async fn new(paths: StoragePaths, config: ScheduleConfig) -> anyhow::Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            store: Arc::new(ArchiveStore::new(paths.clone())),
            zipper: Arc::new(ZipArchiver::new(paths.clone())),
            cleaner: Arc::new(CleanupManager::new(paths)),
            config,
        })
    }

    /// 注册任务并启动调度
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let archiving = self.config.archiving.clone();

        if archiving.daily_archive.enabled {
            let (hours, minutes, seconds) = time_or_default(&archiving.daily_archive.time, (0, 5, 0));
            let cron = format!("{seconds} {minutes} {hours} * * *");
            info!(cron = %cron, "Scheduling daily archive check");

            let store = self.store.clone();
            let job = Job::new_async(cron.as_str(), move |_uuid, _l| {
                let store = store.clone();
                Box::pin(async move {
                    daily_archive_check(store).await;
                })
            })?;
            self.scheduler.add(job).await?;
        }

        if archiving.monthly_zip.enabled {
            let (hours, minutes, seconds) = time_or_default(&archiving.monthly_zip.time, (1, 0, 0));
            let day_field = archiving.monthly_zip.day.to_cron_field();
            let cron = format!("{seconds} {minutes} {hours} {day_field} * *");
            info!(cron = %cron, "Scheduling monthly zip");

            let zipper = self.zipper.clone();
            let job = Job::new_async(cron.as_str(), move |_uuid, _l| {
                let zipper = zipper.clone();
                Box::pin(async move {
                    monthly_zip(zipper).await;
                })
            })?;
            self.scheduler.add(job).await?;
        }

        // 保留策略清理：每天 01:00:00
        let retention = archiving.retention.clone();
        let cleaner = self.cleaner.clone();
        let job = Job::new_async("0 0 1 * * *", move |_uuid, _l| {
            let cleaner = cleaner.clone();
            let retention = retention.clone();
            Box::pin(async move {
                match cleaner.cleanup(&retention).await {
                    Ok(stats) => info!(
                        daily = stats.deleted_daily_files,
                        zips = stats.deleted_zip_files,
                        "Archive cleanup completed"
                    ),
                    Err(e) => error!(error = %e, "Archive cleanup failed"),
                }
            })
        })?;
        self.scheduler.add(job).await?;

        self.scheduler.start().await?;
        info!("Archive scheduler started");
        Ok(())
    }

    /// 停止调度器
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        self.scheduler.shutdown().await?;
        info!("Archive scheduler stopped");
        Ok(())
    }
}

/// 解析 `HH:MM:SS`，失败时回退默认值并告警
fn time_or_default(time: &str, default: (u8, u8, u8)) -> (u8, u8, u8) {
    match parse_time(time) {
        Some(parsed) => parsed,
        None => {
            warn!(time = %time, "Invalid schedule time, falling back to default");
            default
        }
    }
}

/// 检查昨天的归档是否在（轮询器在当天已写好文件，这里只做核对）
async fn daily_archive_check(store: Arc<ArchiveStore>) {
    let yesterday = (Utc::now().date_naive() - Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();

    if store.daily_exists(&yesterday).await {
        info!(date = %yesterday, "Daily archive present");
    } else {
        warn!(date = %yesterday, "Daily archive missing, nothing was recorded");
    }
}

/// 打包上个月的每日归档
async fn monthly_zip(zipper: Arc<ZipArchiver>) {
    let today = Utc::now().date_naive();
    let Some(last_of_prev_month) = today.with_day(1).and_then(|d| d.pred_opt()) else {
        error!("Failed to compute previous month");
        return;
    };
    let month = last_of_prev_month.format("%Y%m").to_string();

    match zipper.create(&month, false).await {
        Ok(info) if info.created => {
            info!(month = %month, size = info.size, "Monthly zip task completed")
        }
        Ok(_) => info!(month = %month, "Monthly zip already exists, skipped"),
        Err(ArchiveError::NotFound(_)) => {
            warn!(month = %month, "No daily archives found for previous month")
        }
        Err(e) => error!(month = %month, error = %e, "Monthly zip task failed"),
    }
}
