use crate::error::{ArchiveError, Result};
use crate::model::{ArchiveFileInfo, DayArchive, DeviceDayRecord};
use chrono::{NaiveDate, Utc};
use ethermon_config::StoragePaths;
use ethermon_device::DeviceSnapshot;
use tracing::{debug, warn};

/// 归档存储
///
/// 每天一个 JSON 文件（`archives/YYYY-MM-DD.json`）。向文件写入某个
/// 设备的数据时按设备 ID 做增量合并，其他设备的已有数据绝不丢失。
pub struct ArchiveStore {
    paths: StoragePaths,
}

impl ArchiveStore {
    /// 创建归档存储
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// 将设备当前快照合并进当天的归档文件
    ///
    /// 已有文件解析失败时按空文件处理并告警，不阻塞写入。
    pub async fn save_device(&self, device_id: &str, snapshot: &DeviceSnapshot) -> Result<()> {
        if snapshot.is_empty() {
            return Ok(());
        }

        let date = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let path = self.paths.daily_archive_file(&date);

        tokio::fs::create_dir_all(self.paths.archives_dir()).await?;

        let mut day: DayArchive = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(day) => day,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to parse existing archive file, treating as empty"
                    );
                    DayArchive::default()
                }
            },
            Err(_) => DayArchive::default(),
        };

        let record = day
            .entry(device_id.to_string())
            .or_insert_with(DeviceDayRecord::default);
        for (name, reading) in snapshot {
            record.readings.insert(name.clone(), reading.clone());
        }
        record.last_update = Some(Utc::now());

        let json = serde_json::to_string_pretty(&day)?;
        tokio::fs::write(&path, json).await?;

        debug!(device_id = %device_id, date = %date, "Device data merged into archive");
        Ok(())
    }

    /// 列出所有每日归档文件，按日期从新到旧排序
    pub async fn list(&self) -> Result<Vec<ArchiveFileInfo>> {
        let dir = self.paths.archives_dir();
        if !dir.exists() {
            tokio::fs::create_dir_all(&dir).await?;
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") else {
                debug!(file = %path.display(), "Skipping file with non-date name");
                continue;
            };

            let metadata = entry.metadata().await?;
            let modified_at = metadata.modified().map(Into::into).unwrap_or_else(|_| Utc::now());
            let created_at = metadata.created().map(Into::into).unwrap_or(modified_at);

            files.push(ArchiveFileInfo {
                name: format!("{stem}.json"),
                date,
                size: metadata.len(),
                created_at,
                modified_at,
            });
        }

        files.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(files)
    }

    /// 读取某一天的归档
    pub async fn read_day(&self, date: &str) -> Result<DayArchive> {
        if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            return Err(ArchiveError::InvalidDate(date.to_string()));
        }

        let path = self.paths.daily_archive_file(date);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| ArchiveError::NotFound(date.to_string()))?;

        Ok(serde_json::from_str(&contents)?)
    }

    /// 某一天的归档文件是否存在
    pub async fn daily_exists(&self, date: &str) -> bool {
        tokio::fs::try_exists(self.paths.daily_archive_file(date))
            .await
            .unwrap_or(false)
    }

    /// 存储路径布局
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }
}
