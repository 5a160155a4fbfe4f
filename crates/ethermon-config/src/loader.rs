use crate::{ScheduleConfig, StoragePaths};
use tracing::{info, warn};

/// 配置加载器
///
/// 配置文件缺失或损坏时回退到默认值，绝不让轮询子系统因此启动失败。
pub struct ConfigLoader {
    paths: StoragePaths,
}

impl ConfigLoader {
    /// 创建配置加载器
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// 加载调度配置
    ///
    /// 文件不存在或解析失败时返回默认配置。
    pub async fn load_schedule(&self) -> ScheduleConfig {
        let path = self.paths.schedule_file();

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(_) => {
                warn!(path = %path.display(), "Schedule config not found, using defaults");
                return ScheduleConfig::default();
            }
        };

        match serde_json::from_str::<ScheduleConfig>(&contents) {
            Ok(config) => {
                info!(path = %path.display(), "Schedule config loaded");
                config
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse schedule config, using defaults"
                );
                ScheduleConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MonthDay;

    #[tokio::test]
    async fn test_load_missing_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(StoragePaths::new(dir.path()));

        // 文件不存在时返回默认配置
        let config = loader.load_schedule().await;
        assert_eq!(config.archiving.retention.daily_files, 31);
    }

    #[tokio::test]
    async fn test_load_schedule_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(dir.path());
        tokio::fs::create_dir_all(paths.configs_dir()).await.unwrap();
        tokio::fs::write(
            paths.schedule_file(),
            r#"{
                "archiving": {
                    "dailyArchive": { "enabled": false, "time": "04:00:00" },
                    "monthlyZip": { "enabled": true, "day": "last", "time": "05:00:00" },
                    "retention": { "dailyFiles": 7, "monthlyZips": 3 }
                }
            }"#,
        )
        .await
        .unwrap();

        let config = ConfigLoader::new(paths).load_schedule().await;
        assert!(!config.archiving.daily_archive.enabled);
        assert_eq!(config.archiving.monthly_zip.day, MonthDay::Keyword("last".to_string()));
        assert_eq!(config.archiving.retention.daily_files, 7);
    }

    #[tokio::test]
    async fn test_load_corrupt_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(dir.path());
        tokio::fs::create_dir_all(paths.configs_dir()).await.unwrap();
        tokio::fs::write(paths.schedule_file(), "{ not json").await.unwrap();

        // 损坏的文件回退到默认配置
        let config = ConfigLoader::new(paths).load_schedule().await;
        assert_eq!(config.archiving.retention.monthly_zips, 12);
    }
}
