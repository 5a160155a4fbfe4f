use std::path::{Path, PathBuf};

/// 存储路径布局
///
/// 所有持久化文件都位于同一个数据根目录下：
/// `configs/` 存放配置与统计，`archives/` 存放每日归档，
/// `archives/Zip/` 存放月度压缩包。
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    /// 创建路径布局
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// 数据根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 配置目录
    pub fn configs_dir(&self) -> PathBuf {
        self.root.join("configs")
    }

    /// 归档目录
    pub fn archives_dir(&self) -> PathBuf {
        self.root.join("archives")
    }

    /// 月度 ZIP 目录
    pub fn zip_dir(&self) -> PathBuf {
        self.archives_dir().join("Zip")
    }

    /// 设备配置文件
    pub fn devices_file(&self) -> PathBuf {
        self.configs_dir().join("devices.json")
    }

    /// 调度配置文件
    pub fn schedule_file(&self) -> PathBuf {
        self.configs_dir().join("schedule.json")
    }

    /// 累计统计文件
    pub fn stats_file(&self) -> PathBuf {
        self.configs_dir().join("stats.json")
    }

    /// 每小时统计文件
    pub fn hourly_stats_file(&self) -> PathBuf {
        self.configs_dir().join("hourly-stats.json")
    }

    /// 某一天的归档文件（date 为 `YYYY-MM-DD`）
    pub fn daily_archive_file(&self, date: &str) -> PathBuf {
        self.archives_dir().join(format!("{date}.json"))
    }

    /// 某个月的 ZIP 文件（month 为 `YYYYMM`）
    pub fn monthly_zip_file(&self, month: &str) -> PathBuf {
        self.zip_dir().join(format!("{month}.zip"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = StoragePaths::new("/data");

        assert_eq!(paths.devices_file(), PathBuf::from("/data/configs/devices.json"));
        assert_eq!(
            paths.daily_archive_file("2024-03-01"),
            PathBuf::from("/data/archives/2024-03-01.json")
        );
        assert_eq!(
            paths.monthly_zip_file("202403"),
            PathBuf::from("/data/archives/Zip/202403.zip")
        );
    }
}
