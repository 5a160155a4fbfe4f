use crate::error::Result;
use crate::model::CleanupStats;
use ethermon_config::{RetentionConfig, StoragePaths};
use std::path::{Path, PathBuf};
use tracing::info;

/// 归档保留清理
///
/// 按文件名降序排序，超出保留数量的文件被永久删除。
pub struct CleanupManager {
    paths: StoragePaths,
}

impl CleanupManager {
    /// 创建清理管理器
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// 执行保留策略
    pub async fn cleanup(&self, retention: &RetentionConfig) -> Result<CleanupStats> {
        let deleted_daily_files = self
            .prune(&self.paths.archives_dir(), "json", retention.daily_files)
            .await?;
        let deleted_zip_files = self
            .prune(&self.paths.zip_dir(), "zip", retention.monthly_zips)
            .await?;

        if deleted_daily_files > 0 || deleted_zip_files > 0 {
            info!(
                daily = deleted_daily_files,
                zips = deleted_zip_files,
                "Old archives removed by retention policy"
            );
        }

        Ok(CleanupStats {
            deleted_daily_files,
            deleted_zip_files,
        })
    }

    /// 删除目录里按名称排序第 keep 个之后的所有指定扩展名文件
    async fn prune(&self, dir: &Path, extension: &str, keep: usize) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let mut files: Vec<PathBuf> = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(extension) {
                files.push(path);
            }
        }

        // 文件名即日期，降序后最新的排在前面
        files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

        let mut deleted = 0;
        for path in files.iter().skip(keep) {
            tokio::fs::remove_file(path).await?;
            info!(file = %path.display(), "Deleted expired archive");
            deleted += 1;
        }

        Ok(deleted)
    }
}
