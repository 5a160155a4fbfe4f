use crate::error::{ArchiveError, Result};
use crate::model::ZipInfo;
use ethermon_config::StoragePaths;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

/// 月度 ZIP 打包器
///
/// 把一个月的全部每日归档打进 `archives/Zip/YYYYMM.zip`。
pub struct ZipArchiver {
    paths: StoragePaths,
}

impl ZipArchiver {
    /// 创建打包器
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// 创建某个月的 ZIP
    ///
    /// * `month` - `YYYYMM`
    /// * `overwrite` - false 时已存在的 ZIP 原样返回（调度器路径），
    ///   true 时重建（显式接口路径）
    ///
    /// 没有任何匹配的每日归档时返回 [`ArchiveError::NotFound`]，
    /// 且不创建文件。归档文件名始终是零填充的 `YYYY-MM-DD`，
    /// 因此只按规范前缀匹配一次。
    pub async fn create(&self, month: &str, overwrite: bool) -> Result<ZipInfo> {
        let prefix = month_prefix(month)?;
        let zip_path = self.paths.monthly_zip_file(month);

        if !overwrite {
            if let Ok(metadata) = tokio::fs::metadata(&zip_path).await {
                debug!(month = %month, "Monthly zip already exists, skipping");
                return Ok(ZipInfo {
                    file: format!("{month}.zip"),
                    size: metadata.len(),
                    created: false,
                });
            }
        }

        let files = self.collect_daily_files(&prefix).await?;
        if files.is_empty() {
            return Err(ArchiveError::NotFound(month.to_string()));
        }

        tokio::fs::create_dir_all(self.paths.zip_dir()).await?;

        let out_path = zip_path.clone();
        let size = tokio::task::spawn_blocking(move || write_zip(&out_path, &files))
            .await
            .map_err(|e| ArchiveError::Zip(e.to_string()))??;

        info!(month = %month, size = %size, "Monthly zip created");
        Ok(ZipInfo {
            file: format!("{month}.zip"),
            size,
            created: true,
        })
    }

    /// 收集文件名匹配 `YYYY-MM` 前缀的每日归档，按名称升序
    async fn collect_daily_files(&self, prefix: &str) -> Result<Vec<PathBuf>> {
        let dir = self.paths.archives_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".json") && name.starts_with(prefix) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

/// 校验 `YYYYMM` 并转换为零填充的 `YYYY-MM` 文件名前缀
fn month_prefix(month: &str) -> Result<String> {
    if month.len() != 6 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ArchiveError::InvalidMonth(month.to_string()));
    }

    let mm: u8 = month[4..6]
        .parse()
        .map_err(|_| ArchiveError::InvalidMonth(month.to_string()))?;
    if !(1..=12).contains(&mm) {
        return Err(ArchiveError::InvalidMonth(month.to_string()));
    }

    Ok(format!("{}-{}", &month[..4], &month[4..6]))
}

/// 同步写 ZIP，在 blocking 线程池里执行
fn write_zip(zip_path: &PathBuf, files: &[PathBuf]) -> Result<u64> {
    let out = std::fs::File::create(zip_path)?;
    let mut writer = ZipWriter::new(out);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        writer
            .start_file(name, options)
            .map_err(|e| ArchiveError::Zip(e.to_string()))?;
        let contents = std::fs::read(path)?;
        writer.write_all(&contents)?;
    }

    writer.finish().map_err(|e| ArchiveError::Zip(e.to_string()))?;
    Ok(std::fs::metadata(zip_path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_daily(paths: &StoragePaths, dates: &[&str]) {
        tokio::fs::create_dir_all(paths.archives_dir()).await.unwrap();
        for date in dates {
            tokio::fs::write(
                paths.daily_archive_file(date),
                format!(r#"{{"dev-1":{{"lastUpdate":null}},"date":"{date}"}}"#),
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_monthly_zip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(dir.path());
        seed_daily(&paths, &["2024-03-01", "2024-03-02", "2024-04-01"]).await;

        let zipper = ZipArchiver::new(paths.clone());
        let info = zipper.create("202403", false).await.unwrap();

        assert!(info.created);
        assert!(info.size > 0);
        assert!(paths.monthly_zip_file("202403").exists());
    }

    #[tokio::test]
    async fn test_no_matching_files_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(dir.path());
        seed_daily(&paths, &["2024-04-01"]).await;

        let zipper = ZipArchiver::new(paths.clone());
        let result = zipper.create("202403", false).await;

        assert!(matches!(result, Err(ArchiveError::NotFound(_))));
        assert!(!paths.monthly_zip_file("202403").exists());
    }

    #[tokio::test]
    async fn test_existing_zip_is_skipped_unless_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StoragePaths::new(dir.path());
        seed_daily(&paths, &["2024-03-01"]).await;

        let zipper = ZipArchiver::new(paths.clone());
        assert!(zipper.create("202403", false).await.unwrap().created);

        // 调度器路径：幂等跳过
        assert!(!zipper.create("202403", false).await.unwrap().created);

        // 显式接口路径：重建
        assert!(zipper.create("202403", true).await.unwrap().created);
    }

    #[tokio::test]
    async fn test_invalid_month() {
        let dir = tempfile::tempdir().unwrap();
        let zipper = ZipArchiver::new(StoragePaths::new(dir.path()));

        for month in ["2024-3", "abc123", "202413", "202400", "20243"] {
            assert!(matches!(
                zipper.create(month, false).await,
                Err(ArchiveError::InvalidMonth(_))
            ));
        }
    }

    #[test]
    fn test_month_prefix() {
        assert_eq!(month_prefix("202403").unwrap(), "2024-03");
        assert_eq!(month_prefix("202412").unwrap(), "2024-12");
        assert!(month_prefix("202413").is_err());
    }
}
