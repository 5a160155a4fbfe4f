use chrono::{DateTime, NaiveDate, Utc};
use ethermon_device::Reading;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 一天的归档内容：设备 ID -> 设备记录
pub type DayArchive = HashMap<String, DeviceDayRecord>;

/// 归档中单个设备的记录
///
/// 磁盘格式与内存快照一致，寄存器读数平铺在设备对象里，
/// 另带一个 `lastUpdate` 时间戳。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceDayRecord {
    /// 寄存器名称 -> 读数
    #[serde(flatten)]
    pub readings: HashMap<String, Reading>,

    /// 该设备最近一次合并进文件的时间
    #[serde(
        rename = "lastUpdate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_update: Option<DateTime<Utc>>,
}

/// 归档文件描述
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveFileInfo {
    /// 文件名，例如 `2024-03-01.json`
    pub name: String,

    /// 从文件名推导的日期
    pub date: NaiveDate,

    /// 文件大小（字节）
    pub size: u64,

    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// 月度 ZIP 信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipInfo {
    /// 文件名，例如 `202403.zip`
    pub file: String,

    /// 文件大小（字节）
    pub size: u64,

    /// 本次调用是否新建了文件
    pub created: bool,
}

/// 保留策略清理结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub deleted_daily_files: usize,
    pub deleted_zip_files: usize,
}
