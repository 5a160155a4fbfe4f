use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 累计统计（`configs/stats.json`）
///
/// 除显式重置外计数器只增不减。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// 成功轮询总数
    pub total_polls: u64,

    /// 错误总数
    pub errors: u64,

    /// 最近一次成功轮询时间
    pub last_poll: Option<DateTime<Utc>>,

    /// 按设备统计
    #[serde(default)]
    pub device_stats: HashMap<String, DeviceStat>,
}

/// 单设备累计统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStat {
    pub polls: u64,
    pub errors: u64,
    pub last_poll: Option<DateTime<Utc>>,
}

/// 小时桶（`configs/hourly-stats.json` 中的一条）
///
/// timestamp 截断到整点；同一 (小时, 日, 月, 年) 只有一个桶。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyEntry {
    pub timestamp: DateTime<Utc>,
    pub polls: u64,
    pub errors: u64,

    #[serde(default)]
    pub device_stats: HashMap<String, HourlyDeviceStat>,
}

impl HourlyEntry {
    /// 创建一个空的小时桶
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            polls: 0,
            errors: 0,
            device_stats: HashMap::new(),
        }
    }
}

/// 小时桶内的单设备统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyDeviceStat {
    pub polls: u64,
    pub errors: u64,
}
