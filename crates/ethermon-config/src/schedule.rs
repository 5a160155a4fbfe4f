use serde::{Deserialize, Serialize};

/// 调度配置（`configs/schedule.json`）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 归档相关的调度
    #[serde(default)]
    pub archiving: ArchivingConfig,
}

/// 归档调度配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivingConfig {
    /// 每日归档检查
    #[serde(default)]
    pub daily_archive: DailyArchiveConfig,

    /// 月度 ZIP 打包
    #[serde(default)]
    pub monthly_zip: MonthlyZipConfig,

    /// 保留策略
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Default for ArchivingConfig {
    fn default() -> Self {
        Self {
            daily_archive: DailyArchiveConfig::default(),
            monthly_zip: MonthlyZipConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

/// 每日归档检查配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyArchiveConfig {
    pub enabled: bool,

    /// 执行时间，格式 `HH:MM:SS`
    pub time: String,
}

impl Default for DailyArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time: "00:05:00".to_string(),
        }
    }
}

/// 月度 ZIP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyZipConfig {
    pub enabled: bool,

    /// 每月第几天执行，数字或 `"last"`
    pub day: MonthDay,

    /// 执行时间，格式 `HH:MM:SS`
    pub time: String,
}

impl Default for MonthlyZipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            day: MonthDay::Day(1),
            time: "01:00:00".to_string(),
        }
    }
}

/// 月内执行日：具体日期或月末
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonthDay {
    Day(u8),
    Keyword(String),
}

impl MonthDay {
    /// 转换为 cron 的日字段
    ///
    /// `"last"` 映射为 28-31 区间，依靠任务本身的幂等跳过来避免重复打包。
    pub fn to_cron_field(&self) -> String {
        match self {
            MonthDay::Day(d) if (1..=31).contains(d) => d.to_string(),
            MonthDay::Day(_) => "28-31".to_string(),
            MonthDay::Keyword(_) => "28-31".to_string(),
        }
    }
}

/// 归档保留策略
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionConfig {
    /// 保留的每日归档数量
    pub daily_files: usize,

    /// 保留的月度 ZIP 数量
    pub monthly_zips: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            daily_files: 31,
            monthly_zips: 12,
        }
    }
}

/// 解析 `HH:MM:SS` 时间串
pub fn parse_time(time: &str) -> Option<(u8, u8, u8)> {
    let mut parts = time.split(':');
    let hours: u8 = parts.next()?.parse().ok()?;
    let minutes: u8 = parts.next()?.parse().ok()?;
    let seconds: u8 = parts.next()?.parse().ok()?;

    if parts.next().is_some() || hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    Some((hours, minutes, seconds))
}
