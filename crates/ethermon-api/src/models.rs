use chrono::{DateTime, Utc};
use ethermon_archive::ArchiveFileInfo;
use ethermon_device::RegisterValue;
use ethermon_stats::Stats;
use serde::{Deserialize, Serialize};

/// 连接 / 断开 / 停止轮询请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdRequest {
    pub device_id: String,
}

/// 即席读取请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRequest {
    pub device_id: String,
    pub register_type: String,
    pub address: u16,
    pub length: Option<u16>,
}

/// 即席写入请求：`value` 写单个寄存器，`values` 写多个
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    pub device_id: String,
    pub address: u16,
    pub value: Option<u16>,
    pub values: Option<Vec<u16>>,
}

/// 启动轮询请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPollingRequest {
    pub device_id: String,
    /// 轮询间隔（毫秒），缺省 5000
    pub interval: Option<u64>,
}

/// 通用成功响应
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// 即席读取响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResponse {
    pub success: bool,
    pub data: RegisterValue,
    pub device: String,
    pub register_type: String,
    pub address: u16,
    pub length: u16,
}

/// 启动轮询响应
#[derive(Debug, Serialize)]
pub struct StartPollingResponse {
    pub success: bool,
    pub message: String,
    pub interval: u64,
}

/// 统计响应：累计统计加当前时间戳
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: Stats,
    pub timestamp: DateTime<Utc>,
}

/// 归档列表响应
#[derive(Debug, Serialize)]
pub struct ArchivesResponse {
    pub archives: Vec<ArchiveFileInfo>,
}

/// ZIP 创建响应
#[derive(Debug, Serialize)]
pub struct ZipResponse {
    pub success: bool,
    pub message: String,
    pub file: String,
    pub size: u64,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
}
