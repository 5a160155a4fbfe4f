use thiserror::Error;

/// 设备层错误类型
#[derive(Error, Debug)]
pub enum DeviceError {
    /// 设备未找到
    #[error("Device not found: {0}")]
    NotFound(String),

    /// 设备配置读取失败
    #[error("Failed to read device config: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// 设备配置解析失败
    #[error("Failed to parse device config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// 设备层结果类型
pub type Result<T> = std::result::Result<T, DeviceError>;
