use thiserror::Error;

/// 归档层错误类型
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// 归档不存在
    #[error("Archive not found: {0}")]
    NotFound(String),

    /// 日期格式错误，应为 YYYY-MM-DD
    #[error("Invalid archive date: {0}")]
    InvalidDate(String),

    /// 月份格式错误，应为 YYYYMM
    #[error("Invalid archive month: {0}")]
    InvalidMonth(String),

    /// 文件系统错误
    #[error("Archive IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("Archive serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// ZIP 打包错误
    #[error("Zip error: {0}")]
    Zip(String),
}

/// 归档层结果类型
pub type Result<T> = std::result::Result<T, ArchiveError>;
