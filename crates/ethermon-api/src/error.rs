use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// API 错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 设备未找到
    DeviceNotFound(String),
    /// 设备数据未找到
    DataNotFound(String),
    /// 归档未找到
    ArchiveNotFound(String),
    /// 请求错误
    BadRequest(String),
    /// 未认证
    Unauthorized(String),
    /// 权限不足
    Forbidden(String),
    /// 设备连接失败
    ConnectionFailed(String),
    /// 内部错误
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::DeviceNotFound(id) => write!(f, "Device not found: {}", id),
            ApiError::DataNotFound(id) => write!(f, "Device data not found: {}", id),
            ApiError::ArchiveNotFound(name) => write!(f, "Archive not found: {}", name),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::DeviceNotFound(ref id) => {
                (StatusCode::NOT_FOUND, format!("Device not found: {}", id))
            }
            ApiError::DataNotFound(ref id) => {
                (StatusCode::NOT_FOUND, format!("Device data not found: {}", id))
            }
            ApiError::ArchiveNotFound(ref name) => {
                (StatusCode::NOT_FOUND, format!("Archive not found: {}", name))
            }
            ApiError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::ConnectionFailed(ref msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::InternalError(ref msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

// 从核心层错误转换
impl From<ethermon_device::DeviceError> for ApiError {
    fn from(err: ethermon_device::DeviceError) -> Self {
        match err {
            ethermon_device::DeviceError::NotFound(id) => ApiError::DeviceNotFound(id),
            ethermon_device::DeviceError::ConfigRead(e) => ApiError::InternalError(e.to_string()),
            ethermon_device::DeviceError::ConfigParse(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<ethermon_archive::ArchiveError> for ApiError {
    fn from(err: ethermon_archive::ArchiveError) -> Self {
        match err {
            ethermon_archive::ArchiveError::NotFound(name) => ApiError::ArchiveNotFound(name),
            ethermon_archive::ArchiveError::InvalidDate(date) => {
                ApiError::BadRequest(format!("Invalid date format: {}", date))
            }
            ethermon_archive::ArchiveError::InvalidMonth(month) => {
                ApiError::BadRequest(format!("Invalid month format, expected YYYYMM: {}", month))
            }
            ethermon_archive::ArchiveError::Io(e) => ApiError::InternalError(e.to_string()),
            ethermon_archive::ArchiveError::Json(e) => ApiError::InternalError(e.to_string()),
            ethermon_archive::ArchiveError::Zip(e) => ApiError::InternalError(e),
        }
    }
}

impl From<ethermon_modbus::ModbusError> for ApiError {
    fn from(err: ethermon_modbus::ModbusError) -> Self {
        match err {
            ethermon_modbus::ModbusError::NotConnected => {
                ApiError::BadRequest("Not connected to a device".to_string())
            }
            ethermon_modbus::ModbusError::Connect(msg) => ApiError::ConnectionFailed(msg),
            ethermon_modbus::ModbusError::Protocol(msg) => ApiError::InternalError(msg),
            ethermon_modbus::ModbusError::UnsupportedRegister(kind) => {
                ApiError::BadRequest(format!("Unknown register type: {}", kind))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
