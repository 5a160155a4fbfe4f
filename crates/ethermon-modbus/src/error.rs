use thiserror::Error;

/// ModBus 会话错误类型
#[derive(Error, Debug)]
pub enum ModbusError {
    /// 没有活动连接
    #[error("Not connected to a device")]
    NotConnected,

    /// 连接建立失败
    #[error("Connection failed: {0}")]
    Connect(String),

    /// 读写请求失败（超时、异常响应等）
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 不支持的寄存器类型
    #[error("Unsupported register type: {0}")]
    UnsupportedRegister(String),
}

/// ModBus 会话结果类型
pub type Result<T> = std::result::Result<T, ModbusError>;
