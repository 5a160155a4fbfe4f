use crate::error::{ModbusError, Result};
use ethermon_device::Device;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_modbus::prelude::*;
use tracing::{debug, info, warn};

/// 默认连接超时（毫秒）
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// ModBus/TCP 会话
///
/// 同一时刻最多持有一个到某台设备的 TCP 连接。所有设备按顺序复用
/// 同一个会话对象：每个轮询周期连接、读完、断开，
/// 把打开的套接字数量限制在一个。
pub struct ModbusSession {
    context: Option<client::Context>,
    connect_timeout: Duration,
}

impl ModbusSession {
    /// 创建会话（未连接状态）
    pub fn new() -> Self {
        Self {
            context: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    /// 指定连接超时创建会话
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            context: None,
            connect_timeout: timeout,
        }
    }

    /// 连接到设备
    ///
    /// 已连接时先断开旧连接。失败时会话保持未连接状态。
    pub async fn connect(&mut self, device: &Device) -> Result<()> {
        if self.context.is_some() {
            self.disconnect().await;
        }

        let addr: SocketAddr = format!("{}:{}", device.ip, device.port)
            .parse()
            .map_err(|_| {
                ModbusError::Connect(format!("invalid socket address {}:{}", device.ip, device.port))
            })?;

        let stream = match tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!(device = %device.name, addr = %addr, error = %e, "Failed to connect to device");
                return Err(ModbusError::Connect(e.to_string()));
            }
            Err(_) => {
                warn!(device = %device.name, addr = %addr, "Connection to device timed out");
                return Err(ModbusError::Connect(format!("connection to {addr} timed out")));
            }
        };

        let context = client::tcp::attach_slave(stream, Slave(device.unit_id));
        self.context = Some(context);

        info!(
            device = %device.name,
            addr = %addr,
            unit_id = %device.unit_id,
            "Connected to device"
        );
        Ok(())
    }

    /// 断开连接
    ///
    /// 幂等：没有连接时什么都不做。
    pub async fn disconnect(&mut self) {
        if let Some(mut context) = self.context.take() {
            if let Err(e) = context.disconnect().await {
                debug!(error = %e, "Error while closing connection");
            }
            info!("Disconnected from device");
        }
    }

    /// 是否已连接
    pub fn is_connected(&self) -> bool {
        self.context.is_some()
    }

    /// 读取保持寄存器
    pub async fn read_holding_registers(&mut self, addr: u16, count: u16) -> Result<Vec<u16>> {
        let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;

        let values = ctx
            .read_holding_registers(addr, count)
            .await
            .map_err(|e| ModbusError::Protocol(format!("Modbus IO error: {e:?}")))?
            .map_err(|e| ModbusError::Protocol(format!("Modbus exception: {e:?}")))?;

        debug!(addr = %addr, count = %count, "Read holding registers");
        Ok(values)
    }

    /// 读取输入寄存器
    pub async fn read_input_registers(&mut self, addr: u16, count: u16) -> Result<Vec<u16>> {
        let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;

        let values = ctx
            .read_input_registers(addr, count)
            .await
            .map_err(|e| ModbusError::Protocol(format!("Modbus IO error: {e:?}")))?
            .map_err(|e| ModbusError::Protocol(format!("Modbus exception: {e:?}")))?;

        debug!(addr = %addr, count = %count, "Read input registers");
        Ok(values)
    }

    /// 读取线圈
    pub async fn read_coils(&mut self, addr: u16, count: u16) -> Result<Vec<bool>> {
        let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;

        let values = ctx
            .read_coils(addr, count)
            .await
            .map_err(|e| ModbusError::Protocol(format!("Modbus IO error: {e:?}")))?
            .map_err(|e| ModbusError::Protocol(format!("Modbus exception: {e:?}")))?;

        debug!(addr = %addr, count = %count, "Read coils");
        Ok(values)
    }

    /// 读取离散输入
    pub async fn read_discrete_inputs(&mut self, addr: u16, count: u16) -> Result<Vec<bool>> {
        let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;

        let values = ctx
            .read_discrete_inputs(addr, count)
            .await
            .map_err(|e| ModbusError::Protocol(format!("Modbus IO error: {e:?}")))?
            .map_err(|e| ModbusError::Protocol(format!("Modbus exception: {e:?}")))?;

        debug!(addr = %addr, count = %count, "Read discrete inputs");
        Ok(values)
    }

    /// 写入单个保持寄存器
    pub async fn write_register(&mut self, addr: u16, value: u16) -> Result<()> {
        let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;

        ctx.write_single_register(addr, value)
            .await
            .map_err(|e| ModbusError::Protocol(format!("Modbus IO error: {e:?}")))?
            .map_err(|e| ModbusError::Protocol(format!("Modbus exception: {e:?}")))?;

        info!(addr = %addr, value = %value, "Wrote holding register");
        Ok(())
    }

    /// 写入多个保持寄存器
    pub async fn write_registers(&mut self, addr: u16, values: &[u16]) -> Result<()> {
        let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;

        ctx.write_multiple_registers(addr, values)
            .await
            .map_err(|e| ModbusError::Protocol(format!("Modbus IO error: {e:?}")))?
            .map_err(|e| ModbusError::Protocol(format!("Modbus exception: {e:?}")))?;

        info!(addr = %addr, count = %values.len(), "Wrote multiple holding registers");
        Ok(())
    }
}

impl Default for ModbusSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_disconnected() {
        let session = ModbusSession::new();
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_read_without_connection() {
        let mut session = ModbusSession::new();

        let result = session.read_holding_registers(0, 1).await;
        assert!(matches!(result, Err(ModbusError::NotConnected)));

        let result = session.read_coils(0, 1).await;
        assert!(matches!(result, Err(ModbusError::NotConnected)));

        let result = session.write_register(0, 1).await;
        assert!(matches!(result, Err(ModbusError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_invalid_address() {
        let mut session = ModbusSession::with_timeout(Duration::from_millis(100));
        let device = Device {
            id: "dev-1".to_string(),
            name: "broken".to_string(),
            ip: "not-an-ip".to_string(),
            port: 502,
            unit_id: 1,
            enabled: true,
            registers: Vec::new(),
        };

        let result = session.connect(&device).await;
        assert!(matches!(result, Err(ModbusError::Connect(_))));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut session = ModbusSession::new();
        session.disconnect().await;
        session.disconnect().await;
        assert!(!session.is_connected());
    }
}
