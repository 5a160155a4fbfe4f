use crate::model::{DeviceSnapshot, Reading};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 内存数据存储
///
/// 设备 ID -> 数据快照。每个快照只由该设备自己的轮询周期写入，
/// 按寄存器后值覆盖前值；API 与报表层只读。
#[derive(Clone, Default)]
pub struct DataStore {
    inner: Arc<RwLock<HashMap<String, DeviceSnapshot>>>,
}

impl DataStore {
    /// 创建空的数据存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条读数
    pub async fn record(&self, device_id: &str, register_name: &str, reading: Reading) {
        let mut inner = self.inner.write().await;
        inner
            .entry(device_id.to_string())
            .or_default()
            .insert(register_name.to_string(), reading);
    }

    /// 获取某设备的数据快照
    pub async fn device_data(&self, device_id: &str) -> Option<DeviceSnapshot> {
        let inner = self.inner.read().await;
        inner.get(device_id).cloned()
    }

    /// 获取所有设备的数据
    pub async fn all_data(&self) -> HashMap<String, DeviceSnapshot> {
        let inner = self.inner.read().await;
        inner.clone()
    }
}
