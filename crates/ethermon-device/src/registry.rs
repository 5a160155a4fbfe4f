use crate::model::Device;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 设备注册表
///
/// 从 `configs/devices.json` 懒加载设备定义并缓存，支持强制重载。
/// 配置缺失或损坏时降级为空列表并告警，绝不让轮询器启动失败。
pub struct DeviceRegistry {
    /// 设备配置文件路径
    config_path: PathBuf,

    /// 内存缓存
    cache: Arc<RwLock<Vec<Device>>>,
}

impl DeviceRegistry {
    /// 创建设备注册表
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            cache: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// 加载设备列表
    ///
    /// 缓存非空且未要求强制重载时直接返回缓存。
    pub async fn load(&self, force_reload: bool) -> Vec<Device> {
        {
            let cache = self.cache.read().await;
            if !cache.is_empty() && !force_reload {
                return cache.clone();
            }
        }

        let devices = self.read_config().await;

        let mut cache = self.cache.write().await;
        *cache = devices.clone();
        devices
    }

    /// 强制重载设备列表
    pub async fn reload(&self) -> Vec<Device> {
        self.load(true).await
    }

    /// 按 ID 查找设备
    ///
    /// 线性扫描即可，设备数量是几十的量级。
    pub async fn find(&self, device_id: &str) -> Option<Device> {
        self.load(false)
            .await
            .into_iter()
            .find(|d| d.id == device_id)
    }

    async fn read_config(&self) -> Vec<Device> {
        let contents = match tokio::fs::read_to_string(&self.config_path).await {
            Ok(contents) => contents,
            Err(_) => {
                warn!(
                    path = %self.config_path.display(),
                    "Device config file not found"
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Device>>(&contents) {
            Ok(devices) => {
                info!(count = devices.len(), "Device config loaded");
                devices
            }
            Err(e) => {
                warn!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to parse device config"
                );
                Vec::new()
            }
        }
    }

    /// 清空缓存
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        debug!("Device cache cleared");
    }
}
