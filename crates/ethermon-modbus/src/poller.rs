use crate::error::{ModbusError, Result};
use crate::session::ModbusSession;
use chrono::Utc;
use ethermon_archive::ArchiveStore;
use ethermon_device::{
    DataStore, Device, DeviceError, DeviceRegistry, Reading, RegisterKind, RegisterValue,
};
use ethermon_stats::StatsCollector;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 默认轮询间隔（毫秒）
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

/// 单设备轮询任务句柄
struct PollTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// 轮询管理器
///
/// 持有设备注册表、内存数据存储、统计收集器、归档存储以及唯一的
/// 共享 ModBus 会话。每个设备一个独立的定时任务；所有任务在各自
/// 周期内独占会话，周期结束才释放，因此线上的读写永远不会交叠。
///
/// 停止轮询只取消尚未开始的下一个周期，进行中的周期允许跑完。
pub struct PollingManager {
    registry: Arc<DeviceRegistry>,
    store: DataStore,
    stats: Arc<StatsCollector>,
    archive: Arc<ArchiveStore>,
    session: Arc<Mutex<ModbusSession>>,
    tasks: Arc<RwLock<HashMap<String, PollTask>>>,
}

impl PollingManager {
    /// 创建轮询管理器
    pub fn new(
        registry: Arc<DeviceRegistry>,
        store: DataStore,
        stats: Arc<StatsCollector>,
        archive: Arc<ArchiveStore>,
    ) -> Self {
        info!("Polling manager created");
        Self {
            registry,
            store,
            stats,
            archive,
            session: Arc::new(Mutex::new(ModbusSession::new())),
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 启动某设备的周期轮询
    ///
    /// 设备必须存在于配置中。已有轮询任务时先停掉旧任务再启动，
    /// 同一设备绝不会有两个并行的轮询循环。
    pub async fn start_polling(
        &self,
        device_id: &str,
        interval_ms: Option<u64>,
    ) -> std::result::Result<u64, DeviceError> {
        let device = self
            .registry
            .find(device_id)
            .await
            .ok_or_else(|| DeviceError::NotFound(device_id.to_string()))?;

        // tokio::time::interval 不接受零周期
        let interval_ms = interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS).max(1);

        self.stop_polling(device_id).await;

        let (stop_tx, mut stop_rx) = watch::channel(false);

        let id = device.id.clone();
        let registry = self.registry.clone();
        let session = self.session.clone();
        let store = self.store.clone();
        let stats = self.stats.clone();
        let archive = self.archive.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        Self::poll_cycle(&id, &registry, &session, &store, &stats, &archive).await;
                    }
                }
            }
            debug!(device_id = %id, "Polling loop exited");
        });

        let mut tasks = self.tasks.write().await;
        tasks.insert(device_id.to_string(), PollTask { stop: stop_tx, handle });

        info!(
            device = %device.name,
            device_id = %device_id,
            interval_ms = %interval_ms,
            "Polling started"
        );
        Ok(interval_ms)
    }

    /// 停止某设备的轮询
    ///
    /// 未知设备或没有活动任务时是空操作。
    pub async fn stop_polling(&self, device_id: &str) {
        let task = {
            let mut tasks = self.tasks.write().await;
            tasks.remove(device_id)
        };

        if let Some(task) = task {
            let _ = task.stop.send(true);
            info!(device_id = %device_id, "Polling stopped");
        }
    }

    /// 停止所有轮询任务
    pub async fn stop_all(&self) {
        let tasks: Vec<(String, PollTask)> = {
            let mut map = self.tasks.write().await;
            map.drain().collect()
        };

        for (device_id, task) in tasks {
            let _ = task.stop.send(true);
            debug!(device_id = %device_id, "Polling stopped");
        }
    }

    /// 某设备是否有活动的轮询任务
    pub async fn is_polling(&self, device_id: &str) -> bool {
        self.tasks
            .read()
            .await
            .get(device_id)
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }

    /// 一个完整的轮询周期：连接、按序读取所有启用的寄存器、断开、归档
    async fn poll_cycle(
        device_id: &str,
        registry: &Arc<DeviceRegistry>,
        session: &Arc<Mutex<ModbusSession>>,
        store: &DataStore,
        stats: &Arc<StatsCollector>,
        archive: &Arc<ArchiveStore>,
    ) {
        // 周期开始时重新读取设备定义，外部修改下个周期即生效
        let Some(device) = registry.find(device_id).await else {
            warn!(device_id = %device_id, "Device no longer in config, skipping cycle");
            return;
        };
        if !device.enabled {
            debug!(device_id = %device_id, "Device disabled, skipping cycle");
            return;
        }

        {
            let mut session = session.lock().await;

            // 连接失败只中止本周期，不中止定时任务
            if session.connect(&device).await.is_err() {
                return;
            }

            for register in &device.registers {
                if !register.enabled {
                    continue;
                }

                let Some(kind) = register.kind() else {
                    warn!(
                        register = %register.name,
                        register_type = %register.register_type,
                        "Unknown register type, skipping"
                    );
                    continue;
                };

                match Self::read_register(&mut session, kind, register.address, register.length)
                    .await
                {
                    Ok(value) => {
                        let reading = Reading {
                            value,
                            timestamp: Utc::now(),
                            address: register.address,
                            kind,
                        };
                        store.record(&device.id, &register.name, reading).await;
                        stats.register_poll(&device.id).await;
                        debug!(
                            device_id = %device.id,
                            register = %register.name,
                            "Register read"
                        );
                    }
                    Err(e) => {
                        // 单个寄存器失败不影响其余寄存器
                        stats.register_error(&device.id).await;
                        warn!(
                            device_id = %device.id,
                            register = %register.name,
                            error = %e,
                            "Register read failed"
                        );
                    }
                }
            }

            session.disconnect().await;
        }

        // 会话锁释放后再做归档写入
        if let Some(snapshot) = store.device_data(&device.id).await {
            if let Err(e) = archive.save_device(&device.id, &snapshot).await {
                warn!(device_id = %device.id, error = %e, "Failed to write archive");
            }
        }
    }

    /// 按寄存器类型分发到对应的读操作
    async fn read_register(
        session: &mut ModbusSession,
        kind: RegisterKind,
        address: u16,
        length: u16,
    ) -> Result<RegisterValue> {
        let value = match kind {
            RegisterKind::Holding => {
                RegisterValue::Words(session.read_holding_registers(address, length).await?)
            }
            RegisterKind::Input => {
                RegisterValue::Words(session.read_input_registers(address, length).await?)
            }
            RegisterKind::Coil => {
                RegisterValue::Bits(session.read_coils(address, length).await?)
            }
            RegisterKind::Discrete => {
                RegisterValue::Bits(session.read_discrete_inputs(address, length).await?)
            }
        };
        Ok(value)
    }

    // ========== 即席读写接口（API 层使用） ==========

    /// 连接到设备（显式连接接口）
    pub async fn connect_device(&self, device: &Device) -> Result<()> {
        let mut session = self.session.lock().await;
        session.connect(device).await
    }

    /// 断开当前连接
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        session.disconnect().await;
    }

    /// 即席读取：连接、按类型读取、断开
    pub async fn read_raw(
        &self,
        device: &Device,
        register_type: &str,
        address: u16,
        length: u16,
    ) -> Result<RegisterValue> {
        let kind = RegisterKind::from_str(register_type)
            .ok_or_else(|| ModbusError::UnsupportedRegister(register_type.to_string()))?;

        let mut session = self.session.lock().await;
        session.connect(device).await?;
        let result = Self::read_register(&mut session, kind, address, length).await;
        session.disconnect().await;
        result
    }

    /// 即席写入单个寄存器，尽力而为
    ///
    /// 返回 false 表示什么都没写成功；失败在本地记日志，不向上抛。
    pub async fn write_raw(&self, device: &Device, address: u16, value: u16) -> bool {
        let mut session = self.session.lock().await;
        if session.connect(device).await.is_err() {
            return false;
        }

        let ok = match session.write_register(address, value).await {
            Ok(()) => true,
            Err(e) => {
                warn!(device = %device.name, address = %address, error = %e, "Register write failed");
                false
            }
        };
        session.disconnect().await;
        ok
    }

    /// 即席写入多个寄存器，尽力而为
    pub async fn write_raw_multiple(&self, device: &Device, address: u16, values: &[u16]) -> bool {
        let mut session = self.session.lock().await;
        if session.connect(device).await.is_err() {
            return false;
        }

        let ok = match session.write_registers(address, values).await {
            Ok(()) => true,
            Err(e) => {
                warn!(device = %device.name, address = %address, error = %e, "Registers write failed");
                false
            }
        };
        session.disconnect().await;
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethermon_config::StoragePaths;

    const DEVICES_JSON: &str = r#"[
        {
            "id": "dev-1",
            "name": "Pump station",
            "ip": "127.0.0.1",
            "port": 50200,
            "enabled": true,
            "registers": []
        }
    ]"#;

    async fn manager_in(dir: &tempfile::TempDir) -> PollingManager {
        let config_path = dir.path().join("devices.json");
        tokio::fs::write(&config_path, DEVICES_JSON).await.unwrap();

        let registry = Arc::new(DeviceRegistry::new(config_path));
        let store = DataStore::new();
        let stats = Arc::new(StatsCollector::disabled());
        let archive = Arc::new(ArchiveStore::new(StoragePaths::new(dir.path())));

        PollingManager::new(registry, store, stats, archive)
    }

    #[tokio::test]
    async fn test_start_polling_unknown_device() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir).await;

        let result = manager.start_polling("ghost", None).await;
        assert!(matches!(result, Err(DeviceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stop_polling_is_noop_for_idle_device() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir).await;

        // 没有活动任务时停止是空操作
        manager.stop_polling("dev-1").await;
        manager.stop_polling("ghost").await;
        assert!(!manager.is_polling("dev-1").await);
    }

    #[tokio::test]
    async fn test_restart_replaces_task() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir).await;

        manager.start_polling("dev-1", Some(60_000)).await.unwrap();
        manager.start_polling("dev-1", Some(60_000)).await.unwrap();

        let tasks = manager.tasks.read().await;
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_default_interval() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir).await;

        let interval = manager.start_polling("dev-1", None).await.unwrap();
        assert_eq!(interval, DEFAULT_POLL_INTERVAL_MS);
        manager.stop_all().await;
    }
}
