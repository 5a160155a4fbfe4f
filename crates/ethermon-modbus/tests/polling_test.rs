//! 轮询器集成测试
//!
//! 在进程内起一个 ModBus/TCP 服务端模拟设备，然后用真实的
//! 轮询管理器对它跑完整的 连接-读取-断开-归档 周期。

use std::collections::HashMap;
use std::future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::net::TcpListener;
use tokio_modbus::prelude::*;
use tokio_modbus::server::tcp::{accept_tcp_connection, Server};

use ethermon_archive::ArchiveStore;
use ethermon_config::StoragePaths;
use ethermon_device::{DataStore, DeviceRegistry, RegisterValue};
use ethermon_modbus::PollingManager;
use ethermon_stats::StatsCollector;

/// 模拟设备：寄存器表里没有的地址返回 IllegalDataAddress
#[derive(Clone)]
struct FixtureDevice {
    holding: Arc<Mutex<HashMap<u16, u16>>>,
    input: Arc<Mutex<HashMap<u16, u16>>>,
    coils: Arc<Mutex<HashMap<u16, bool>>>,
    discrete: Arc<Mutex<HashMap<u16, bool>>>,
}

impl FixtureDevice {
    fn new() -> Self {
        let mut holding = HashMap::new();
        holding.insert(0, 10);
        holding.insert(1, 20);
        holding.insert(7, 0);

        let mut input = HashMap::new();
        input.insert(5, 77);

        let mut coils = HashMap::new();
        coils.insert(0, true);

        let mut discrete = HashMap::new();
        discrete.insert(0, false);

        Self {
            holding: Arc::new(Mutex::new(holding)),
            input: Arc::new(Mutex::new(input)),
            coils: Arc::new(Mutex::new(coils)),
            discrete: Arc::new(Mutex::new(discrete)),
        }
    }
}

fn word_read(
    registers: &HashMap<u16, u16>,
    addr: u16,
    cnt: u16,
) -> Result<Vec<u16>, ExceptionCode> {
    let mut values = vec![0; cnt.into()];
    for i in 0..cnt {
        match registers.get(&(addr + i)) {
            Some(value) => values[i as usize] = *value,
            None => return Err(ExceptionCode::IllegalDataAddress),
        }
    }
    Ok(values)
}

fn bit_read(bits: &HashMap<u16, bool>, addr: u16, cnt: u16) -> Result<Vec<bool>, ExceptionCode> {
    let mut values = vec![false; cnt.into()];
    for i in 0..cnt {
        match bits.get(&(addr + i)) {
            Some(value) => values[i as usize] = *value,
            None => return Err(ExceptionCode::IllegalDataAddress),
        }
    }
    Ok(values)
}

impl tokio_modbus::server::Service for FixtureDevice {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        let res = match req {
            Request::ReadHoldingRegisters(addr, cnt) => {
                word_read(&self.holding.lock().unwrap(), addr, cnt)
                    .map(Response::ReadHoldingRegisters)
            }
            Request::ReadInputRegisters(addr, cnt) => {
                word_read(&self.input.lock().unwrap(), addr, cnt).map(Response::ReadInputRegisters)
            }
            Request::ReadCoils(addr, cnt) => {
                bit_read(&self.coils.lock().unwrap(), addr, cnt).map(Response::ReadCoils)
            }
            Request::ReadDiscreteInputs(addr, cnt) => {
                bit_read(&self.discrete.lock().unwrap(), addr, cnt)
                    .map(Response::ReadDiscreteInputs)
            }
            Request::WriteSingleRegister(addr, value) => {
                self.holding.lock().unwrap().insert(addr, value);
                Ok(Response::WriteSingleRegister(addr, value))
            }
            Request::WriteMultipleRegisters(addr, values) => {
                let mut holding = self.holding.lock().unwrap();
                for (i, value) in values.iter().enumerate() {
                    holding.insert(addr + i as u16, *value);
                }
                Ok(Response::WriteMultipleRegisters(addr, values.len() as u16))
            }
            _ => Err(ExceptionCode::IllegalFunction),
        };
        future::ready(res)
    }
}

/// 启动模拟设备服务端，返回监听地址；connections 统计接入次数
async fn start_device_server(device: FixtureDevice, connections: Arc<AtomicUsize>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(listener);

    tokio::spawn(async move {
        let new_service = move |_socket_addr| {
            connections.fetch_add(1, Ordering::SeqCst);
            Ok(Some(device.clone()))
        };
        let on_connected = move |stream, socket_addr| {
            let new_service = new_service.clone();
            async move { accept_tcp_connection(stream, socket_addr, new_service) }
        };
        let on_process_error = |err| {
            eprintln!("fixture server error: {err}");
        };
        if let Err(e) = server.serve(&on_connected, on_process_error).await {
            eprintln!("fixture server error: {e}");
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

fn devices_json(port: u16, enabled: bool) -> String {
    format!(
        r#"[
            {{
                "id": "dev-1",
                "name": "Test meter",
                "ip": "127.0.0.1",
                "port": {port},
                "unitId": 1,
                "enabled": {enabled},
                "registers": [
                    {{ "name": "temp1", "address": 0, "type": "holding", "length": 2 }},
                    {{ "name": "temp2", "address": 5, "type": "input" }},
                    {{ "name": "pump", "address": 0, "type": "coil" }},
                    {{ "name": "door", "address": 0, "type": "discrete" }},
                    {{ "name": "ghost", "address": 900, "type": "holding" }},
                    {{ "name": "legacy", "address": 0, "type": "ascii" }},
                    {{ "name": "spare", "address": 1, "type": "holding", "enabled": false }}
                ]
            }}
        ]"#
    )
}

struct Fixture {
    _dir: tempfile::TempDir,
    paths: StoragePaths,
    manager: PollingManager,
    store: DataStore,
    stats: Arc<StatsCollector>,
    registry: Arc<DeviceRegistry>,
}

async fn fixture(port: u16, enabled: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let paths = StoragePaths::new(dir.path());

    let config_path = dir.path().join("devices.json");
    tokio::fs::write(&config_path, devices_json(port, enabled))
        .await
        .unwrap();

    let registry = Arc::new(DeviceRegistry::new(config_path));
    let store = DataStore::new();
    let stats = Arc::new(StatsCollector::new(paths.clone()));
    let archive = Arc::new(ArchiveStore::new(paths.clone()));
    let manager = PollingManager::new(registry.clone(), store.clone(), stats.clone(), archive);

    Fixture {
        _dir: dir,
        paths,
        manager,
        store,
        stats,
        registry,
    }
}

#[tokio::test]
async fn test_poll_cycle_reads_all_register_kinds() {
    let connections = Arc::new(AtomicUsize::new(0));
    let addr = start_device_server(FixtureDevice::new(), connections.clone()).await;
    let fx = fixture(addr.port(), true).await;

    fx.manager.start_polling("dev-1", Some(200)).await.unwrap();

    // 等第一个周期完成
    let mut snapshot = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Some(data) = fx.store.device_data("dev-1").await {
            if data.len() >= 4 {
                snapshot = Some(data);
                break;
            }
        }
    }
    let snapshot = snapshot.expect("poll cycle did not produce data in time");

    assert_eq!(snapshot["temp1"].value, RegisterValue::Words(vec![10, 20]));
    assert_eq!(snapshot["temp2"].value, RegisterValue::Words(vec![77]));
    assert_eq!(snapshot["pump"].value, RegisterValue::Bits(vec![true]));
    assert_eq!(snapshot["door"].value, RegisterValue::Bits(vec![false]));

    // 失败的 ghost 与未知类型的 legacy、禁用的 spare 都不产生数据
    assert!(!snapshot.contains_key("ghost"));
    assert!(!snapshot.contains_key("legacy"));
    assert!(!snapshot.contains_key("spare"));

    fx.manager.stop_polling("dev-1").await;
    // 进行中的周期允许跑完，等它结束再看统计
    tokio::time::sleep(Duration::from_millis(300)).await;

    // 每个周期 4 次成功、恰好 1 次错误
    let device_stats = fx.stats.device_stats("dev-1").await;
    assert!(device_stats.errors >= 1);
    assert_eq!(device_stats.polls, device_stats.errors * 4);

    let stats = fx.stats.stats().await;
    assert_eq!(stats.total_polls, device_stats.polls);
    assert!(stats.last_poll.is_some());

    assert!(connections.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_poll_cycle_writes_archive() {
    let connections = Arc::new(AtomicUsize::new(0));
    let addr = start_device_server(FixtureDevice::new(), connections).await;
    let fx = fixture(addr.port(), true).await;

    fx.manager.start_polling("dev-1", Some(200)).await.unwrap();

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let archive_path = fx.paths.daily_archive_file(&today);

    let mut archived = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if archive_path.exists() {
            archived = true;
            break;
        }
    }
    fx.manager.stop_polling("dev-1").await;
    assert!(archived, "archive file was not written");

    let contents = tokio::fs::read_to_string(&archive_path).await.unwrap();
    let day: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert!(day["dev-1"]["temp1"]["value"].is_array());
    assert!(day["dev-1"]["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_reading_timestamps_increase_across_cycles() {
    let connections = Arc::new(AtomicUsize::new(0));
    let addr = start_device_server(FixtureDevice::new(), connections).await;
    let fx = fixture(addr.port(), true).await;

    fx.manager.start_polling("dev-1", Some(150)).await.unwrap();

    let mut first = None;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Some(data) = fx.store.device_data("dev-1").await {
            if let Some(reading) = data.get("temp1") {
                first = Some(reading.timestamp);
                break;
            }
        }
    }
    let first = first.expect("no reading from first cycle");

    // 后续周期用新的时间戳整体覆盖
    let mut increased = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Some(data) = fx.store.device_data("dev-1").await {
            if data["temp1"].timestamp > first {
                increased = true;
                break;
            }
        }
    }
    fx.manager.stop_polling("dev-1").await;
    assert!(increased, "timestamp did not increase across cycles");
}

#[tokio::test]
async fn test_disabled_device_produces_no_wire_traffic() {
    let connections = Arc::new(AtomicUsize::new(0));
    let addr = start_device_server(FixtureDevice::new(), connections.clone()).await;
    let fx = fixture(addr.port(), false).await;

    fx.manager.start_polling("dev-1", Some(100)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    fx.manager.stop_polling("dev-1").await;

    assert_eq!(connections.load(Ordering::SeqCst), 0);
    assert!(fx.store.device_data("dev-1").await.is_none());
    assert_eq!(fx.stats.stats().await.total_polls, 0);
}

#[tokio::test]
async fn test_raw_read_and_write() {
    let connections = Arc::new(AtomicUsize::new(0));
    let addr = start_device_server(FixtureDevice::new(), connections).await;
    let fx = fixture(addr.port(), true).await;
    let device = fx.registry.find("dev-1").await.unwrap();

    let value = fx
        .manager
        .read_raw(&device, "holding", 0, 2)
        .await
        .unwrap();
    assert_eq!(value, RegisterValue::Words(vec![10, 20]));

    assert!(fx.manager.write_raw(&device, 7, 1234).await);
    let value = fx.manager.read_raw(&device, "holding", 7, 1).await.unwrap();
    assert_eq!(value, RegisterValue::Words(vec![1234]));

    assert!(fx.manager.write_raw_multiple(&device, 0, &[5, 6]).await);
    let value = fx.manager.read_raw(&device, "holding", 0, 2).await.unwrap();
    assert_eq!(value, RegisterValue::Words(vec![5, 6]));

    // 未知寄存器类型
    assert!(fx.manager.read_raw(&device, "bogus", 0, 1).await.is_err());
}

#[tokio::test]
async fn test_write_to_unreachable_device_returns_false() {
    let fx = fixture(1, true).await;
    let mut device = fx.registry.find("dev-1").await.unwrap();
    device.port = 1;

    // 连不上的设备：什么都没写成，返回 false 而不是崩溃
    assert!(!fx.manager.write_raw(&device, 0, 42).await);
}
