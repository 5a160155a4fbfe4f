use clap::Parser;
use ethermon_api::{AppState, JwtAuth};
use ethermon_archive::{ArchiveScheduler, ArchiveStore, ZipArchiver};
use ethermon_config::{ConfigLoader, StoragePaths};
use ethermon_device::{DataStore, DeviceRegistry};
use ethermon_modbus::PollingManager;
use ethermon_stats::StatsCollector;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 数据根目录（configs/ 与 archives/ 的父目录）
    #[arg(short, long, default_value = ".")]
    data_dir: String,

    /// HTTP 监听地址
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// JWT 签名密钥
    #[arg(long, env = "ETHERMON_JWT_SECRET", default_value = "change-me-in-production")]
    jwt_secret: String,

    /// JWT 有效期（小时）
    #[arg(long, default_value_t = 24)]
    jwt_expiration_hours: i64,

    /// 关闭统计收集（空实现）
    #[arg(long)]
    disable_stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(data_dir = %args.data_dir, "Starting ethermon server");

    let paths = StoragePaths::new(&args.data_dir);
    let schedule = ConfigLoader::new(paths.clone()).load_schedule().await;

    // 核心组件显式构造、显式注入
    let registry = Arc::new(DeviceRegistry::new(paths.devices_file()));
    let device_count = registry.load(false).await.len();
    tracing::info!(count = device_count, "Devices configured");

    let store = DataStore::new();

    let stats = Arc::new(if args.disable_stats {
        tracing::warn!("Stats collection disabled, using no-op collector");
        StatsCollector::disabled()
    } else {
        StatsCollector::new(paths.clone())
    });
    stats.load().await;
    stats.start().await;

    let archive = Arc::new(ArchiveStore::new(paths.clone()));
    let zipper = Arc::new(ZipArchiver::new(paths.clone()));
    let poller = Arc::new(PollingManager::new(
        registry.clone(),
        store.clone(),
        stats.clone(),
        archive.clone(),
    ));

    let mut scheduler = ArchiveScheduler::new(paths.clone(), schedule).await?;
    scheduler.start().await?;

    let auth = Arc::new(JwtAuth::new(args.jwt_secret, args.jwt_expiration_hours));

    let state = AppState {
        registry,
        store,
        stats: stats.clone(),
        archive,
        zipper,
        poller: poller.clone(),
        auth,
    };
    let app = ethermon_api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    tracing::info!(listen = %args.listen, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    poller.stop_all().await;
    stats.stop().await;
    scheduler.shutdown().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
