use crate::{auth, handlers, models::HealthResponse, state::AppState};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// 创建 API 路由
///
/// 除 `/api/health` 外全部路由都在 JWT 认证之后。
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        // 设备
        .route("/api/modbus/devices", get(handlers::list_devices))
        .route("/api/modbus/devices/:id", get(handlers::get_device))
        // 当前数据
        .route("/api/modbus/data", get(handlers::get_all_data))
        .route("/api/modbus/data/:id", get(handlers::get_device_data))
        // 连接与即席读写
        .route("/api/modbus/connect", post(handlers::connect))
        .route("/api/modbus/disconnect", post(handlers::disconnect))
        .route("/api/modbus/read", post(handlers::read))
        .route("/api/modbus/write", post(handlers::write))
        // 轮询控制
        .route("/api/modbus/polling/start", post(handlers::start_polling))
        .route("/api/modbus/polling/stop", post(handlers::stop_polling))
        // 统计
        .route("/api/modbus/stats", get(handlers::get_stats))
        .route("/api/modbus/stats/hourly", get(handlers::get_hourly_stats))
        .route(
            "/api/modbus/stats/device/:id",
            get(handlers::get_device_stats),
        )
        .route("/api/modbus/stats/reset", post(handlers::reset_stats))
        // 归档
        .route("/api/archives", get(handlers::list_archives))
        .route("/api/archives/:date", get(handlers::get_archive))
        .route("/api/archives/zip/:month", get(handlers::download_zip))
        .route(
            "/api/archives/create-zip/:month",
            post(handlers::create_zip),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 健康检查（无需认证）
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
