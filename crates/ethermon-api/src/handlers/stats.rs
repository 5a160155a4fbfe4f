use crate::{
    auth::{Claims, ROLE_ADMIN},
    error::{ApiError, Result},
    models::{MessageResponse, StatsResponse},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use ethermon_stats::{DeviceStat, HourlyEntry};
use tracing::info;

/// 获取累计统计
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    Ok(Json(StatsResponse {
        stats: state.stats.stats().await,
        timestamp: Utc::now(),
    }))
}

/// 获取每小时统计
pub async fn get_hourly_stats(State(state): State<AppState>) -> Result<Json<Vec<HourlyEntry>>> {
    Ok(Json(state.stats.hourly().await))
}

/// 获取单设备统计
pub async fn get_device_stats(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceStat>> {
    Ok(Json(state.stats.device_stats(&device_id).await))
}

/// 重置统计（仅管理员）
pub async fn reset_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>> {
    if !claims.has_role(ROLE_ADMIN) {
        return Err(ApiError::Forbidden(
            "Only administrators can reset statistics".to_string(),
        ));
    }

    state.stats.reset().await;
    info!(user = %claims.sub, "Statistics reset via API");

    Ok(Json(MessageResponse::ok("Statistics reset successfully")))
}
