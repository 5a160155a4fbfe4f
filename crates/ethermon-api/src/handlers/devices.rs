use crate::{error::Result, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use ethermon_device::Device;
use tracing::debug;

/// 获取设备列表
pub async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<Device>>> {
    debug!("Listing devices");
    Ok(Json(state.registry.load(false).await))
}

/// 按 ID 获取设备
pub async fn get_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<Device>> {
    debug!(device_id = %device_id, "Getting device");

    let device = state
        .registry
        .find(&device_id)
        .await
        .ok_or(crate::error::ApiError::DeviceNotFound(device_id))?;

    Ok(Json(device))
}
