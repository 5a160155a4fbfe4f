use crate::{error::ApiError, error::Result, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use ethermon_device::DeviceSnapshot;
use std::collections::HashMap;
use tracing::debug;

/// 获取所有设备的当前数据
pub async fn get_all_data(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, DeviceSnapshot>>> {
    debug!("Getting all device data");
    Ok(Json(state.store.all_data().await))
}

/// 获取单个设备的当前数据
pub async fn get_device_data(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceSnapshot>> {
    debug!(device_id = %device_id, "Getting device data");

    let data = state
        .store
        .device_data(&device_id)
        .await
        .filter(|snapshot| !snapshot.is_empty())
        .ok_or(ApiError::DataNotFound(device_id))?;

    Ok(Json(data))
}
