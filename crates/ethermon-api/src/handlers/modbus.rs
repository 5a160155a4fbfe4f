use crate::{
    error::{ApiError, Result},
    models::*,
    state::AppState,
};
use axum::{extract::State, Json};
use ethermon_device::Device;
use tracing::info;

async fn find_device(state: &AppState, device_id: &str) -> Result<Device> {
    state
        .registry
        .find(device_id)
        .await
        .ok_or_else(|| ApiError::DeviceNotFound(device_id.to_string()))
}

/// 连接到设备
pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<DeviceIdRequest>,
) -> Result<Json<MessageResponse>> {
    let device = find_device(&state, &req.device_id).await?;

    state.poller.connect_device(&device).await?;

    Ok(Json(MessageResponse::ok(format!(
        "Connected to device {}",
        device.name
    ))))
}

/// 断开当前连接
pub async fn disconnect(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    state.poller.disconnect().await;
    Ok(Json(MessageResponse::ok("Disconnected from device")))
}

/// 即席读取寄存器
pub async fn read(
    State(state): State<AppState>,
    Json(req): Json<ReadRequest>,
) -> Result<Json<ReadResponse>> {
    let device = find_device(&state, &req.device_id).await?;
    let length = req.length.unwrap_or(1);

    let data = state
        .poller
        .read_raw(&device, &req.register_type, req.address, length)
        .await?;

    Ok(Json(ReadResponse {
        success: true,
        data,
        device: device.name,
        register_type: req.register_type,
        address: req.address,
        length,
    }))
}

/// 即席写入寄存器
pub async fn write(
    State(state): State<AppState>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<MessageResponse>> {
    let device = find_device(&state, &req.device_id).await?;

    let ok = match (&req.value, &req.values) {
        (_, Some(values)) => {
            state
                .poller
                .write_raw_multiple(&device, req.address, values)
                .await
        }
        (Some(value), None) => state.poller.write_raw(&device, req.address, *value).await,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either value or values is required".to_string(),
            ))
        }
    };

    if !ok {
        return Err(ApiError::InternalError(
            "Failed to write to device".to_string(),
        ));
    }

    info!(device = %device.name, address = %req.address, "Registers written via API");
    Ok(Json(MessageResponse::ok("Data written successfully")))
}

/// 启动设备轮询
pub async fn start_polling(
    State(state): State<AppState>,
    Json(req): Json<StartPollingRequest>,
) -> Result<Json<StartPollingResponse>> {
    let device = find_device(&state, &req.device_id).await?;

    let interval = state
        .poller
        .start_polling(&req.device_id, req.interval)
        .await?;

    Ok(Json(StartPollingResponse {
        success: true,
        message: format!("Polling started for device {}", device.name),
        interval,
    }))
}

/// 停止设备轮询
pub async fn stop_polling(
    State(state): State<AppState>,
    Json(req): Json<DeviceIdRequest>,
) -> Result<Json<MessageResponse>> {
    let device = find_device(&state, &req.device_id).await?;

    state.poller.stop_polling(&req.device_id).await;

    Ok(Json(MessageResponse::ok(format!(
        "Polling stopped for device {}",
        device.name
    ))))
}
