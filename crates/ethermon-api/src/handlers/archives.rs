use crate::{
    auth::{Claims, ROLE_ADMIN, ROLE_OPERATOR},
    error::{ApiError, Result},
    models::{ArchivesResponse, ZipResponse},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use ethermon_archive::DayArchive;
use tracing::info;

/// 获取归档列表
pub async fn list_archives(State(state): State<AppState>) -> Result<Json<ArchivesResponse>> {
    let archives = state.archive.list().await?;
    Ok(Json(ArchivesResponse { archives }))
}

/// 获取某一天的归档
pub async fn get_archive(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DayArchive>> {
    Ok(Json(state.archive.read_day(&date).await?))
}

/// 下载月度 ZIP
pub async fn download_zip(
    State(state): State<AppState>,
    Path(month): Path<String>,
) -> Result<impl IntoResponse> {
    // 只接受 YYYYMM，同时挡住路径穿越
    if month.len() != 6 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::BadRequest(format!(
            "Invalid month format, expected YYYYMM: {month}"
        )));
    }

    let path = state.archive.paths().monthly_zip_file(&month);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::ArchiveNotFound(format!("{month}.zip")))?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{month}.zip\""),
        ),
    ];
    Ok((headers, bytes))
}

/// 创建月度 ZIP（管理员或操作员）
pub async fn create_zip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(month): Path<String>,
) -> Result<Json<ZipResponse>> {
    if !claims.has_role(ROLE_ADMIN) && !claims.has_role(ROLE_OPERATOR) {
        return Err(ApiError::Forbidden(
            "No permission to create archives".to_string(),
        ));
    }

    // 显式接口允许覆盖已有文件
    let zip = state.zipper.create(&month, true).await?;

    info!(user = %claims.sub, month = %month, "Monthly zip created via API");
    Ok(Json(ZipResponse {
        success: true,
        message: format!("Monthly zip for {month} created"),
        file: zip.file,
        size: zip.size,
    }))
}
