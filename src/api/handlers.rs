use crate::error::{ApiError, ApiResult};
use crate::models::ScanResponse;
use crate::service::ScanService;
use axum::{
    extract::{Json, Multipart, State},
    extract::multipart::MultipartError,
    http::StatusCode,
};
use std::sync::Arc;

/// 上传文件所在的 multipart 字段名
const FILE_FIELD: &str = "file";

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

fn multipart_error(context: &str, e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!("{}: {}", context, e.body_text()))
    } else {
        ApiError::BadRequest(format!("{}: {}", context, e.body_text()))
    }
}

/// 价签扫描接口: multipart 上传一张图片
pub async fn scan(
    State(service): State<Arc<ScanService>>,
    mut multipart: Multipart,
) -> ApiResult<Json<ScanResponse>> {
    let mut file_content: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart field", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file content", e))?;
        file_content = Some(bytes.to_vec());
    }

    let content = file_content
        .ok_or_else(|| ApiError::BadRequest("Missing file in multipart request".to_string()))?;

    tracing::info!("Scanning upload of {} bytes", content.len());
    let results = service.scan(&content).await?;

    Ok(Json(ScanResponse { results }))
}
