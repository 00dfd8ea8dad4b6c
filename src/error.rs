use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 单张图片处理过程中的错误
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Image data is empty")]
    EmptyImage,

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to encode image: {0}")]
    ImageEncode(String),

    #[error("Detector failed: {0}")]
    Detector(String),

    #[error("Text reader failed: {0}")]
    Reader(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// 汇率源错误; 在缓存层被记为 "无汇率", 不会上升为请求级错误
#[derive(Error, Debug)]
pub enum RateError {
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    #[error("Transport error: {provider} - {message}")]
    Transport { provider: String, message: String },

    #[error("HTTP {status} from {provider} for {code}")]
    Status {
        provider: String,
        code: String,
        status: u16,
    },

    #[error("Malformed payload from {provider}: {message}")]
    MalformedPayload { provider: String, message: String },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::PayloadTooLarge(reason) => (StatusCode::PAYLOAD_TOO_LARGE, reason),
            ApiError::Internal(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason),
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::EmptyImage | ScanError::ImageDecode(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
