pub mod handlers;

pub use handlers::*;

use crate::service::ScanService;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// 构建路由
pub fn router(service: Arc<ScanService>, max_upload_bytes: usize) -> Router {
    let scan_routes = Router::new()
        .route("/scan", post(scan))
        .with_state(service);

    Router::new()
        .route("/health", get(health_check))
        .merge(scan_routes)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(max_upload_bytes)))
}
