use price_tag_scanner::{
    api, AppConfig, CommandDetector, CurrencyExtractor, NbpRateSource, RateCache, ScanService,
    TesseractReader,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    // 汇率缓存: 进程内唯一, 所有请求共享
    let rate_source = Arc::new(NbpRateSource::new(
        config.rates.base_url.clone(),
        Duration::from_secs(config.rates.timeout_secs),
    ));
    let extractor = CurrencyExtractor::new(RateCache::new(rate_source))
        .with_strict_codes(config.rates.strict_codes);

    // 检测与 OCR 协作者
    let detector = Arc::new(CommandDetector::from_config(&config.detector)?);
    let reader = Arc::new(TesseractReader::from_config(&config.ocr));
    info!(
        "Detector model: {}, threshold: {}",
        config.detector.model_path,
        detector.confidence_threshold()
    );

    let service = Arc::new(ScanService::new(detector, reader, extractor));
    let app = api::router(service, config.server.max_upload_bytes);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /health");
    info!("  POST /scan     - multipart field \"file\"");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
