use image::DynamicImage;
use std::sync::Arc;

use crate::currency::CurrencyExtractor;
use crate::error::ScanError;
use crate::models::ScanResult;
use crate::vision::{decode_image_bytes, Detector, TextReader};

/// 价签扫描服务: 解码 → 检测 → OCR → 金额提取
///
/// 进程启动时创建一次并以 `Arc` 共享; 唯一跨请求的可变状态是提取器内部的汇率缓存.
pub struct ScanService {
    detector: Arc<dyn Detector>,
    reader: Arc<dyn TextReader>,
    extractor: CurrencyExtractor,
}

impl ScanService {
    pub fn new(
        detector: Arc<dyn Detector>,
        reader: Arc<dyn TextReader>,
        extractor: CurrencyExtractor,
    ) -> Self {
        Self {
            detector,
            reader,
            extractor,
        }
    }

    /// 处理一张上传图片
    ///
    /// 检测到价签时每个区域一条 `tag_crop`; 否则整图识别, 只返回一条 `full_image_fallback`.
    pub async fn scan(&self, image_bytes: &[u8]) -> Result<Vec<ScanResult>, ScanError> {
        // 1. 解码
        let image = decode_image_bytes(image_bytes)?;

        // 2. 检测价签
        let detections = self.detector.detect(&image).await?;

        // 3. 未检测到 → 整图 fallback
        if detections.is_empty() {
            let text = self.read_text(&image).await;
            let matches = self.extractor.extract(&text).await;
            tracing::info!(
                "No price tag detected, full image: {} chars, {} price(s)",
                text.len(), matches.len()
            );
            return Ok(vec![ScanResult::full_image_fallback(text, matches)]);
        }

        // 4. 逐个区域识别
        let mut results = Vec::with_capacity(detections.len());
        for (idx, item) in detections.iter().enumerate() {
            let text = self.read_text(&item.cropped_image).await;
            let matches = self.extractor.extract(&text).await;
            tracing::info!(
                "Tag {}/{} (conf {:.2}): {} price(s)",
                idx + 1, detections.len(), item.confidence, matches.len()
            );
            results.push(ScanResult::tag_crop(item, text, matches));
        }

        Ok(results)
    }

    /// OCR 失败不中断请求, 按空文本处理
    async fn read_text(&self, image: &DynamicImage) -> String {
        match self.reader.read_text(image).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Text reader failed, treating as empty text: {}", e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{RateCache, RateSource};
    use crate::error::RateError;
    use crate::models::{DetectionItem, ScanKind};
    use crate::vision::crop_region;
    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use image::ImageFormat;
    use std::io::Cursor;
    use std::sync::Mutex;

    struct FixedDetector(Vec<[f64; 4]>);

    #[async_trait]
    impl Detector for FixedDetector {
        async fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectionItem>, ScanError> {
            Ok(self
                .0
                .iter()
                .map(|bbox| DetectionItem {
                    bbox: *bbox,
                    confidence: 0.9,
                    cropped_image: crop_region(image, bbox),
                    class_id: 0,
                })
                .collect())
        }
    }

    struct FailingDetector;

    #[async_trait]
    impl Detector for FailingDetector {
        async fn detect(&self, _image: &DynamicImage) -> Result<Vec<DetectionItem>, ScanError> {
            Err(ScanError::Detector("model crashed".to_string()))
        }
    }

    /// 按调用顺序依次返回预设文本, 并记录每次收到的图像宽度
    struct ScriptedReader {
        texts: Mutex<Vec<Result<String, ScanError>>>,
        widths: Mutex<Vec<u32>>,
    }

    impl ScriptedReader {
        fn new(texts: Vec<Result<String, ScanError>>) -> Arc<Self> {
            Arc::new(Self {
                texts: Mutex::new(texts),
                widths: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextReader for ScriptedReader {
        async fn read_text(&self, image: &DynamicImage) -> Result<String, ScanError> {
            self.widths.lock().unwrap().push(image.width());
            let mut texts = self.texts.lock().unwrap();
            if texts.is_empty() {
                Ok(String::new())
            } else {
                texts.remove(0)
            }
        }
    }

    struct NoRates;

    #[async_trait]
    impl RateSource for NoRates {
        fn id(&self) -> &'static str {
            "NONE"
        }

        async fn fetch_rate(&self, _code: &str) -> Result<BigDecimal, RateError> {
            Err(RateError::Timeout {
                provider: "NONE".to_string(),
            })
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn service(detector: Arc<dyn Detector>, reader: Arc<dyn TextReader>) -> ScanService {
        let extractor = CurrencyExtractor::new(RateCache::new(Arc::new(NoRates)));
        ScanService::new(detector, reader, extractor)
    }

    #[tokio::test]
    async fn test_zero_detections_fall_back_to_full_image() {
        let reader = ScriptedReader::new(vec![Ok("Cena: 19,99 PLN".to_string())]);
        let svc = service(Arc::new(FixedDetector(vec![])), reader.clone());

        let results = svc.scan(&png(64, 32)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, ScanKind::FullImageFallback);
        assert_eq!(results[0].confidence, 0.0);
        assert!(results[0].bounding_box.is_empty());
        assert_eq!(results[0].currency_matches.len(), 1);
        assert_eq!(*reader.widths.lock().unwrap(), vec![64]);
    }

    #[tokio::test]
    async fn test_one_result_per_detected_region() {
        let reader = ScriptedReader::new(vec![
            Ok("4,99 PLN".to_string()),
            Ok("10 USD".to_string()),
        ]);
        let svc = service(
            Arc::new(FixedDetector(vec![[0.0, 0.0, 20.0, 10.0], [30.0, 0.0, 60.0, 10.0]])),
            reader.clone(),
        );

        let results = svc.scan(&png(64, 32)).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.kind == ScanKind::TagCrop));
        assert_eq!(results[0].bounding_box, vec![0.0, 0.0, 20.0, 10.0]);
        assert_eq!(results[1].recognized_text, "10 USD");
        assert_eq!(results[1].currency_matches[0].rate, None);
        // OCR 只作用于裁剪区域
        assert_eq!(*reader.widths.lock().unwrap(), vec![20, 30]);
    }

    #[tokio::test]
    async fn test_reader_failure_yields_empty_text() {
        let reader = ScriptedReader::new(vec![Err(ScanError::Reader("boom".to_string()))]);
        let svc = service(Arc::new(FixedDetector(vec![])), reader);

        let results = svc.scan(&png(8, 8)).await.unwrap();
        assert_eq!(results[0].recognized_text, "");
        assert!(results[0].currency_matches.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_upload_is_rejected() {
        let reader = ScriptedReader::new(vec![]);
        let svc = service(Arc::new(FixedDetector(vec![])), reader.clone());

        let result = svc.scan(b"not an image").await;
        assert!(matches!(result, Err(ScanError::ImageDecode(_))));
        assert!(reader.widths.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_detector_failure_propagates() {
        let reader = ScriptedReader::new(vec![]);
        let svc = service(Arc::new(FailingDetector), reader);

        assert!(matches!(
            svc.scan(&png(8, 8)).await,
            Err(ScanError::Detector(_))
        ));
    }
}
