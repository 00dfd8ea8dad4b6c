use image::DynamicImage;
use serde::Serialize;

use super::CurrencyMatch;

/// 检测器输出的单个价签区域
#[derive(Debug, Clone)]
pub struct DetectionItem {
    /// [x1, y1, x2, y2], 原图像素坐标
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub cropped_image: DynamicImage,
    pub class_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
    TagCrop,
    FullImageFallback,
}

/// 单个区域 (或整图) 的识别结果
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    #[serde(rename = "type")]
    pub kind: ScanKind,
    #[serde(rename = "text")]
    pub recognized_text: String,
    pub confidence: f64,
    #[serde(rename = "bbox")]
    pub bounding_box: Vec<f64>,
    pub currency_matches: Vec<CurrencyMatch>,
}

impl ScanResult {
    pub fn tag_crop(item: &DetectionItem, text: String, matches: Vec<CurrencyMatch>) -> Self {
        Self {
            kind: ScanKind::TagCrop,
            recognized_text: text,
            confidence: item.confidence,
            bounding_box: item.bbox.to_vec(),
            currency_matches: matches,
        }
    }

    /// 未检测到价签时整图识别的结果: 置信度 0.0, bbox 为空
    pub fn full_image_fallback(text: String, matches: Vec<CurrencyMatch>) -> Self {
        Self {
            kind: ScanKind::FullImageFallback,
            recognized_text: text,
            confidence: 0.0,
            bounding_box: Vec::new(),
            currency_matches: matches,
        }
    }
}

/// POST /scan 响应体
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub results: Vec<ScanResult>,
}
