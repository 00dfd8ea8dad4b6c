//! 价签检测 (YOLO), 通过外部命令调用
//!
//! 命令约定: `<command> --model <path> --image <png> --conf <threshold>`,
//! stdout 输出 JSON 数组 `[{"bbox": [x1, y1, x2, y2], "confidence": 0.93, "class_id": 0}]`.

use async_trait::async_trait;
use image::DynamicImage;
use serde::Deserialize;
use tokio::process::Command;

use super::image_utils::{crop_region, write_temp_png};
use crate::config::DetectorConfig;
use crate::error::ScanError;
use crate::models::DetectionItem;

#[async_trait]
pub trait Detector: Send + Sync {
    /// 返回置信度不低于阈值的价签区域, 每个区域附带裁剪后的图像
    async fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectionItem>, ScanError>;
}

/// 检测命令输出的单个框
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawDetection {
    pub bbox: [f64; 4],
    pub confidence: f64,
    #[serde(default)]
    pub class_id: i64,
}

/// 解析检测命令的 stdout, 过滤低于阈值的框
pub fn parse_detections(stdout: &str, threshold: f64) -> Result<Vec<RawDetection>, ScanError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let detections: Vec<RawDetection> = serde_json::from_str(trimmed)
        .map_err(|e| ScanError::Detector(format!("invalid detector output: {}", e)))?;

    Ok(detections
        .into_iter()
        .filter(|d| d.confidence >= threshold)
        .collect())
}

pub struct CommandDetector {
    /// 已拆分的命令; `None` 表示未配置, 始终返回空结果
    program: Option<Vec<String>>,
    model_path: String,
    confidence_threshold: f64,
}

impl CommandDetector {
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ScanError> {
        let program = match config.command.as_deref() {
            Some(cmd) if !cmd.trim().is_empty() => {
                let parts = shell_words::split(cmd)
                    .map_err(|e| ScanError::Detector(format!("invalid detector command {:?}: {}", cmd, e)))?;
                Some(parts)
            }
            _ => {
                tracing::warn!("Detector command not configured, every scan will use the full image");
                None
            }
        };

        Ok(Self {
            program,
            model_path: config.model_path.clone(),
            confidence_threshold: config.confidence_threshold.clamp(0.0, 1.0),
        })
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }
}

#[async_trait]
impl Detector for CommandDetector {
    async fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectionItem>, ScanError> {
        let Some((program, args)) = self.program.as_ref().and_then(|p| p.split_first()) else {
            return Ok(Vec::new());
        };

        let input = write_temp_png(image)?;

        let output = Command::new(program)
            .args(args)
            .arg("--model")
            .arg(&self.model_path)
            .arg("--image")
            .arg(input.path())
            .arg("--conf")
            .arg(self.confidence_threshold.to_string())
            .output()
            .await
            .map_err(|e| ScanError::Detector(format!("failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::Detector(format!(
                "{} exited with {:?}: {}",
                program,
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let detections = parse_detections(&stdout, self.confidence_threshold)?;
        tracing::debug!("Detector found {} price tag(s)", detections.len());

        Ok(detections
            .into_iter()
            .map(|d| DetectionItem {
                cropped_image: crop_region(image, &d.bbox),
                bbox: d.bbox,
                confidence: d.confidence,
                class_id: d.class_id,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: Option<&str>) -> DetectorConfig {
        DetectorConfig {
            model_path: "/models/yolo11n.pt".to_string(),
            command: command.map(str::to_string),
            confidence_threshold: 0.4,
        }
    }

    #[test]
    fn test_parse_filters_by_threshold() {
        let stdout = r#"[
            {"bbox": [10, 20, 110, 60], "confidence": 0.91, "class_id": 0},
            {"bbox": [0, 0, 5, 5], "confidence": 0.39, "class_id": 0},
            {"bbox": [50, 50, 90, 70], "confidence": 0.4}
        ]"#;

        let detections = parse_detections(stdout, 0.4).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].bbox, [10.0, 20.0, 110.0, 60.0]);
        assert_eq!(detections[1].confidence, 0.4);
        assert_eq!(detections[1].class_id, 0);
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_detections("", 0.4).unwrap().is_empty());
        assert!(parse_detections("[]\n", 0.4).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_detections("Traceback (most recent call last)", 0.4),
            Err(ScanError::Detector(_))
        ));
    }

    #[test]
    fn test_from_config_splits_command() {
        let detector = CommandDetector::from_config(&config(Some("python3 '/opt/detect tags.py'"))).unwrap();
        assert_eq!(
            detector.program,
            Some(vec!["python3".to_string(), "/opt/detect tags.py".to_string()])
        );
        assert_eq!(detector.confidence_threshold(), 0.4);

        assert!(CommandDetector::from_config(&config(Some("python3 'unterminated"))).is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_detector_finds_nothing() {
        let detector = CommandDetector::from_config(&config(None)).unwrap();
        let image = DynamicImage::new_rgb8(8, 8);
        assert!(detector.detect(&image).await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_output_is_cropped() {
        // 用 sh 模拟检测脚本: 忽略参数, 直接输出固定结果
        let script = r#"sh -c 'echo "[{\"bbox\": [2, 2, 6, 5], \"confidence\": 0.8, \"class_id\": 1}]"' detect"#;
        let detector = CommandDetector::from_config(&config(Some(script))).unwrap();
        let image = DynamicImage::new_rgb8(10, 10);

        let items = detector.detect(&image).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].class_id, 1);
        assert_eq!(items[0].cropped_image.width(), 4);
        assert_eq!(items[0].cropped_image.height(), 3);
    }
}
