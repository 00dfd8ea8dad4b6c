//! 价签文字识别, 基于 Tesseract 的 TSV 输出

use async_trait::async_trait;
use image::DynamicImage;
use indexmap::IndexMap;
use tokio::process::Command;

use super::image_utils::{is_empty_image, write_temp_png};
use crate::config::OcrConfig;
use crate::error::ScanError;

#[async_trait]
pub trait TextReader: Send + Sync {
    /// 识别图像中的文字; 空图像或无可信文字时返回空字符串
    async fn read_text(&self, image: &DynamicImage) -> Result<String, ScanError>;
}

/// TSV 中 level 5 为单词
const WORD_LEVEL: &str = "5";

#[derive(Default)]
struct LineAccumulator {
    words: Vec<String>,
    confidence_sum: f64,
}

/// 解析 `tesseract ... tsv` 输出
///
/// 单词按 (page, block, par, line) 归行, 行置信度为单词置信度均值 (0~1).
/// 只保留置信度大于 `min_confidence` 的行, 以单个空格拼接.
pub fn parse_tesseract_tsv(tsv: &str, min_confidence: f64) -> Result<String, ScanError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_reader(tsv.as_bytes());

    let mut lines: IndexMap<(String, String, String, String), LineAccumulator> = IndexMap::new();

    for record in reader.records() {
        let record = record.map_err(|e| ScanError::Reader(format!("invalid TSV: {}", e)))?;
        if record.get(0) != Some(WORD_LEVEL) {
            continue;
        }

        let text = record.get(11).unwrap_or("").trim();
        let confidence: f64 = match record.get(10).and_then(|c| c.trim().parse().ok()) {
            Some(c) if c >= 0.0 => c,
            _ => continue,
        };
        if text.is_empty() {
            continue;
        }

        let key = (
            record.get(1).unwrap_or("").to_string(),
            record.get(2).unwrap_or("").to_string(),
            record.get(3).unwrap_or("").to_string(),
            record.get(4).unwrap_or("").to_string(),
        );
        let line = lines.entry(key).or_default();
        line.words.push(text.to_string());
        line.confidence_sum += confidence;
    }

    let kept: Vec<String> = lines
        .into_values()
        .filter(|line| {
            let confidence = line.confidence_sum / line.words.len() as f64 / 100.0;
            confidence > min_confidence
        })
        .map(|line| line.words.join(" "))
        .collect();

    Ok(kept.join(" ").trim().to_string())
}

pub struct TesseractReader {
    binary: String,
    language: String,
    min_confidence: f64,
}

impl TesseractReader {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            language: config.language.clone(),
            min_confidence: config.min_confidence,
        }
    }
}

#[async_trait]
impl TextReader for TesseractReader {
    async fn read_text(&self, image: &DynamicImage) -> Result<String, ScanError> {
        if is_empty_image(image) {
            return Ok(String::new());
        }

        let input = write_temp_png(image)?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .output()
            .await
            .map_err(|e| ScanError::Reader(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::Reader(format!(
                "{} exited with {:?}: {}",
                self.binary,
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_tesseract_tsv(&stdout, self.min_confidence)
    }
}
