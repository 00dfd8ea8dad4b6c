//! 图像解码与裁剪

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::ScanError;

/// 解码上传的原始字节 (格式由文件头判断)
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage, ScanError> {
    if bytes.is_empty() {
        return Err(ScanError::EmptyImage);
    }
    image::load_from_memory(bytes).map_err(|e| ScanError::ImageDecode(e.to_string()))
}

/// 按 [x1, y1, x2, y2] 裁剪, 坐标截断为整数并限制在图像范围内
///
/// 退化的框 (x2 <= x1 或 y2 <= y1) 得到空图像.
pub fn crop_region(image: &DynamicImage, bbox: &[f64; 4]) -> DynamicImage {
    let (width, height) = image.dimensions();
    let clamp = |v: f64, max: u32| -> u32 {
        if v.is_nan() || v <= 0.0 {
            0
        } else {
            (v as u32).min(max)
        }
    };

    let x1 = clamp(bbox[0], width);
    let y1 = clamp(bbox[1], height);
    let x2 = clamp(bbox[2], width);
    let y2 = clamp(bbox[3], height);

    image.crop_imm(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
}

pub fn is_empty_image(image: &DynamicImage) -> bool {
    image.width() == 0 || image.height() == 0
}

/// 写入临时 PNG, 供外部进程读取; 文件随返回值 drop 删除
pub fn write_temp_png(image: &DynamicImage) -> Result<NamedTempFile, ScanError> {
    let file = tempfile::Builder::new()
        .prefix("price-scan-")
        .suffix(".png")
        .tempfile()?;
    save_png(image, file.path())?;
    Ok(file)
}

fn save_png(image: &DynamicImage, path: &Path) -> Result<(), ScanError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| ScanError::ImageEncode(e.to_string()))
}
