//! 外部视觉协作者: 价签检测 (YOLO) 与文字识别 (Tesseract)
//!
//! 两者都隐藏在 trait 之后, 业务逻辑与测试只依赖 `Detector` / `TextReader`.

pub mod detector;
pub mod image_utils;
pub mod reader;

pub use detector::{CommandDetector, Detector};
pub use image_utils::{crop_region, decode_image_bytes};
pub use reader::{TesseractReader, TextReader};
