use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// 环境变量前缀, 例如 `PRICE_SCAN_SERVER__PORT=9000`
const ENV_PREFIX: &str = "PRICE_SCAN";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub detector: DetectorConfig,
    pub ocr: OcrConfig,
    pub rates: RatesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

/// 价签检测模型 (YOLO) 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub model_path: String,
    /// 外部检测命令; 未设置时所有请求走整图 fallback
    pub command: Option<String>,
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub binary: String,
    pub language: String,
    pub min_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// 只接受 ISO-4217 列表中的币种代码
    pub strict_codes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_upload_bytes: 10 * 1024 * 1024,
            },
            detector: DetectorConfig {
                model_path: "/models/yolo11n.pt".to_string(),
                command: None,
                confidence_threshold: 0.4,
            },
            ocr: OcrConfig {
                binary: "tesseract".to_string(),
                language: "eng".to_string(),
                min_confidence: 0.5,
            },
            rates: RatesConfig {
                base_url: "http://api.nbp.pl/api/exchangerates/rates/a/".to_string(),
                timeout_secs: 5,
                strict_codes: false,
            },
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置 (未设置的键使用默认值)
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_service() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.detector.confidence_threshold, 0.4);
        assert!(config.detector.command.is_none());
        assert_eq!(config.ocr.min_confidence, 0.5);
        assert_eq!(config.rates.timeout_secs, 5);
        assert!(config.rates.base_url.ends_with("/rates/a/"));
    }

    #[test]
    fn environment_overrides_defaults() {
        std::env::set_var("PRICE_SCAN_OCR__LANGUAGE", "pol");
        let config = AppConfig::from_env().unwrap();
        std::env::remove_var("PRICE_SCAN_OCR__LANGUAGE");

        assert_eq!(config.ocr.language, "pol");
        assert_eq!(config.ocr.binary, "tesseract");
    }
}
