pub mod api;
pub mod config;
pub mod currency;
pub mod error;
pub mod models;
pub mod service;
pub mod vision;

pub use config::AppConfig;
pub use currency::{CurrencyExtractor, NbpRateSource, RateCache};
pub use service::ScanService;
pub use vision::{CommandDetector, TesseractReader};
