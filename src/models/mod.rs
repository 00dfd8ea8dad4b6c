pub mod currency_match;
pub mod scan;

pub use currency_match::CurrencyMatch;
pub use scan::{DetectionItem, ScanKind, ScanResponse, ScanResult};
