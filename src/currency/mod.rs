pub mod cache;
pub mod codes;
pub mod extractor;
pub mod provider;

pub use cache::RateCache;
pub use codes::{normalize_currency_code, REFERENCE_CURRENCY};
pub use extractor::{convert, parse_amount, scan_candidates, CurrencyCandidate, CurrencyExtractor};
pub use provider::{NbpRateSource, RateSource};
