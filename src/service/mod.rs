pub mod scanner;

pub use scanner::ScanService;
