/// 基准货币 (NBP 汇率均以 PLN 计价)
pub const REFERENCE_CURRENCY: &str = "PLN";

/// 归一化为 PLN 的写法: 符号 zł, 其 ASCII 缩写, ISO 代码
const REFERENCE_ALIASES: &[&str] = &["ZŁ", "ZL", "PLN"];

/// 现行 ISO-4217 代码, 仅在 strict 模式下用于校验
const ISO_4217: &[&str] = &[
    "AED", "AFN", "ALL", "AMD", "ANG", "AOA", "ARS", "AUD", "AWG", "AZN", "BAM", "BBD", "BDT",
    "BGN", "BHD", "BIF", "BMD", "BND", "BOB", "BRL", "BSD", "BTN", "BWP", "BYN", "BZD", "CAD",
    "CDF", "CHF", "CLP", "CNY", "COP", "CRC", "CUP", "CVE", "CZK", "DJF", "DKK", "DOP", "DZD",
    "EGP", "ERN", "ETB", "EUR", "FJD", "FKP", "GBP", "GEL", "GHS", "GIP", "GMD", "GNF", "GTQ",
    "GYD", "HKD", "HNL", "HTG", "HUF", "IDR", "ILS", "INR", "IQD", "IRR", "ISK", "JMD", "JOD",
    "JPY", "KES", "KGS", "KHR", "KMF", "KPW", "KRW", "KWD", "KYD", "KZT", "LAK", "LBP", "LKR",
    "LRD", "LSL", "LYD", "MAD", "MDL", "MGA", "MKD", "MMK", "MNT", "MOP", "MRU", "MUR", "MVR",
    "MWK", "MXN", "MYR", "MZN", "NAD", "NGN", "NIO", "NOK", "NPR", "NZD", "OMR", "PAB", "PEN",
    "PGK", "PHP", "PKR", "PLN", "PYG", "QAR", "RON", "RSD", "RUB", "RWF", "SAR", "SBD", "SCR",
    "SDG", "SEK", "SGD", "SHP", "SLE", "SOS", "SRD", "SSP", "STN", "SYP", "SZL", "THB", "TJS",
    "TMT", "TND", "TOP", "TRY", "TTD", "TWD", "TZS", "UAH", "UGX", "USD", "UYU", "UZS", "VES",
    "VND", "VUV", "WST", "XAF", "XCD", "XDR", "XOF", "XPF", "YER", "ZAR", "ZMW", "ZWL",
];

/// 归一化 OCR 捕获到的币种 token
///
/// PLN 的各种写法统一为 `PLN`; 其余 3 位字母 token 转大写后原样返回;
/// 其他形状 (长度不对, 含数字) 返回 `None`.
pub fn normalize_currency_code(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_uppercase();
    if REFERENCE_ALIASES.contains(&normalized.as_str()) {
        return Some(REFERENCE_CURRENCY.to_string());
    }
    if normalized.len() == 3 && normalized.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(normalized);
    }
    None
}

pub fn is_known_iso_code(code: &str) -> bool {
    ISO_4217.contains(&code)
}

pub fn is_reference_currency(code: &str) -> bool {
    code.eq_ignore_ascii_case(REFERENCE_CURRENCY)
}
