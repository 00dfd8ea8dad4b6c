use bigdecimal::{BigDecimal, RoundingMode};
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

use super::cache::RateCache;
use super::codes::{is_known_iso_code, normalize_currency_code};
use crate::models::CurrencyMatch;

/// 折算结果保留的小数位
const CONVERTED_SCALE: i64 = 2;

lazy_static! {
    // 金额: 数字/空格/NBSP 开头, 后接数字、逗号、点; 币种: zł 或任意 3 位字母
    static ref CURRENCY_PATTERN: Regex = Regex::new(
        r"(?i)(?P<amount>[\d \x{A0}]+[\d,.]*)\s*(?P<currency>PLN|ZŁ|[A-Z]{3})"
    )
    .unwrap();
}

/// 解析前、尚未查询汇率的匹配
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyCandidate {
    pub raw_text: String,
    pub amount: BigDecimal,
    pub currency_code: String,
}

/// 解析金额 token: 去掉空格和 NBSP, 逗号视为小数点
///
/// 不是合法的非负有限数时返回 `None`.
pub fn parse_amount(value: &str) -> Option<BigDecimal> {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{A0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let parsed: f64 = cleaned.parse().ok()?;
    if !parsed.is_finite() || parsed.is_sign_negative() {
        return None;
    }
    // "19." 按 19 处理
    BigDecimal::from_str(cleaned.trim_end_matches('.')).ok()
}

/// amount × rate, 四舍五入 (HALF-UP) 到 2 位小数
pub fn convert(amount: &BigDecimal, rate: &BigDecimal) -> BigDecimal {
    (amount * rate).with_scale_round(CONVERTED_SCALE, RoundingMode::HalfUp)
}

/// 按出现顺序扫描文本中的 "金额 币种"
///
/// 金额无法解析或币种无法归一化的匹配被直接跳过, 不影响其他匹配.
/// `strict_codes` 为 true 时, 不在 ISO-4217 列表中的代码同样被跳过.
pub fn scan_candidates(text: &str, strict_codes: bool) -> Vec<CurrencyCandidate> {
    let mut candidates = Vec::new();

    for caps in CURRENCY_PATTERN.captures_iter(text) {
        let Some(amount) = parse_amount(&caps["amount"]) else {
            continue;
        };
        let Some(code) = normalize_currency_code(&caps["currency"]) else {
            continue;
        };
        if strict_codes && !is_known_iso_code(&code) {
            tracing::debug!("Dropping unknown currency code {}", code);
            continue;
        }

        candidates.push(CurrencyCandidate {
            raw_text: caps[0].trim().to_string(),
            amount,
            currency_code: code,
        });
    }

    candidates
}

/// 币种提取器: 正则扫描 + 汇率缓存 + 折算
pub struct CurrencyExtractor {
    cache: RateCache,
    strict_codes: bool,
}

impl CurrencyExtractor {
    pub fn new(cache: RateCache) -> Self {
        Self {
            cache,
            strict_codes: false,
        }
    }

    pub fn with_strict_codes(mut self, strict_codes: bool) -> Self {
        self.strict_codes = strict_codes;
        self
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// 提取文本中的所有金额, 保持文本中的顺序
    ///
    /// 没有汇率时仍然输出该匹配, 只是 `rate` / `converted_amount` 为空.
    pub async fn extract(&self, text: &str) -> Vec<CurrencyMatch> {
        let candidates = scan_candidates(text, self.strict_codes);
        let mut matches = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let rate = self.cache.resolve(&candidate.currency_code).await;
            let converted_amount = rate.as_ref().map(|r| convert(&candidate.amount, r));

            matches.push(CurrencyMatch {
                raw_text: candidate.raw_text,
                amount: candidate.amount,
                currency_code: candidate.currency_code,
                rate,
                converted_amount,
            });
        }

        matches
    }

    /// 单笔折算为 PLN; 汇率不可用或代码无效时为 `None`
    pub async fn convert_to_reference(&self, amount: &BigDecimal, code: &str) -> Option<BigDecimal> {
        let code = normalize_currency_code(code)?;
        let rate = self.cache.resolve(&code).await?;
        Some(convert(amount, &rate))
    }
}
