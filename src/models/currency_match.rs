use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Serialize, Serializer};

/// 价签文本中识别出的一笔 "金额 + 币种"
///
/// `converted_amount` 与 `rate` 同时存在或同时缺失.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyMatch {
    #[serde(rename = "raw")]
    pub raw_text: String,
    #[serde(serialize_with = "decimal_as_f64")]
    pub amount: BigDecimal,
    #[serde(rename = "currency")]
    pub currency_code: String,
    #[serde(serialize_with = "option_decimal_as_f64")]
    pub rate: Option<BigDecimal>,
    /// 折算为基准货币 (PLN) 后的金额
    #[serde(rename = "pln", serialize_with = "option_decimal_as_f64")]
    pub converted_amount: Option<BigDecimal>,
}

/// JSON 中金额以数字输出, 而不是 BigDecimal 的字符串形式
fn decimal_as_f64<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    let number = value
        .to_f64()
        .ok_or_else(|| <S::Error as serde::ser::Error>::custom(format!("decimal out of range: {}", value)))?;
    serializer.serialize_f64(number)
}

fn option_decimal_as_f64<S: Serializer>(
    value: &Option<BigDecimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => decimal_as_f64(v, serializer),
        None => serializer.serialize_none(),
    }
}
