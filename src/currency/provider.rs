//! 汇率源: 给定 3 位币种代码, 返回相对 PLN 的中间价.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::Client;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use crate::error::RateError;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// 用于日志的标识
    fn id(&self) -> &'static str;

    /// 单次请求, 不重试
    async fn fetch_rate(&self, code: &str) -> Result<BigDecimal, RateError>;
}

const PROVIDER_ID: &str = "NBP";

/// NBP (Narodowy Bank Polski) 表 A 接口的响应
#[derive(Debug, Deserialize)]
struct NbpRatesResponse {
    rates: Vec<NbpRate>,
}

#[derive(Debug, Deserialize)]
struct NbpRate {
    mid: f64,
}

/// NBP 公共汇率接口: `GET {base_url}{code}/?format=json`
pub struct NbpRateSource {
    client: Client,
    base_url: String,
}

impl NbpRateSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn rate_url(&self, code: &str) -> String {
        format!("{}{}/?format=json", self.base_url, code)
    }
}

#[async_trait]
impl RateSource for NbpRateSource {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_rate(&self, code: &str) -> Result<BigDecimal, RateError> {
        let url = self.rate_url(code);
        tracing::debug!("Fetching {} rate from {}", code, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                RateError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                RateError::Transport {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status {
                provider: PROVIDER_ID.to_string(),
                code: code.to_string(),
                status: status.as_u16(),
            });
        }

        let body: NbpRatesResponse =
            response
                .json()
                .await
                .map_err(|e| RateError::MalformedPayload {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                })?;

        let mid = body
            .rates
            .first()
            .map(|r| r.mid)
            .ok_or_else(|| RateError::MalformedPayload {
                provider: PROVIDER_ID.to_string(),
                message: "empty rates list".to_string(),
            })?;

        // f64 的 Display 是最短表示, 避免 4.3 变成 4.2999999...
        BigDecimal::from_str(&mid.to_string()).map_err(|e| RateError::MalformedPayload {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};

    /// 在本地随机端口启动一个模拟 NBP 的服务, 返回 base_url
    async fn spawn_fake_nbp() -> String {
        let app = Router::new().route(
            "/rates/a/:code/",
            get(|Path(code): Path<String>| async move {
                match code.as_str() {
                    "EUR" => Ok(Json(serde_json::json!({
                        "table": "A",
                        "currency": "euro",
                        "code": "EUR",
                        "rates": [{"no": "001/A/NBP/2026", "effectiveDate": "2026-01-02", "mid": 4.3}]
                    }))),
                    "XXX" => Ok(Json(serde_json::json!({"rates": []}))),
                    "BAD" => Ok(Json(serde_json::json!({"unexpected": true}))),
                    _ => Err(StatusCode::NOT_FOUND),
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/rates/a/", addr)
    }

    #[test]
    fn test_rate_url_layout() {
        let source = NbpRateSource::new("http://api.nbp.pl/api/exchangerates/rates/a/", Duration::from_secs(5));
        assert_eq!(
            source.rate_url("EUR"),
            "http://api.nbp.pl/api/exchangerates/rates/a/EUR/?format=json"
        );
    }

    #[tokio::test]
    async fn test_fetch_rate_reads_first_mid() {
        let source = NbpRateSource::new(spawn_fake_nbp().await, Duration::from_secs(5));
        let rate = source.fetch_rate("EUR").await.unwrap();
        assert_eq!(rate, BigDecimal::from_str("4.3").unwrap());
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let source = NbpRateSource::new(spawn_fake_nbp().await, Duration::from_secs(5));
        let err = source.fetch_rate("USD").await.unwrap_err();
        assert!(matches!(err, RateError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_malformed_payloads_are_reported() {
        let source = NbpRateSource::new(spawn_fake_nbp().await, Duration::from_secs(5));
        assert!(matches!(
            source.fetch_rate("XXX").await,
            Err(RateError::MalformedPayload { .. })
        ));
        assert!(matches!(
            source.fetch_rate("BAD").await,
            Err(RateError::MalformedPayload { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // 绑定后立即释放端口, 保证连接被拒绝
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = NbpRateSource::new(format!("http://{}/", addr), Duration::from_secs(5));
        assert!(matches!(
            source.fetch_rate("EUR").await,
            Err(RateError::Transport { .. }) | Err(RateError::Timeout { .. })
        ));
    }
}
