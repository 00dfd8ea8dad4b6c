use bigdecimal::{BigDecimal, One};
use dashmap::DashMap;
use std::sync::Arc;

use super::codes::is_reference_currency;
use super::provider::RateSource;

/// 进程级汇率缓存
///
/// 启动时创建一次, 以 `Arc` 在并发请求间共享; 读写都可并发.
/// 查询失败同样会被缓存 (`None`), 进程生命周期内不再重试该代码,
/// 即使汇率源之后恢复可用.
/// 两个请求同时 miss 同一代码时会各自请求一次汇率源, 结果相同, 无需加锁.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    entries: DashMap<String, Option<BigDecimal>>,
}

impl RateCache {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self {
            source,
            entries: DashMap::new(),
        }
    }

    /// 返回 1 单位 `code` 对应的 PLN 数额, 不可用时为 `None`
    pub async fn resolve(&self, code: &str) -> Option<BigDecimal> {
        let code = code.trim().to_uppercase();
        if is_reference_currency(&code) {
            return Some(BigDecimal::one());
        }

        // 先取出值再 await, 不跨 await 持有分片锁
        let cached = self.entries.get(&code).map(|entry| entry.value().clone());
        if let Some(rate) = cached {
            tracing::debug!("Rate cache hit for {}: {:?}", code, rate);
            return rate;
        }

        let rate = match self.source.fetch_rate(&code).await {
            Ok(rate) => {
                tracing::info!("Fetched {} rate from {}: {}", code, self.source.id(), rate);
                Some(rate)
            }
            Err(e) => {
                tracing::warn!(
                    "Rate lookup for {} failed, caching as unavailable: {}",
                    code, e
                );
                None
            }
        };

        self.entries.insert(code, rate.clone());
        rate
    }

    /// 缓存中的条目; 外层 `None` 表示从未查询过
    pub fn cached(&self, code: &str) -> Option<Option<BigDecimal>> {
        self.entries
            .get(&code.to_uppercase())
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
