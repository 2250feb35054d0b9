use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::api::across::{ChainInfo, TokenInfo};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: Arc<T>,
    captured_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            captured_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.captured_at.elapsed() < ttl
    }

    pub fn value(&self) -> Arc<T> {
        self.value.clone()
    }
}

/// 每个服务实例独享的资源缓存：链列表一个槽位，代币列表按链 id 分槽。
///
/// 并发写入直接覆盖，后写者生效。
#[derive(Debug)]
pub struct ResourceCache {
    ttl: Duration,
    chains: Mutex<Option<CacheEntry<Vec<ChainInfo>>>>,
    tokens: DashMap<u64, CacheEntry<Vec<TokenInfo>>>,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ResourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            chains: Mutex::new(None),
            tokens: DashMap::new(),
        }
    }

    pub fn chains(&self) -> Option<Arc<Vec<ChainInfo>>> {
        self.chains
            .lock()
            .as_ref()
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(CacheEntry::value)
    }

    pub fn store_chains(&self, chains: Vec<ChainInfo>) -> Arc<Vec<ChainInfo>> {
        let entry = CacheEntry::new(chains);
        let value = entry.value();
        *self.chains.lock() = Some(entry);
        value
    }

    pub fn tokens(&self, chain_id: u64) -> Option<Arc<Vec<TokenInfo>>> {
        let entry = self.tokens.get(&chain_id)?;
        if entry.is_fresh(self.ttl) {
            Some(CacheEntry::value(&entry))
        } else {
            None
        }
    }

    pub fn store_tokens(&self, chain_id: u64, tokens: Vec<TokenInfo>) -> Arc<Vec<TokenInfo>> {
        let entry = CacheEntry::new(tokens);
        let value = entry.value();
        self.tokens.insert(chain_id, entry);
        value
    }

    pub fn clear(&self) {
        *self.chains.lock() = None;
        self.tokens.clear();
    }
}
