use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::data::types::{SingleTransactionResult, TokenTransfersResult, WalletHistoryResult};

/// How long an identical request may reuse a previous answer. Long enough to
/// absorb repeated identical calls within a session, short enough that fresh
/// history shows up quickly.
const RESULT_TTL: Duration = Duration::from_secs(60);

const WALLET_CACHE_SIZE: usize = 64;
const TRANSFERS_CACHE_SIZE: usize = 64;
const TX_CACHE_SIZE: usize = 128;

/// Short-lived result cache keyed by (operation, normalized arguments),
/// de-duplicating repeated identical upstream calls within a session.
pub struct ResultCache {
    wallet: LruCache<String, (Instant, WalletHistoryResult)>,
    transfers: LruCache<String, (Instant, TokenTransfersResult)>,
    transactions: LruCache<String, (Instant, SingleTransactionResult)>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            wallet: LruCache::new(NonZeroUsize::new(WALLET_CACHE_SIZE).unwrap()),
            transfers: LruCache::new(NonZeroUsize::new(TRANSFERS_CACHE_SIZE).unwrap()),
            transactions: LruCache::new(NonZeroUsize::new(TX_CACHE_SIZE).unwrap()),
        }
    }

    pub fn get_wallet(&mut self, key: &str) -> Option<WalletHistoryResult> {
        let entry = self.wallet.get(key)?;
        if entry.0.elapsed() < RESULT_TTL {
            Some(entry.1.clone())
        } else {
            self.wallet.pop(key);
            None
        }
    }

    pub fn put_wallet(&mut self, key: String, result: WalletHistoryResult) {
        self.wallet.put(key, (Instant::now(), result));
    }

    pub fn get_transfers(&mut self, key: &str) -> Option<TokenTransfersResult> {
        let entry = self.transfers.get(key)?;
        if entry.0.elapsed() < RESULT_TTL {
            Some(entry.1.clone())
        } else {
            self.transfers.pop(key);
            None
        }
    }

    pub fn put_transfers(&mut self, key: String, result: TokenTransfersResult) {
        self.transfers.put(key, (Instant::now(), result));
    }

    pub fn get_transaction(&mut self, key: &str) -> Option<SingleTransactionResult> {
        let entry = self.transactions.get(key)?;
        if entry.0.elapsed() < RESULT_TTL {
            Some(entry.1.clone())
        } else {
            self.transactions.pop(key);
            None
        }
    }

    pub fn put_transaction(&mut self, key: String, result: SingleTransactionResult) {
        self.transactions.put(key, (Instant::now(), result));
    }

    pub fn clear(&mut self) {
        self.wallet.clear();
        self.transfers.clear();
        self.transactions.clear();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
