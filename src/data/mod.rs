pub mod cache;
pub mod chains;
pub mod decoder;
pub mod export;
pub mod merge;
pub mod price;
pub mod providers;
pub mod types;
pub mod value;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;

use crate::data::cache::ResultCache;
use crate::data::chains::ChainRegistry;
use crate::data::merge::merge_transactions;
use crate::data::price::PriceEnricher;
use crate::data::providers::ProviderKind;
use crate::data::providers::etherscan::EtherscanClient;
use crate::data::providers::moralis::MoralisClient;
use crate::data::providers::node::NodeClient;
use crate::data::types::{
    HistoryFilters, NormalizedTransaction, SingleTransactionResult, TokenTransfersRequest,
    TokenTransfersResult, TransactionLookupRequest, WalletHistoryRequest, WalletHistoryResult,
};
use crate::error::ResolveError;

const DEFAULT_CHAIN: &str = "0x1";
const ALL_CHAINS: &str = "all";
const MULTI_CHAIN_LABEL: &str = "Multi-Chain";

/// The orchestrator. Given a request and a provider preference, drives one or
/// more adapters across one or more chains with fallback and fan-out, and
/// returns a single normalized result.
pub struct Resolver {
    registry: Arc<ChainRegistry>,
    moralis: MoralisClient,
    etherscan: EtherscanClient,
    node: NodeClient,
    prices: PriceEnricher,
    cache: Mutex<ResultCache>,
}

impl Resolver {
    pub fn new(moralis_key: Option<String>, etherscan_key: Option<String>) -> Self {
        Self::with_registry(ChainRegistry::new(), moralis_key, etherscan_key)
    }

    /// Build against an injected registry; tests use this with a reduced
    /// chain set.
    pub fn with_registry(
        registry: ChainRegistry,
        moralis_key: Option<String>,
        etherscan_key: Option<String>,
    ) -> Self {
        let registry = Arc::new(registry);
        let moralis = MoralisClient::new(moralis_key);
        Self {
            node: NodeClient::new(Arc::clone(&registry)),
            prices: PriceEnricher::new(Arc::clone(&registry), moralis.clone()),
            etherscan: EtherscanClient::new(etherscan_key),
            moralis,
            cache: Mutex::new(ResultCache::new()),
            registry,
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Wallet transaction history for one chain or, with chain = "all", a
    /// concurrent scan of every chain in the registry's scan list.
    pub async fn wallet_transactions(
        &self,
        req: &WalletHistoryRequest,
    ) -> Result<WalletHistoryResult, ResolveError> {
        let chain_input = req.chain.as_deref().unwrap_or(DEFAULT_CHAIN);
        let scan_all = chain_input.eq_ignore_ascii_case(ALL_CHAINS);
        let chain_id = if scan_all {
            ALL_CHAINS.to_string()
        } else {
            self.registry.resolve(chain_input)
        };

        let cache_key = format!(
            "wallet:{}:{}:{}:{}:{}:{}",
            req.provider,
            req.address.to_lowercase(),
            chain_id,
            req.limit,
            req.from_date.as_deref().unwrap_or("-"),
            req.to_date.as_deref().unwrap_or("-"),
        );
        if let Some(hit) = self.cache.lock().await.get_wallet(&cache_key) {
            return Ok(hit);
        }

        let result = if scan_all {
            self.wallet_all_chains(req).await?
        } else {
            self.wallet_single_chain(req, &chain_id).await?
        };

        self.cache
            .lock()
            .await
            .put_wallet(cache_key, result.clone());
        Ok(result)
    }

    async fn wallet_all_chains(
        &self,
        req: &WalletHistoryRequest,
    ) -> Result<WalletHistoryResult, ResolveError> {
        if !req.provider.supports_multi_chain_history() {
            return Err(ResolveError::Unsupported(
                "RPC does not support multi-chain wallet scanning. Use the hosted indexer."
                    .to_string(),
            ));
        }

        // Every chain is fetched concurrently; one slow chain bounds the
        // scan, failed chains collapse to empty branches.
        let branches = fan_out_scan(self.registry.scan_list(), |chain_id| async move {
            self.scan_chain_strict(
                &req.address,
                &chain_id,
                req.limit,
                req.from_date.as_deref(),
                req.to_date.as_deref(),
            )
            .await
        })
        .await;

        let mut price_map = HashMap::new();
        for (chain_id, transactions) in &branches {
            if transactions.is_empty() {
                continue;
            }
            // One price per distinct chain that actually appears.
            let name = self.registry.display_name(chain_id);
            let price = self.prices.native_price(chain_id).await;
            price_map.insert(name, price);
        }

        let mut aggregated: Vec<NormalizedTransaction> =
            branches.into_iter().flat_map(|(_, txs)| txs).collect();
        sort_by_timestamp_desc(&mut aggregated);

        Ok(WalletHistoryResult {
            transactions: aggregated,
            chain: MULTI_CHAIN_LABEL.to_string(),
            searched_address: req.address.clone(),
            price_map,
            native_price: None,
            filters: Some(echo_filters(req)),
        })
    }

    async fn wallet_single_chain(
        &self,
        req: &WalletHistoryRequest,
        chain_id: &str,
    ) -> Result<WalletHistoryResult, ResolveError> {
        let chain_name = self.registry.display_name(chain_id);

        let transactions = match req.provider {
            ProviderKind::Etherscan => {
                // The explorer has no token-transfer listing, so there is
                // nothing to merge.
                let mut txs = self
                    .etherscan
                    .wallet_transactions(&req.address, chain_id, req.limit)
                    .await?;
                for tx in &mut txs {
                    tx.detected_chain = Some(chain_name.clone());
                    tx.provider = Some(req.provider.label().to_string());
                }
                txs
            }
            // The hosted indexer serves everything else; raw nodes cannot
            // enumerate an address's history.
            _ => {
                self.scan_chain_strict(
                    &req.address,
                    chain_id,
                    req.limit,
                    req.from_date.as_deref(),
                    req.to_date.as_deref(),
                )
                .await?
            }
        };

        let price = self.prices.native_price(chain_id).await;
        let mut price_map = HashMap::new();
        price_map.insert(chain_name.clone(), price);

        Ok(WalletHistoryResult {
            transactions,
            chain: chain_name,
            searched_address: req.address.clone(),
            price_map,
            native_price: Some(price),
            filters: Some(echo_filters(req)),
        })
    }

    /// One chain's native + token fetch and merge. Errors propagate; the
    /// multi-chain fan-out collapses them per branch instead.
    async fn scan_chain_strict(
        &self,
        address: &str,
        chain_id: &str,
        limit: usize,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Result<Vec<NormalizedTransaction>, ResolveError> {
        let native = self
            .moralis
            .wallet_transactions(address, chain_id, limit, from_date, to_date)
            .await?;
        let tokens = self.moralis.token_transfers(address, chain_id, limit).await?;

        let mut merged = merge_transactions(native, &tokens);
        let name = self.registry.display_name(chain_id);
        for tx in &mut merged {
            tx.detected_chain = Some(name.clone());
            tx.provider
                .get_or_insert_with(|| ProviderKind::Moralis.label().to_string());
        }
        Ok(merged)
    }

    /// ERC-20 transfer history for one address on one chain. Hosted-indexer
    /// only; no merge step.
    pub async fn token_transfers(
        &self,
        req: &TokenTransfersRequest,
    ) -> Result<TokenTransfersResult, ResolveError> {
        let chain_id = self
            .registry
            .resolve(req.chain.as_deref().unwrap_or(DEFAULT_CHAIN));

        let cache_key = format!(
            "transfers:{}:{}:{}",
            req.address.to_lowercase(),
            chain_id,
            req.limit
        );
        if let Some(hit) = self.cache.lock().await.get_transfers(&cache_key) {
            return Ok(hit);
        }

        let transfers = self
            .moralis
            .token_transfers(&req.address, &chain_id, req.limit)
            .await?;
        let result = TokenTransfersResult {
            transfers,
            chain: self.registry.display_name(&chain_id),
            searched_address: req.address.clone(),
        };

        self.cache
            .lock()
            .await
            .put_transfers(cache_key, result.clone());
        Ok(result)
    }

    /// Resolve one transaction hash, searching across chains when none is
    /// given and falling back to public nodes when the chosen provider comes
    /// up empty. The resolved transaction is then unconditionally enriched.
    pub async fn transaction_by_hash(
        &self,
        req: &TransactionLookupRequest,
    ) -> Result<SingleTransactionResult, ResolveError> {
        let cache_key = format!(
            "tx:{}:{}:{}",
            req.provider,
            req.hash.to_lowercase(),
            req.chain.as_deref().unwrap_or("-"),
        );
        if let Some(hit) = self.cache.lock().await.get_transaction(&cache_key) {
            return Ok(hit);
        }

        let resolved = match req.provider {
            ProviderKind::Rpc => self.node.find_transaction(&req.hash).await,
            provider => {
                let indexed = match &req.chain {
                    Some(chain) => {
                        let chain_id = self.registry.resolve(chain);
                        match self.lookup_via(provider, &req.hash, chain_id.clone()).await {
                            Ok(Some(tx)) => Some((chain_id, tx)),
                            // Errors here are swallowed; the direct-node
                            // fallback below still gets its chance.
                            _ => None,
                        }
                    }
                    None => {
                        search_chains(self.registry.search_order(), |chain_id| {
                            self.lookup_via(provider, &req.hash, chain_id)
                        })
                        .await
                    }
                };
                match indexed {
                    Some(hit) => Some(hit),
                    None => self.node.find_transaction(&req.hash).await,
                }
            }
        };

        let Some((chain_id, tx)) = resolved else {
            let message = if req.provider == ProviderKind::Rpc {
                "Transaction not found on any public RPC node."
            } else {
                "No provider or chain could resolve this transaction."
            };
            return Err(ResolveError::NotFound(message.to_string()));
        };

        let result = self.enrich_transaction(req, &chain_id, tx).await;
        self.cache
            .lock()
            .await
            .put_transaction(cache_key, result.clone());
        Ok(result)
    }

    async fn lookup_via(
        &self,
        provider: ProviderKind,
        hash: &str,
        chain_id: String,
    ) -> Result<Option<NormalizedTransaction>, ResolveError> {
        match provider {
            ProviderKind::Etherscan => self.etherscan.transaction_by_hash(hash, &chain_id).await,
            _ => self.moralis.transaction_by_hash(hash, &chain_id).await,
        }
    }

    async fn enrich_transaction(
        &self,
        req: &TransactionLookupRequest,
        chain_id: &str,
        mut tx: NormalizedTransaction,
    ) -> SingleTransactionResult {
        let chain_name = self.registry.display_name(chain_id);
        tx.detected_chain.get_or_insert(chain_name);
        tx.provider
            .get_or_insert_with(|| req.provider.label().to_string());

        // A direct-node result already carries decoded transfers; anything
        // else gets the gaps filled, fail-soft, from the richer sources.
        let from_node = tx.provider.as_deref() == Some("Public RPC");
        if !from_node {
            if tx.erc20_transfers.is_none() && self.moralis.has_key() {
                tx.erc20_transfers = Some(
                    self.moralis
                        .transaction_token_transfers(&tx.hash, chain_id)
                        .await,
                );
            }
            if tx.nft_transfers.is_none() && self.moralis.has_key() {
                tx.nft_transfers = Some(
                    self.moralis
                        .transaction_nft_transfers(&tx.hash, chain_id)
                        .await,
                );
            }
            if tx.internal_transfers.is_none() && self.etherscan.has_key() {
                let internal = self.etherscan.internal_transactions(&tx.hash, chain_id).await;
                if !internal.is_empty() {
                    tx.internal_transfers = Some(internal);
                }
            }
        }

        // Price the primary token when one is involved, and the native asset
        // always.
        let token_price = match tx.erc20_transfers.as_ref().and_then(|t| t.first()) {
            Some(first) => Some(self.prices.token_price(&first.address, chain_id).await),
            None => None,
        };
        if tx.native_price.is_none() {
            tx.native_price = Some(self.prices.native_price(chain_id).await);
        }

        SingleTransactionResult {
            transaction: tx,
            searched_address: req.hash.clone(),
            token_price,
        }
    }
}

/// Ordered sequential search over a chain priority list, stopping at the
/// first hit. An authentication error aborts the iteration, since retrying
/// across chains cannot fix a bad credential; any other per-chain failure
/// means "try the next chain".
pub(crate) async fn search_chains<T, F, Fut>(
    order: &[&'static str],
    mut fetch: F,
) -> Option<(String, T)>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<T>, ResolveError>>,
{
    for chain_id in order {
        match fetch(chain_id.to_string()).await {
            Ok(Some(hit)) => return Some((chain_id.to_string(), hit)),
            Ok(None) => continue,
            Err(e) if e.is_auth() => return None,
            Err(_) => continue,
        }
    }
    None
}

/// Concurrent per-chain fan-out. Branches run independently and a failed
/// branch yields an empty list for that chain only; the aggregate never
/// raises.
pub(crate) async fn fan_out_scan<F, Fut>(
    chain_ids: &[&'static str],
    fetch: F,
) -> Vec<(String, Vec<NormalizedTransaction>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<NormalizedTransaction>, ResolveError>>,
{
    let branches = chain_ids.iter().map(|&chain_id| {
        let branch = fetch(chain_id.to_string());
        async move { (chain_id.to_string(), branch.await.unwrap_or_default()) }
    });
    join_all(branches).await
}

pub(crate) fn sort_by_timestamp_desc(transactions: &mut [NormalizedTransaction]) {
    transactions.sort_by(|a, b| b.block_timestamp.cmp(&a.block_timestamp));
}

fn echo_filters(req: &WalletHistoryRequest) -> HistoryFilters {
    HistoryFilters {
        from: req.from_date.clone(),
        to: req.to_date.clone(),
        direction: req.direction,
        stablecoins_only: req.stablecoins_only,
    }
}
