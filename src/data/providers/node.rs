use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::{Transaction as ConsensusTransaction, TxReceipt};
use alloy::primitives::{Address, B256, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{
    BlockNumberOrTag, Transaction, TransactionInput, TransactionReceipt, TransactionRequest,
};
use chrono::{DateTime, Utc};

use crate::data::chains::ChainRegistry;
use crate::data::decoder::{self, TokenMetadata, TokenMetadataSource};
use crate::data::types::NormalizedTransaction;

/// Upper bound on any single RPC call. A timed-out endpoint is
/// indistinguishable from one that has no answer; either way the next
/// endpoint is tried.
const RPC_TIMEOUT: Duration = Duration::from_secs(6);

/// 4-byte selector of `symbol()`.
const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
/// 4-byte selector of `decimals()`.
const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

const PROVIDER_LABEL: &str = "Public RPC";

/// Direct-node adapter: the rawest and most authoritative source. Nodes
/// return no enriched transfer data, so every hit is post-processed by the
/// log decoder against the receipt.
pub struct NodeClient {
    registry: Arc<ChainRegistry>,
}

/// One connected public endpoint. Doubles as the decoder's metadata source,
/// since `eth_call` goes to the same node that served the receipt.
struct Endpoint {
    provider: Box<dyn Provider + Send + Sync>,
}

impl Endpoint {
    fn connect(rpc_url: &str) -> Option<Self> {
        let url = rpc_url.parse().ok()?;
        let provider = ProviderBuilder::new().on_http(url);
        Some(Self {
            provider: Box::new(provider),
        })
    }

    async fn transaction(&self, hash: B256) -> Option<Transaction> {
        tokio::time::timeout(RPC_TIMEOUT, self.provider.get_transaction_by_hash(hash))
            .await
            .ok()?
            .ok()?
    }

    async fn receipt(&self, hash: B256) -> Option<TransactionReceipt> {
        tokio::time::timeout(RPC_TIMEOUT, self.provider.get_transaction_receipt(hash))
            .await
            .ok()?
            .ok()?
    }

    async fn block_timestamp(&self, number: u64) -> Option<DateTime<Utc>> {
        let block = tokio::time::timeout(
            RPC_TIMEOUT,
            self.provider
                .get_block_by_number(BlockNumberOrTag::Number(number)),
        )
        .await
        .ok()?
        .ok()??;
        DateTime::from_timestamp(block.header.timestamp as i64, 0)
    }

    async fn read_call(&self, to: Address, selector: [u8; 4]) -> Option<Bytes> {
        let req = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(Bytes::from(selector.to_vec())));
        tokio::time::timeout(RPC_TIMEOUT, self.provider.call(req))
            .await
            .ok()?
            .ok()
    }
}

impl TokenMetadataSource for Endpoint {
    async fn token_metadata(&self, contract: Address) -> TokenMetadata {
        let (symbol_out, decimals_out) = tokio::join!(
            self.read_call(contract, SYMBOL_SELECTOR),
            self.read_call(contract, DECIMALS_SELECTOR),
        );

        let mut meta = TokenMetadata::default();
        if let Some(symbol) = symbol_out
            .as_deref()
            .and_then(|b| decoder::decode_symbol(b.as_ref()))
        {
            meta.symbol = symbol;
        }
        if let Some(decimals) = decimals_out
            .as_deref()
            .and_then(|b| decoder::decode_decimals(b.as_ref()))
        {
            meta.decimals = decimals;
        }
        meta
    }
}

impl NodeClient {
    pub fn new(registry: Arc<ChainRegistry>) -> Self {
        Self { registry }
    }

    /// Try to resolve a hash on one chain, walking its endpoints in priority
    /// order. "Not found at this endpoint" means try the next one, not
    /// failure; None means no endpoint of this chain knows the hash.
    pub async fn transaction(&self, hash: &str, chain_id: &str) -> Option<NormalizedTransaction> {
        let parsed: B256 = hash.parse().ok()?;

        for rpc_url in self.registry.endpoints(chain_id) {
            let Some(endpoint) = Endpoint::connect(rpc_url) else {
                continue;
            };
            let Some(tx) = endpoint.transaction(parsed).await else {
                continue;
            };

            let receipt = endpoint.receipt(parsed).await;
            let timestamp = match tx.block_number {
                Some(number) => endpoint
                    .block_timestamp(number)
                    .await
                    .unwrap_or_else(Utc::now),
                None => Utc::now(),
            };

            let (erc20, nft) = match &receipt {
                Some(r) => decoder::decode_transfers(&endpoint, r.inner.logs()).await,
                None => (Vec::new(), Vec::new()),
            };

            return Some(self.normalize(tx, receipt, timestamp, erc20, nft, chain_id));
        }
        None
    }

    /// Deep search: walk the registry's chain priority order until a chain
    /// answers. Returns the chain id that hit alongside the transaction.
    pub async fn find_transaction(&self, hash: &str) -> Option<(String, NormalizedTransaction)> {
        for chain_id in self.registry.search_order() {
            if self.registry.endpoints(chain_id).is_empty() {
                continue;
            }
            if let Some(tx) = self.transaction(hash, chain_id).await {
                return Some((chain_id.to_string(), tx));
            }
        }
        None
    }

    fn normalize(
        &self,
        tx: Transaction,
        receipt: Option<TransactionReceipt>,
        timestamp: DateTime<Utc>,
        erc20: Vec<crate::data::types::TokenTransfer>,
        nft: Vec<crate::data::types::NftTransfer>,
        chain_id: &str,
    ) -> NormalizedTransaction {
        NormalizedTransaction {
            hash: format!("{:#x}", tx.inner.tx_hash()),
            nonce: tx.inner.nonce().to_string(),
            transaction_index: tx
                .transaction_index
                .map(|i| i.to_string())
                .unwrap_or_else(|| "0".to_string()),
            from_address: format!("{:#x}", tx.inner.signer()),
            to_address: tx.inner.to().map(|a| format!("{a:#x}")),
            value: tx.inner.value().to_string(),
            gas: tx.inner.gas_limit().to_string(),
            gas_price: tx
                .inner
                .gas_price()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "0".to_string()),
            input: format!("0x{}", alloy::primitives::hex::encode(tx.inner.input())),
            receipt_cumulative_gas_used: receipt
                .as_ref()
                .map(|r| r.inner.cumulative_gas_used().to_string())
                .unwrap_or_else(|| "0".to_string()),
            receipt_gas_used: receipt
                .as_ref()
                .map(|r| r.gas_used.to_string())
                .unwrap_or_else(|| "0".to_string()),
            receipt_contract_address: receipt
                .as_ref()
                .and_then(|r| r.contract_address)
                .map(|a| format!("{a:#x}")),
            receipt_status: match &receipt {
                Some(r) if !r.status() => "0".to_string(),
                _ => "1".to_string(),
            },
            block_timestamp: timestamp,
            block_number: tx
                .block_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "0".to_string()),
            block_hash: tx
                .block_hash
                .map(|h| format!("{h:#x}"))
                .unwrap_or_default(),
            erc20_transfers: Some(erc20),
            nft_transfers: Some(nft),
            internal_transfers: None,
            token_symbol: None,
            token_name: None,
            token_decimals: None,
            provider: Some(PROVIDER_LABEL.to_string()),
            detected_chain: Some(self.registry.display_name(chain_id)),
            native_price: None,
        }
    }
}
