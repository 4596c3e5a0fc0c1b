use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::providers::ProviderKind;

fn zero() -> String {
    "0".to_string()
}

fn one() -> String {
    "1".to_string()
}

fn empty_input() -> String {
    "0x".to_string()
}

fn default_decimals() -> String {
    "18".to_string()
}

/// A transaction in the canonical shape shared by every provider adapter.
///
/// All monetary fields (`value`, gas fields, transfer values) are decimal
/// integer strings in base units. EVM quantities routinely exceed 2^53, so
/// nothing here is ever represented as a float.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub hash: String,
    #[serde(default = "zero")]
    pub nonce: String,
    #[serde(default = "zero")]
    pub transaction_index: String,
    pub from_address: String,
    /// None for contract creation.
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default = "zero")]
    pub value: String,
    #[serde(default = "zero")]
    pub gas: String,
    #[serde(default = "zero")]
    pub gas_price: String,
    #[serde(default = "empty_input")]
    pub input: String,
    #[serde(default = "zero")]
    pub receipt_cumulative_gas_used: String,
    #[serde(default = "zero")]
    pub receipt_gas_used: String,
    #[serde(default)]
    pub receipt_contract_address: Option<String>,
    /// "1" success, "0" failure. Assumed "1" when the receipt is unavailable.
    #[serde(default = "one")]
    pub receipt_status: String,
    pub block_timestamp: DateTime<Utc>,
    #[serde(default = "zero")]
    pub block_number: String,
    #[serde(default)]
    pub block_hash: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erc20_transfers: Option<Vec<TokenTransfer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nft_transfers: Option<Vec<NftTransfer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_transfers: Option<Vec<InternalTransfer>>,

    // Display fields. For native rows these are "Native"/18; the merge engine
    // overwrites them when it promotes a token transfer's value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_decimals: Option<String>,

    // Provenance, filled in by the resolver.
    #[serde(rename = "_provider", default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(
        rename = "_detected_chain",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub detected_chain: Option<String>,
    #[serde(
        rename = "_nativePrice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub native_price: Option<f64>,
}

impl NormalizedTransaction {
    /// A minimal pseudo-transaction derived from a token transfer whose hash
    /// was absent from the native list. Everything not derivable from the
    /// transfer defaults to zero/empty; receipt status is assumed successful.
    pub fn from_token_transfer(transfer: &TokenTransfer) -> Self {
        Self {
            hash: transfer.transaction_hash.clone().unwrap_or_default(),
            nonce: zero(),
            transaction_index: zero(),
            from_address: transfer.from_address.clone(),
            to_address: Some(transfer.to_address.clone()),
            value: transfer.value.clone(),
            gas: zero(),
            gas_price: zero(),
            input: empty_input(),
            receipt_cumulative_gas_used: zero(),
            receipt_gas_used: zero(),
            receipt_contract_address: None,
            receipt_status: one(),
            block_timestamp: transfer.block_timestamp.unwrap_or_else(Utc::now),
            block_number: transfer.block_number.clone().unwrap_or_else(zero),
            block_hash: transfer.block_hash.clone().unwrap_or_default(),
            erc20_transfers: Some(vec![transfer.clone()]),
            nft_transfers: None,
            internal_transfers: None,
            token_symbol: transfer.token_symbol.clone(),
            token_name: transfer.token_name.clone(),
            token_decimals: Some(transfer.token_decimals.clone()),
            provider: None,
            detected_chain: None,
            native_price: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.receipt_status == "1"
    }
}

/// An ERC-20 style value movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    /// Token contract address.
    pub address: String,
    pub from_address: String,
    pub to_address: String,
    #[serde(default = "zero")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default = "default_decimals")]
    pub token_decimals: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
}

/// The closed set of NFT contract standards the decoder recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStandard {
    #[serde(rename = "ERC721")]
    Erc721,
    #[serde(rename = "ERC1155")]
    Erc1155,
}

impl std::fmt::Display for ContractStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractStandard::Erc721 => write!(f, "ERC721"),
            ContractStandard::Erc1155 => write!(f, "ERC1155"),
        }
    }
}

/// An ERC-721/1155 style token movement. Token ids can exceed 64 bits, so the
/// id is a decimal string like every other big integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftTransfer {
    pub token_address: String,
    pub token_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    /// "1" for a plain ERC-721 transfer.
    #[serde(default = "one")]
    pub amount: String,
    pub contract_type: ContractStandard,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
}

/// A value movement executed inside a contract call, as reported by the block
/// explorer's internal-transaction endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalTransfer {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default = "zero")]
    pub value: String,
    #[serde(rename = "contractAddress", default)]
    pub contract_address: String,
    #[serde(rename = "type", default)]
    pub call_type: String,
    #[serde(default = "zero")]
    pub gas: String,
    #[serde(rename = "gasUsed", default = "zero")]
    pub gas_used: String,
    #[serde(rename = "isError", default = "zero")]
    pub is_error: String,
}

/// Direction filter, echoed to the consumer and applied by the presentation
/// layer, never inside the resolver.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    All,
    In,
    Out,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::All => write!(f, "all"),
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// Filter parameters echoed back with a wallet-history result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub direction: Direction,
    #[serde(rename = "stablecoinsOnly")]
    pub stablecoins_only: bool,
}

#[derive(Debug, Clone)]
pub struct WalletHistoryRequest {
    pub address: String,
    /// Chain alias/id, or "all" to fan out over the scan list. None = Ethereum.
    pub chain: Option<String>,
    pub limit: usize,
    /// "YYYY-MM-DD", passed through to providers that support date windows.
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub direction: Direction,
    pub stablecoins_only: bool,
    pub provider: ProviderKind,
}

#[derive(Debug, Clone)]
pub struct TokenTransfersRequest {
    pub address: String,
    pub chain: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct TransactionLookupRequest {
    pub hash: String,
    pub chain: Option<String>,
    pub provider: ProviderKind,
}

/// Wallet-history result: the merged transaction list plus the aggregate
/// metadata the original wire format carried as underscore-prefixed keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletHistoryResult {
    pub transactions: Vec<NormalizedTransaction>,
    /// Display name of the searched chain, or "Multi-Chain".
    #[serde(rename = "_chain")]
    pub chain: String,
    #[serde(rename = "_searchedAddress")]
    pub searched_address: String,
    /// Native spot price per chain display name, for every chain that
    /// appears in `transactions`.
    #[serde(rename = "_priceMap")]
    pub price_map: HashMap<String, f64>,
    #[serde(
        rename = "_nativePrice",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub native_price: Option<f64>,
    #[serde(rename = "_filters", default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<HistoryFilters>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTransfersResult {
    pub transfers: Vec<TokenTransfer>,
    #[serde(rename = "_chain")]
    pub chain: String,
    #[serde(rename = "_searchedAddress")]
    pub searched_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleTransactionResult {
    #[serde(flatten)]
    pub transaction: NormalizedTransaction,
    #[serde(rename = "_searchedAddress")]
    pub searched_address: String,
    /// Spot price of the primary token involved, when a token transfer is
    /// present and the price lookup succeeded.
    #[serde(rename = "_tokenPrice", default, skip_serializing_if = "Option::is_none")]
    pub token_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transfer() -> TokenTransfer {
        TokenTransfer {
            transaction_hash: Some("0xabc".to_string()),
            address: "0x01".to_string(),
            from_address: "0x02".to_string(),
            to_address: "0x03".to_string(),
            value: "5000".to_string(),
            token_name: Some("Tether USD".to_string()),
            token_symbol: Some("USDT".to_string()),
            token_decimals: "6".to_string(),
            block_timestamp: Some("2024-03-01T00:00:00Z".parse().unwrap()),
            block_number: Some("19000000".to_string()),
            block_hash: Some("0xbeef".to_string()),
        }
    }

    #[test]
    fn test_pseudo_transaction_carries_transfer_fields() {
        let transfer = sample_transfer();
        let tx = NormalizedTransaction::from_token_transfer(&transfer);

        assert_eq!(tx.hash, "0xabc");
        assert_eq!(tx.value, "5000");
        assert_eq!(tx.token_symbol.as_deref(), Some("USDT"));
        assert_eq!(tx.token_decimals.as_deref(), Some("6"));
        assert_eq!(tx.receipt_status, "1");
        assert_eq!(tx.gas, "0");
        assert_eq!(tx.block_number, "19000000");
        // The transfer rides along so a later merge pass finds it attached.
        assert_eq!(tx.erc20_transfers.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_provenance_keys_serialize_with_underscore_names() {
        let mut tx = NormalizedTransaction::from_token_transfer(&sample_transfer());
        tx.provider = Some("moralis".to_string());
        tx.detected_chain = Some("Polygon".to_string());
        tx.native_price = Some(0.72);

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["_provider"], "moralis");
        assert_eq!(json["_detected_chain"], "Polygon");
        assert_eq!(json["_nativePrice"], 0.72);
    }

    #[test]
    fn test_transaction_deserializes_with_missing_optionals() {
        let json = r#"{
            "hash": "0x1",
            "from_address": "0x2",
            "to_address": null,
            "value": "0",
            "block_timestamp": "2024-01-01T00:00:00.000Z"
        }"#;
        let tx: NormalizedTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.nonce, "0");
        assert_eq!(tx.receipt_status, "1");
        assert_eq!(tx.input, "0x");
        assert!(tx.to_address.is_none());
        assert!(tx.erc20_transfers.is_none());
    }

    #[test]
    fn test_contract_standard_serde_names() {
        assert_eq!(
            serde_json::to_string(&ContractStandard::Erc721).unwrap(),
            "\"ERC721\""
        );
        assert_eq!(
            serde_json::to_string(&ContractStandard::Erc1155).unwrap(),
            "\"ERC1155\""
        );
    }

    #[test]
    fn test_history_filters_echo_shape() {
        let filters = HistoryFilters {
            from: Some("2024-01-01".to_string()),
            to: None,
            direction: Direction::Out,
            stablecoins_only: true,
        };
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["direction"], "out");
        assert_eq!(json["stablecoinsOnly"], true);
    }
}
