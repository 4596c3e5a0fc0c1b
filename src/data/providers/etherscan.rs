use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::data::types::{InternalTransfer, NormalizedTransaction};
use crate::data::value::hex_to_dec;
use crate::error::ResolveError;

const V2_BASE_URL: &str = "https://api.etherscan.io/v2/api";

/// Block-explorer adapter over the Etherscan V2 multichain API.
///
/// Two request styles are in play: "account" endpoints return decimal-encoded
/// values and epoch timestamps directly, while "proxy" endpoints tunnel
/// JSON-RPC and return hex quantities that must go through the value codec.
/// The adapter picks the style per operation and normalizes both.
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

/// Envelope for "account" style responses. `status: "0"` covers both genuine
/// empties and real errors; the message text tells them apart.
#[derive(Debug, Deserialize)]
struct AccountEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

/// Envelope for "proxy" style responses. A JSON-RPC error lands in `error`;
/// API-level rejections (bad key, rate limit) still arrive in the account
/// shape with a string `result`.
#[derive(Debug, Deserialize)]
struct ProxyEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
}

/// One row of `module=account&action=txlist`. Values are decimal strings.
#[derive(Debug, Deserialize)]
struct AccountTx {
    #[serde(default)]
    hash: String,
    #[serde(default)]
    nonce: String,
    #[serde(rename = "transactionIndex", default)]
    transaction_index: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    gas: String,
    #[serde(rename = "gasPrice", default)]
    gas_price: String,
    #[serde(default)]
    input: String,
    #[serde(rename = "cumulativeGasUsed", default)]
    cumulative_gas_used: String,
    #[serde(rename = "gasUsed", default)]
    gas_used: String,
    #[serde(rename = "contractAddress", default)]
    contract_address: String,
    #[serde(rename = "txreceipt_status", default)]
    receipt_status: String,
    #[serde(rename = "timeStamp", default)]
    time_stamp: String,
    #[serde(rename = "blockNumber", default)]
    block_number: String,
    #[serde(rename = "blockHash", default)]
    block_hash: String,
}

/// `eth_getTransactionByHash` result via the proxy. All quantities hex.
#[derive(Debug, Deserialize)]
struct ProxyTx {
    hash: String,
    #[serde(default)]
    nonce: String,
    #[serde(rename = "transactionIndex", default)]
    transaction_index: String,
    from: String,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    value: String,
    #[serde(default)]
    gas: String,
    #[serde(rename = "gasPrice", default)]
    gas_price: String,
    #[serde(default)]
    input: String,
    #[serde(rename = "blockNumber", default)]
    block_number: String,
    #[serde(rename = "blockHash", default)]
    block_hash: String,
}

#[derive(Debug, Deserialize)]
struct ProxyReceipt {
    #[serde(rename = "cumulativeGasUsed", default)]
    cumulative_gas_used: String,
    #[serde(rename = "gasUsed", default)]
    gas_used: String,
    #[serde(rename = "contractAddress", default)]
    contract_address: Option<String>,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct ProxyBlock {
    #[serde(default)]
    timestamp: String,
}

impl EtherscanClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn key(&self) -> Result<&str, ResolveError> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ResolveError::MissingApiKey {
                provider: "Etherscan",
            }),
        }
    }

    /// The V2 API addresses chains by decimal id; the rest of the system
    /// speaks hex ids.
    fn url(&self, chain_hex: &str, params: &str) -> Result<String, ResolveError> {
        let key = self.key()?;
        let chain_id =
            u64::from_str_radix(chain_hex.trim_start_matches("0x"), 16).unwrap_or(1);
        Ok(format!(
            "{V2_BASE_URL}?chainid={chain_id}&apikey={key}&{params}"
        ))
    }

    /// Wallet transaction history via the account endpoint.
    pub async fn wallet_transactions(
        &self,
        address: &str,
        chain: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedTransaction>, ResolveError> {
        let url = self.url(
            chain,
            &format!(
                "module=account&action=txlist&address={address}&startblock=0&endblock=99999999&page=1&offset={limit}&sort=desc"
            ),
        )?;

        let envelope: AccountEnvelope = self.http.get(&url).send().await?.json().await?;

        if envelope.status == "0" {
            if envelope.message == "No transactions found" {
                return Ok(Vec::new());
            }
            // A bad key arrives as status "0" with the reason in `result`.
            let reason = envelope
                .result
                .as_str()
                .map(str::to_string)
                .unwrap_or(envelope.message);
            return Err(ResolveError::from_upstream(reason));
        }

        let rows: Vec<AccountTx> = serde_json::from_value(envelope.result).unwrap_or_default();
        Ok(rows.into_iter().map(account_tx_to_normalized).collect())
    }

    /// Single transaction lookup via the proxy endpoints: transaction, then
    /// receipt (fail-soft), then containing block for the timestamp
    /// (fail-soft).
    pub async fn transaction_by_hash(
        &self,
        hash: &str,
        chain: &str,
    ) -> Result<Option<NormalizedTransaction>, ResolveError> {
        let tx_url = self.url(
            chain,
            &format!("module=proxy&action=eth_getTransactionByHash&txhash={hash}"),
        )?;
        let envelope: ProxyEnvelope = self.http.get(&tx_url).send().await?.json().await?;

        if envelope.status.as_deref() == Some("0") {
            if let Some(reason) = envelope.result.as_str() {
                return Err(ResolveError::from_upstream(format!(
                    "Etherscan API Error: {reason}"
                )));
            }
        }
        if let Some(error) = envelope.error {
            return Err(ResolveError::Provider(error.message));
        }
        if envelope.result.is_null() {
            return Ok(None);
        }
        let tx: ProxyTx = serde_json::from_value(envelope.result)?;

        let receipt = self.fetch_receipt(hash, chain).await;
        let timestamp = self.fetch_block_timestamp(&tx.block_number, chain).await;

        Ok(Some(proxy_tx_to_normalized(tx, receipt, timestamp)))
    }

    async fn fetch_receipt(&self, hash: &str, chain: &str) -> Option<ProxyReceipt> {
        let url = self
            .url(
                chain,
                &format!("module=proxy&action=eth_getTransactionReceipt&txhash={hash}"),
            )
            .ok()?;
        let envelope: ProxyEnvelope = self.http.get(&url).send().await.ok()?.json().await.ok()?;
        serde_json::from_value(envelope.result).ok()
    }

    async fn fetch_block_timestamp(&self, block_number: &str, chain: &str) -> DateTime<Utc> {
        let fallback = Utc::now();
        if block_number.is_empty() {
            return fallback;
        }
        let Ok(url) = self.url(
            chain,
            &format!("module=proxy&action=eth_getBlockByNumber&tag={block_number}&boolean=false"),
        ) else {
            return fallback;
        };
        let Ok(response) = self.http.get(&url).send().await else {
            return fallback;
        };
        let Ok(envelope) = response.json::<ProxyEnvelope>().await else {
            return fallback;
        };
        let Ok(block) = serde_json::from_value::<ProxyBlock>(envelope.result) else {
            return fallback;
        };
        parse_hex_timestamp(&block.timestamp).unwrap_or(fallback)
    }

    /// Internal transactions of one hash, often where the actual value
    /// movement of a contract interaction lives. Fail-soft enrichment.
    pub async fn internal_transactions(&self, hash: &str, chain: &str) -> Vec<InternalTransfer> {
        let Ok(url) = self.url(
            chain,
            &format!("module=account&action=txlistinternal&txhash={hash}"),
        ) else {
            return Vec::new();
        };
        let Ok(response) = self.http.get(&url).send().await else {
            return Vec::new();
        };
        let Ok(envelope) = response.json::<AccountEnvelope>().await else {
            return Vec::new();
        };
        // Status "0" + "No transactions found" is a valid empty, anything
        // else on status "0" is an error this enrichment swallows.
        if envelope.status == "1" {
            serde_json::from_value(envelope.result).unwrap_or_default()
        } else {
            Vec::new()
        }
    }
}

fn account_tx_to_normalized(tx: AccountTx) -> NormalizedTransaction {
    let timestamp = tx
        .time_stamp
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    NormalizedTransaction {
        hash: tx.hash,
        nonce: tx.nonce,
        transaction_index: tx.transaction_index,
        from_address: tx.from,
        to_address: (!tx.to.is_empty()).then_some(tx.to),
        value: tx.value,
        gas: tx.gas,
        gas_price: tx.gas_price,
        input: tx.input,
        receipt_cumulative_gas_used: tx.cumulative_gas_used,
        receipt_gas_used: tx.gas_used,
        receipt_contract_address: (!tx.contract_address.is_empty())
            .then_some(tx.contract_address),
        receipt_status: if tx.receipt_status.is_empty() {
            "1".to_string()
        } else {
            tx.receipt_status
        },
        block_timestamp: timestamp,
        block_number: tx.block_number,
        block_hash: tx.block_hash,
        erc20_transfers: None,
        nft_transfers: None,
        internal_transfers: None,
        token_symbol: None,
        token_name: None,
        token_decimals: None,
        provider: None,
        detected_chain: None,
        native_price: None,
    }
}

fn proxy_tx_to_normalized(
    tx: ProxyTx,
    receipt: Option<ProxyReceipt>,
    timestamp: DateTime<Utc>,
) -> NormalizedTransaction {
    NormalizedTransaction {
        hash: tx.hash,
        nonce: hex_to_dec(&tx.nonce),
        transaction_index: hex_to_dec(&tx.transaction_index),
        from_address: tx.from,
        to_address: tx.to,
        value: hex_to_dec(&tx.value),
        gas: hex_to_dec(&tx.gas),
        gas_price: hex_to_dec(&tx.gas_price),
        input: tx.input,
        receipt_cumulative_gas_used: receipt
            .as_ref()
            .map(|r| hex_to_dec(&r.cumulative_gas_used))
            .unwrap_or_else(|| "0".to_string()),
        receipt_gas_used: receipt
            .as_ref()
            .map(|r| hex_to_dec(&r.gas_used))
            .unwrap_or_else(|| "0".to_string()),
        receipt_contract_address: receipt.as_ref().and_then(|r| r.contract_address.clone()),
        receipt_status: receipt
            .as_ref()
            .map(|r| hex_to_dec(&r.status))
            .unwrap_or_else(|| "1".to_string()),
        block_timestamp: timestamp,
        block_number: hex_to_dec(&tx.block_number),
        block_hash: tx.block_hash,
        erc20_transfers: None,
        nft_transfers: None,
        internal_transfers: None,
        token_symbol: None,
        token_name: None,
        token_decimals: None,
        provider: None,
        detected_chain: None,
        native_price: None,
    }
}

fn parse_hex_timestamp(hex: &str) -> Option<DateTime<Utc>> {
    let secs = i64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()?;
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key() {
        let client = EtherscanClient::new(None);
        assert!(matches!(
            client.key(),
            Err(ResolveError::MissingApiKey { provider: "Etherscan" })
        ));
    }

    #[test]
    fn test_url_converts_hex_chain_to_decimal() {
        let client = EtherscanClient::new(Some("KEY".to_string()));
        let url = client.url("0x89", "module=account").unwrap();
        assert!(url.contains("chainid=137"));
        assert!(url.contains("apikey=KEY"));
    }

    #[test]
    fn test_account_row_maps_to_normalized() {
        let row: AccountTx = serde_json::from_str(
            r#"{
                "hash": "0xabc",
                "nonce": "7",
                "transactionIndex": "3",
                "from": "0xfrom",
                "to": "0xto",
                "value": "1000000000000000000",
                "gas": "21000",
                "gasPrice": "25000000000",
                "input": "0x",
                "cumulativeGasUsed": "500000",
                "gasUsed": "21000",
                "contractAddress": "",
                "txreceipt_status": "1",
                "timeStamp": "1700000000",
                "blockNumber": "18500000",
                "blockHash": "0xblock"
            }"#,
        )
        .unwrap();

        let tx = account_tx_to_normalized(row);
        // Account endpoints already return decimal values.
        assert_eq!(tx.value, "1000000000000000000");
        assert_eq!(tx.to_address.as_deref(), Some("0xto"));
        assert!(tx.receipt_contract_address.is_none());
        assert_eq!(tx.block_timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_contract_creation_has_no_recipient() {
        let row: AccountTx = serde_json::from_str(
            r#"{"hash": "0x1", "from": "0xdeployer", "to": "", "contractAddress": "0xnew", "timeStamp": "1700000000"}"#,
        )
        .unwrap();
        let tx = account_tx_to_normalized(row);
        assert!(tx.to_address.is_none());
        assert_eq!(tx.receipt_contract_address.as_deref(), Some("0xnew"));
    }

    #[test]
    fn test_proxy_row_converts_hex_values() {
        let tx: ProxyTx = serde_json::from_str(
            r#"{
                "hash": "0xabc",
                "nonce": "0x7",
                "transactionIndex": "0x3",
                "from": "0xfrom",
                "to": "0xto",
                "value": "0xde0b6b3a7640000",
                "gas": "0x5208",
                "gasPrice": "0x5d21dba00",
                "input": "0x",
                "blockNumber": "0x11a3b00",
                "blockHash": "0xblock"
            }"#,
        )
        .unwrap();
        let receipt = ProxyReceipt {
            cumulative_gas_used: "0x7a120".to_string(),
            gas_used: "0x5208".to_string(),
            contract_address: None,
            status: "0x1".to_string(),
        };
        let normalized =
            proxy_tx_to_normalized(tx, Some(receipt), DateTime::from_timestamp(0, 0).unwrap());

        assert_eq!(normalized.value, "1000000000000000000");
        assert_eq!(normalized.nonce, "7");
        assert_eq!(normalized.gas, "21000");
        assert_eq!(normalized.receipt_gas_used, "21000");
        assert_eq!(normalized.receipt_status, "1");
        assert_eq!(normalized.block_number, "18496256");
    }

    #[test]
    fn test_missing_receipt_assumes_success() {
        let tx: ProxyTx = serde_json::from_str(
            r#"{"hash": "0x1", "from": "0xa", "value": "0x0"}"#,
        )
        .unwrap();
        let normalized = proxy_tx_to_normalized(tx, None, Utc::now());
        assert_eq!(normalized.receipt_status, "1");
        assert_eq!(normalized.receipt_gas_used, "0");
    }

    #[test]
    fn test_account_envelope_distinguishes_empty_from_error() {
        let empty: AccountEnvelope = serde_json::from_str(
            r#"{"status": "0", "message": "No transactions found", "result": []}"#,
        )
        .unwrap();
        assert_eq!(empty.message, "No transactions found");

        let auth: AccountEnvelope = serde_json::from_str(
            r#"{"status": "0", "message": "NOTOK", "result": "Invalid API Key"}"#,
        )
        .unwrap();
        let reason = auth.result.as_str().unwrap();
        assert!(ResolveError::from_upstream(reason).is_auth());
    }

    #[test]
    fn test_parse_hex_timestamp() {
        let ts = parse_hex_timestamp("0x65579a00").unwrap();
        assert_eq!(ts.timestamp(), 0x65579a00);
        assert!(parse_hex_timestamp("junk").is_none());
    }
}
