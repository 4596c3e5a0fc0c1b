use std::time::Duration;

use serde::Deserialize;

use crate::data::types::{NftTransfer, NormalizedTransaction, TokenTransfer};
use crate::error::ResolveError;

const BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";

/// Records fetched per page during cursor pagination.
const PAGE_SIZE: usize = 100;

/// Safety ceiling on auto-pagination, bounding worst-case latency and memory
/// for deep-history requests.
const HARD_LIMIT: usize = 2000;

/// Hosted-indexer adapter. The richest of the three sources: pre-enriched
/// transactions, ERC-20/NFT transfer listings, and spot prices.
#[derive(Debug, Clone)]
pub struct MoralisClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct PriceBody {
    #[serde(rename = "usdPrice", default)]
    usd_price: f64,
}

impl MoralisClient {
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
            _ => Err(ResolveError::MissingApiKey { provider: "Moralis" }),
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ResolveError> {
        let response = self
            .http
            .get(url)
            .header("accept", "application/json")
            .header("X-API-Key", self.key()?)
            .send()
            .await?;
        Ok(response)
    }

    /// Read the upstream error message from a failed response, classifying
    /// credential problems as Auth.
    async fn upstream_error(response: reqwest::Response) -> ResolveError {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) if !body.message.is_empty() => body.message,
            _ => format!("request rejected with status {status}"),
        };
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ResolveError::Auth(message);
        }
        ResolveError::from_upstream(message)
    }

    /// Wallet transaction history with date filtering and auto-pagination.
    ///
    /// Pages of 100 are fetched until the requested limit, the end of
    /// history, or the hard ceiling is reached. A page failure after at
    /// least one successful page returns the partial accumulation; a failure
    /// on the very first page propagates.
    pub async fn wallet_transactions(
        &self,
        address: &str,
        chain: &str,
        limit: usize,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Result<Vec<NormalizedTransaction>, ResolveError> {
        self.key()?;

        let target = limit.min(HARD_LIMIT);
        let mut all: Vec<NormalizedTransaction> = Vec::new();
        let mut cursor: Option<String> = None;

        while all.len() < target {
            let mut url = format!(
                "{BASE_URL}/{address}?chain={chain}&limit={PAGE_SIZE}&order=DESC"
            );
            if let Some(c) = &cursor {
                url.push_str(&format!("&cursor={c}"));
            }
            if let Some(from) = from_date {
                url.push_str(&format!("&from_date={from}"));
            }
            if let Some(to) = to_date {
                url.push_str(&format!("&to_date={to}"));
            }

            let response = match self.get(&url).await {
                Ok(r) => r,
                Err(e) if all.is_empty() => return Err(e),
                Err(_) => break,
            };
            if !response.status().is_success() {
                if all.is_empty() {
                    return Err(Self::upstream_error(response).await);
                }
                break;
            }

            let page: Page<NormalizedTransaction> = match response.json().await {
                Ok(p) => p,
                Err(_) if !all.is_empty() => break,
                Err(e) => return Err(e.into()),
            };

            let exhausted = page.cursor.is_none();
            for mut tx in page.result {
                // Native rows carry the native asset at 18 decimals.
                tx.token_symbol = Some("Native".to_string());
                tx.token_decimals = Some("18".to_string());
                all.push(tx);
            }
            cursor = page.cursor;

            if exhausted {
                break;
            }
        }

        all.truncate(limit);
        Ok(all)
    }

    pub async fn token_transfers(
        &self,
        address: &str,
        chain: &str,
        limit: usize,
    ) -> Result<Vec<TokenTransfer>, ResolveError> {
        let url = format!("{BASE_URL}/{address}/erc20/transfers?chain={chain}&limit={limit}");
        let response = self.get(&url).await?;
        if !response.status().is_success() {
            return Err(Self::upstream_error(response).await);
        }
        let page: Page<TokenTransfer> = response.json().await?;
        Ok(page.result)
    }

    /// Look up a single transaction. Ok(None) means the hash is unknown on
    /// this chain, which during a multi-chain search simply means "keep
    /// looking".
    pub async fn transaction_by_hash(
        &self,
        hash: &str,
        chain: &str,
    ) -> Result<Option<NormalizedTransaction>, ResolveError> {
        let url = format!("{BASE_URL}/transaction/{hash}?chain={chain}");
        let response = self.get(&url).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::upstream_error(response).await);
        }
        let tx: NormalizedTransaction = response.json().await?;
        Ok(Some(tx))
    }

    /// ERC-20 transfers inside one transaction. Fail-soft enrichment: any
    /// failure yields an empty list.
    pub async fn transaction_token_transfers(&self, hash: &str, chain: &str) -> Vec<TokenTransfer> {
        let url = format!("{BASE_URL}/transaction/{hash}/erc20/transfers?chain={chain}");
        self.fetch_list(&url).await
    }

    /// NFT transfers inside one transaction. Fail-soft.
    pub async fn transaction_nft_transfers(&self, hash: &str, chain: &str) -> Vec<NftTransfer> {
        let url = format!("{BASE_URL}/transaction/{hash}/nft/transfers?chain={chain}");
        self.fetch_list(&url).await
    }

    async fn fetch_list<T: serde::de::DeserializeOwned>(&self, url: &str) -> Vec<T> {
        let Ok(response) = self.get(url).await else {
            return Vec::new();
        };
        if !response.status().is_success() {
            return Vec::new();
        }
        match response.json::<Page<T>>().await {
            Ok(page) => page.result,
            Err(_) => Vec::new(),
        }
    }

    /// Spot USD price of an ERC-20 contract. Fail-soft: 0.0 on any failure,
    /// price is an enhancement and never a precondition.
    pub async fn token_price(&self, contract: &str, chain: &str) -> f64 {
        if !self.has_key() {
            return 0.0;
        }
        let url = format!("{BASE_URL}/erc20/{contract}/price?chain={chain}");
        let Ok(response) = self.get(&url).await else {
            return 0.0;
        };
        if !response.status().is_success() {
            return 0.0;
        }
        match response.json::<PriceBody>().await {
            Ok(body) => body.usd_price,
            Err(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_configuration_error() {
        let client = MoralisClient::new(None);
        assert!(!client.has_key());
        assert!(matches!(
            client.key(),
            Err(ResolveError::MissingApiKey { provider: "Moralis" })
        ));

        let client = MoralisClient::new(Some(String::new()));
        assert!(!client.has_key());
    }

    #[test]
    fn test_page_deserializes_with_and_without_cursor() {
        let json = r#"{"result": [], "cursor": "abc"}"#;
        let page: Page<TokenTransfer> = serde_json::from_str(json).unwrap();
        assert_eq!(page.cursor.as_deref(), Some("abc"));

        let json = r#"{"result": []}"#;
        let page: Page<TokenTransfer> = serde_json::from_str(json).unwrap();
        assert!(page.cursor.is_none());
    }

    #[test]
    fn test_wallet_page_row_deserializes() {
        let json = r#"{
            "result": [{
                "hash": "0xabc",
                "nonce": "4",
                "transaction_index": "12",
                "from_address": "0xfrom",
                "to_address": "0xto",
                "value": "1000000000000000000",
                "gas": "21000",
                "gas_price": "30000000000",
                "input": "0x",
                "receipt_cumulative_gas_used": "100000",
                "receipt_gas_used": "21000",
                "receipt_contract_address": null,
                "receipt_status": "1",
                "block_timestamp": "2024-05-01T12:00:00.000Z",
                "block_number": "19780000",
                "block_hash": "0xblock"
            }],
            "cursor": null
        }"#;
        let page: Page<NormalizedTransaction> = serde_json::from_str(json).unwrap();
        assert_eq!(page.result.len(), 1);
        assert_eq!(page.result[0].value, "1000000000000000000");
        assert_eq!(page.result[0].block_number, "19780000");
    }

    #[test]
    fn test_price_body_defaults_to_zero() {
        let body: PriceBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.usd_price, 0.0);
        let body: PriceBody = serde_json::from_str(r#"{"usdPrice": 3021.77}"#).unwrap();
        assert_eq!(body.usd_price, 3021.77);
    }
}
