use std::collections::HashMap;

use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;

use crate::data::types::{ContractStandard, NftTransfer, TokenTransfer};

/// The keccak256 hash of `Transfer(address,address,uint256)`.
/// Shared by ERC-20 (2 indexed args) and ERC-721 (3 indexed args) transfers;
/// the topic count tells them apart.
pub const TRANSFER_EVENT_TOPIC: B256 = {
    // 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef
    B256::new([
        0xdd, 0xf2, 0x52, 0xad, 0x1b, 0xe2, 0xc8, 0x9b, 0x69, 0xc2, 0xb0, 0x68, 0xfc, 0x37,
        0x8d, 0xaa, 0x95, 0x2b, 0xa7, 0xf1, 0x63, 0xc4, 0xa1, 0x16, 0x28, 0xf5, 0x5a, 0x4d,
        0xf5, 0x23, 0xb3, 0xef,
    ])
};

/// The keccak256 hash of `TransferSingle(address,address,address,uint256,uint256)`.
pub const ERC1155_SINGLE_TOPIC: B256 = {
    // 0xc3d58168c5ae7397731d063d5bbf3d657854427343f4c083240f7aacaa2d0f62
    B256::new([
        0xc3, 0xd5, 0x81, 0x68, 0xc5, 0xae, 0x73, 0x97, 0x73, 0x1d, 0x06, 0x3d, 0x5b, 0xbf,
        0x3d, 0x65, 0x78, 0x54, 0x42, 0x73, 0x43, 0xf4, 0xc0, 0x83, 0x24, 0x0f, 0x7a, 0xac,
        0xaa, 0x2d, 0x0f, 0x62,
    ])
};

/// Symbol and decimal count of a token contract, as resolved through
/// read-only contract calls. Defaults stand in whenever resolution fails:
/// pricing and display degrade, decoding never does.
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub symbol: String,
    pub decimals: String,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            symbol: "Unknown".to_string(),
            decimals: "18".to_string(),
        }
    }
}

/// On-demand token-metadata lookup. Implemented by the direct-node endpoint
/// via `eth_call`; infallible by contract so a dead contract can never abort
/// a decode pass.
pub trait TokenMetadataSource {
    fn token_metadata(
        &self,
        contract: Address,
    ) -> impl std::future::Future<Output = TokenMetadata> + Send;
}

/// A structurally recognized transfer log, before metadata enrichment.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTransfer {
    Fungible {
        contract: Address,
        from: Address,
        to: Address,
        value: U256,
    },
    Nft721 {
        contract: Address,
        from: Address,
        to: Address,
        token_id: U256,
    },
    Nft1155 {
        contract: Address,
        from: Address,
        to: Address,
        token_id: U256,
        amount: U256,
    },
}

/// Match one raw log against the known transfer signatures.
///
/// Returns None for anything unrecognized or malformed; best-effort skipping
/// is the policy, a corrupt log never aborts the pass.
pub fn classify_log(log: &Log) -> Option<RawTransfer> {
    let topics = log.inner.data.topics();
    let data = log.inner.data.data.as_ref();
    if topics.is_empty() {
        return None;
    }
    let contract = log.inner.address;

    if topics[0] == TRANSFER_EVENT_TOPIC && topics.len() == 3 {
        // ERC-20: Transfer(from indexed, to indexed, value); the value
        // rides in the data payload.
        let value = if data.len() >= 32 {
            U256::from_be_slice(&data[..32])
        } else {
            U256::ZERO
        };
        return Some(RawTransfer::Fungible {
            contract,
            from: topic_address(&topics[1]),
            to: topic_address(&topics[2]),
            value,
        });
    }

    if topics[0] == TRANSFER_EVENT_TOPIC && topics.len() == 4 {
        // ERC-721: the third indexed argument is the token id, never
        // truncated to a machine word.
        return Some(RawTransfer::Nft721 {
            contract,
            from: topic_address(&topics[1]),
            to: topic_address(&topics[2]),
            token_id: U256::from_be_slice(topics[3].as_slice()),
        });
    }

    if topics[0] == ERC1155_SINGLE_TOPIC && topics.len() == 4 {
        // TransferSingle(operator indexed, from indexed, to indexed, id, value).
        // The operator is ignored; data carries id then quantity.
        if data.len() < 64 {
            return None;
        }
        return Some(RawTransfer::Nft1155 {
            contract,
            from: topic_address(&topics[2]),
            to: topic_address(&topics[3]),
            token_id: U256::from_be_slice(&data[..32]),
            amount: U256::from_be_slice(&data[32..64]),
        });
    }

    None
}

/// Reconstruct token and NFT transfers from a receipt's raw logs.
///
/// Token metadata is fetched lazily per contract and memoized for the
/// duration of this single pass, so a contract appearing in many logs of one
/// receipt costs one lookup. Output preserves log order.
pub async fn decode_transfers(
    source: &impl TokenMetadataSource,
    logs: &[Log],
) -> (Vec<TokenTransfer>, Vec<NftTransfer>) {
    let mut erc20 = Vec::new();
    let mut nft = Vec::new();
    let mut memo: HashMap<Address, TokenMetadata> = HashMap::new();

    for log in logs {
        let Some(raw) = classify_log(log) else {
            continue;
        };
        match raw {
            RawTransfer::Fungible {
                contract,
                from,
                to,
                value,
            } => {
                let meta = metadata_for(source, &mut memo, contract).await;
                erc20.push(TokenTransfer {
                    transaction_hash: None,
                    address: format!("{contract:#x}"),
                    from_address: format!("{from:#x}"),
                    to_address: format!("{to:#x}"),
                    value: value.to_string(),
                    token_name: Some(meta.symbol.clone()),
                    token_symbol: Some(meta.symbol),
                    token_decimals: meta.decimals,
                    block_timestamp: None,
                    block_number: None,
                    block_hash: None,
                });
            }
            RawTransfer::Nft721 {
                contract,
                from,
                to,
                token_id,
            } => {
                let meta = metadata_for(source, &mut memo, contract).await;
                nft.push(NftTransfer {
                    token_address: format!("{contract:#x}"),
                    token_id: token_id.to_string(),
                    from_address: Some(format!("{from:#x}")),
                    to_address: Some(format!("{to:#x}")),
                    amount: "1".to_string(),
                    contract_type: ContractStandard::Erc721,
                    token_symbol: Some(meta.symbol),
                    token_name: None,
                });
            }
            RawTransfer::Nft1155 {
                contract,
                from,
                to,
                token_id,
                amount,
            } => {
                nft.push(NftTransfer {
                    token_address: format!("{contract:#x}"),
                    token_id: token_id.to_string(),
                    from_address: Some(format!("{from:#x}")),
                    to_address: Some(format!("{to:#x}")),
                    amount: amount.to_string(),
                    contract_type: ContractStandard::Erc1155,
                    token_symbol: None,
                    token_name: None,
                });
            }
        }
    }

    (erc20, nft)
}

async fn metadata_for(
    source: &impl TokenMetadataSource,
    memo: &mut HashMap<Address, TokenMetadata>,
    contract: Address,
) -> TokenMetadata {
    if let Some(cached) = memo.get(&contract) {
        return cached.clone();
    }
    let meta = source.token_metadata(contract).await;
    memo.insert(contract, meta.clone());
    meta
}

/// Decode a `symbol()` return value as the printable-ASCII subset of the
/// raw bytes, further restricted to alphanumerics and '$'. Returns None when
/// nothing printable survives.
pub fn decode_symbol(bytes: &[u8]) -> Option<String> {
    let cleaned: String = bytes
        .iter()
        .filter(|b| (32..=126).contains(*b))
        .map(|&b| b as char)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '$')
        .collect();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Decode a `decimals()` return value (one big-endian word) to its decimal
/// string. Returns None for an empty response.
pub fn decode_decimals(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let word = &bytes[..bytes.len().min(32)];
    Some(U256::from_be_slice(word).to_string())
}

fn topic_address(topic: &B256) -> Address {
    // Indexed addresses are left-padded to 32 bytes; the address is the
    // low 20.
    Address::from_slice(&topic.as_slice()[12..])
}
