pub mod etherscan;
pub mod moralis;
pub mod node;

use serde::{Deserialize, Serialize};

/// The closed set of upstream data sources, ordered by richness of
/// enrichment: hosted indexer, block explorer, raw node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Moralis,
    Etherscan,
    Rpc,
}

impl ProviderKind {
    /// Only the hosted indexer can fan a wallet history out across chains;
    /// raw nodes have no economical way to enumerate an address's history.
    pub fn supports_multi_chain_history(&self) -> bool {
        !matches!(self, ProviderKind::Rpc)
    }

    /// Whether the provider can list ERC-20 transfers for an address.
    pub fn supports_token_transfer_listing(&self) -> bool {
        matches!(self, ProviderKind::Moralis)
    }

    /// The provenance label stamped onto transactions this provider resolves.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Moralis => "moralis",
            ProviderKind::Etherscan => "etherscan",
            ProviderKind::Rpc => "Public RPC",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Moralis => write!(f, "moralis"),
            ProviderKind::Etherscan => write!(f, "etherscan"),
            ProviderKind::Rpc => write!(f, "rpc"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "moralis" => Ok(ProviderKind::Moralis),
            "etherscan" => Ok(ProviderKind::Etherscan),
            "rpc" => Ok(ProviderKind::Rpc),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("Moralis".parse::<ProviderKind>().unwrap(), ProviderKind::Moralis);
        assert_eq!("RPC".parse::<ProviderKind>().unwrap(), ProviderKind::Rpc);
        assert!("covalent".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_capabilities() {
        assert!(ProviderKind::Moralis.supports_multi_chain_history());
        assert!(ProviderKind::Etherscan.supports_multi_chain_history());
        assert!(!ProviderKind::Rpc.supports_multi_chain_history());
        assert!(ProviderKind::Moralis.supports_token_transfer_listing());
        assert!(!ProviderKind::Etherscan.supports_token_transfer_listing());
    }

    #[test]
    fn test_display_round_trips() {
        for kind in [ProviderKind::Moralis, ProviderKind::Etherscan, ProviderKind::Rpc] {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }
}
