use std::collections::HashMap;

/// One supported network: canonical hex chain id, user-facing aliases, and the
/// per-provider addressing data the adapters need.
#[derive(Debug, Clone)]
pub struct ChainDescriptor {
    /// Hex-encoded chain id, the identifier all three upstream APIs accept.
    pub id: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Prioritized public JSON-RPC endpoints for the direct-node adapter.
    pub rpc_urls: &'static [&'static str],
    /// Wrapped-native-asset contract used for spot pricing. None for chains
    /// without a registered price route and for testnets.
    pub wrapped_native: Option<&'static str>,
}

const CHAINS: &[ChainDescriptor] = &[
    ChainDescriptor {
        id: "0x1",
        name: "Ethereum",
        aliases: &["eth", "ethereum", "mainnet"],
        rpc_urls: &["https://eth.llamarpc.com", "https://rpc.ankr.com/eth"],
        wrapped_native: Some("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
    },
    ChainDescriptor {
        id: "0x38",
        name: "BSC",
        aliases: &["bsc", "binance"],
        rpc_urls: &[
            "https://binance.llamarpc.com",
            "https://bsc-dataseed.binance.org",
        ],
        wrapped_native: Some("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
    },
    ChainDescriptor {
        id: "0x89",
        name: "Polygon",
        aliases: &["polygon", "matic"],
        rpc_urls: &["https://polygon.llamarpc.com", "https://polygon-rpc.com"],
        wrapped_native: Some("0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270"),
    },
    ChainDescriptor {
        id: "0xa86a",
        name: "Avalanche",
        aliases: &["avax", "avalanche"],
        rpc_urls: &[
            "https://avalanche.llamarpc.com",
            "https://api.avax.network/ext/bc/C/rpc",
        ],
        wrapped_native: Some("0xB31f66AA3C1e785363F0875A1B74E27b85FD66c7"),
    },
    ChainDescriptor {
        id: "0xfa",
        name: "Fantom",
        aliases: &["fantom", "ftm"],
        rpc_urls: &["https://fantom.llamarpc.com", "https://rpc.ftm.tools"],
        wrapped_native: Some("0x21be370D5312f44cB42ce377BC9b8a0cEF1A4C83"),
    },
    ChainDescriptor {
        id: "0xa4b1",
        name: "Arbitrum",
        aliases: &["arbitrum", "arb"],
        rpc_urls: &[
            "https://arbitrum.llamarpc.com",
            "https://arb1.arbitrum.io/rpc",
        ],
        wrapped_native: Some("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
    },
    ChainDescriptor {
        id: "0xa",
        name: "Optimism",
        aliases: &["optimism", "op"],
        rpc_urls: &[
            "https://optimism.llamarpc.com",
            "https://mainnet.optimism.io",
        ],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0x2105",
        name: "Base",
        aliases: &["base"],
        rpc_urls: &["https://base.llamarpc.com", "https://mainnet.base.org"],
        wrapped_native: Some("0x4200000000000000000000000000000000000006"),
    },
    ChainDescriptor {
        id: "0x19",
        name: "Cronos",
        aliases: &["cronos"],
        rpc_urls: &["https://cronos.drpc.org"],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0xe708",
        name: "Linea",
        aliases: &["linea"],
        rpc_urls: &["https://linea.drpc.org"],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0x82750",
        name: "Scroll",
        aliases: &["scroll"],
        rpc_urls: &["https://rpc.scroll.io"],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0x13e31",
        name: "Blast",
        aliases: &["blast"],
        rpc_urls: &["https://rpc.blast.io"],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0x144",
        name: "ZkSync Era",
        aliases: &["zksync"],
        rpc_urls: &["https://mainnet.era.zksync.io"],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0x64",
        name: "Gnosis",
        aliases: &["gnosis"],
        rpc_urls: &["https://rpc.gnosischain.com"],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0x504",
        name: "Moonbeam",
        aliases: &["moonbeam"],
        rpc_urls: &["https://rpc.api.moonbeam.network"],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0xa4ec",
        name: "Celo",
        aliases: &["celo"],
        rpc_urls: &["https://forno.celo.org"],
        wrapped_native: None,
    },
    ChainDescriptor {
        id: "0xaa36a7",
        name: "Sepolia",
        aliases: &["sepolia"],
        rpc_urls: &["https://rpc.sepolia.org"],
        wrapped_native: None,
    },
];

/// Priority order for the no-chain-specified hash search.
const SEARCH_ORDER: &[&str] = &[
    "0x1", "0x38", "0x89", "0xa4b1", "0xa", "0xa86a", "0x2105", "0xfa", "0xe708", "0x13e31",
    "0x82750", "0x19", "0x64", "0x144", "0xaa36a7",
];

/// Chains scanned concurrently when a wallet history asks for "all".
const SCAN_LIST: &[&str] = &[
    "0x1", "0x38", "0x89", "0xa4b1", "0xa", "0x2105", "0xa86a", "0xfa",
];

/// Immutable registry of supported networks, built once at startup and passed
/// by reference into the resolver and adapters.
#[derive(Debug)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
    by_id: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    search_order: Vec<&'static str>,
    scan_list: Vec<&'static str>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::build(
            CHAINS.to_vec(),
            SEARCH_ORDER.to_vec(),
            SCAN_LIST.to_vec(),
        )
    }

    /// Registry over a reduced chain set, for tests. Search and scan orders
    /// follow the insertion order of `chains`.
    pub fn with_chains(chains: Vec<ChainDescriptor>) -> Self {
        let order: Vec<&'static str> = chains.iter().map(|c| c.id).collect();
        Self::build(chains, order.clone(), order)
    }

    fn build(
        chains: Vec<ChainDescriptor>,
        search_order: Vec<&'static str>,
        scan_list: Vec<&'static str>,
    ) -> Self {
        let mut by_id = HashMap::new();
        let mut by_alias = HashMap::new();
        for (idx, chain) in chains.iter().enumerate() {
            by_id.insert(chain.id.to_string(), idx);
            for alias in chain.aliases {
                by_alias.insert(alias.to_string(), idx);
            }
        }
        Self {
            chains,
            by_id,
            by_alias,
            search_order,
            scan_list,
        }
    }

    /// Normalize a user-supplied chain name to its canonical id. Aliases are
    /// matched case-insensitively; anything unrecognized passes through
    /// unchanged so chains outside the alias table stay addressable by raw id.
    pub fn resolve(&self, alias_or_id: &str) -> String {
        let lower = alias_or_id.to_lowercase();
        if let Some(&idx) = self.by_alias.get(&lower) {
            return self.chains[idx].id.to_string();
        }
        if self.by_id.contains_key(&lower) {
            return lower;
        }
        alias_or_id.to_string()
    }

    pub fn descriptor(&self, id: &str) -> Option<&ChainDescriptor> {
        self.by_id.get(id).map(|&idx| &self.chains[idx])
    }

    /// Display name for a chain id; unknown ids display as themselves.
    pub fn display_name(&self, id: &str) -> String {
        self.descriptor(id)
            .map(|c| c.name.to_string())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn endpoints(&self, id: &str) -> &[&'static str] {
        self.descriptor(id).map(|c| c.rpc_urls).unwrap_or(&[])
    }

    pub fn wrapped_native(&self, id: &str) -> Option<&'static str> {
        self.descriptor(id).and_then(|c| c.wrapped_native)
    }

    /// Reverse lookup from display name to chain id.
    pub fn id_for_name(&self, name: &str) -> Option<&'static str> {
        self.chains.iter().find(|c| c.name == name).map(|c| c.id)
    }

    pub fn search_order(&self) -> &[&'static str] {
        &self.search_order
    }

    pub fn scan_list(&self) -> &[&'static str] {
        &self.scan_list
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethereum_aliases() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.resolve("eth"), "0x1");
        assert_eq!(registry.resolve("Ethereum"), "0x1");
        assert_eq!(registry.resolve("MAINNET"), "0x1");
    }

    #[test]
    fn test_polygon_alias() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.resolve("matic"), "0x89");
        assert_eq!(registry.display_name("0x89"), "Polygon");
    }

    #[test]
    fn test_raw_id_resolves_to_itself() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.resolve("0x38"), "0x38");
        assert_eq!(registry.resolve("0xA4B1"), "0xa4b1");
    }

    #[test]
    fn test_unknown_chain_passes_through() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.resolve("0xdeadbeef"), "0xdeadbeef");
        assert_eq!(registry.display_name("0xdeadbeef"), "0xdeadbeef");
        assert!(registry.endpoints("0xdeadbeef").is_empty());
    }

    #[test]
    fn test_endpoints_are_prioritized() {
        let registry = ChainRegistry::new();
        let urls = registry.endpoints("0x1");
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://eth.llamarpc.com");
    }

    #[test]
    fn test_wrapped_native_lookup() {
        let registry = ChainRegistry::new();
        assert_eq!(
            registry.wrapped_native("0x1"),
            Some("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")
        );
        // Sepolia is a testnet with no price route.
        assert!(registry.wrapped_native("0xaa36a7").is_none());
    }

    #[test]
    fn test_id_for_name() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.id_for_name("Arbitrum"), Some("0xa4b1"));
        assert!(registry.id_for_name("Solana").is_none());
    }

    #[test]
    fn test_search_order_starts_with_ethereum() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.search_order()[0], "0x1");
        assert_eq!(*registry.search_order().last().unwrap(), "0xaa36a7");
    }

    #[test]
    fn test_scan_list_has_eight_chains() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.scan_list().len(), 8);
        assert!(registry.scan_list().contains(&"0x2105"));
        assert!(!registry.scan_list().contains(&"0xaa36a7"));
    }

    #[test]
    fn test_reduced_registry() {
        let registry = ChainRegistry::with_chains(vec![ChainDescriptor {
            id: "0x7a69",
            name: "Anvil",
            aliases: &["anvil", "local"],
            rpc_urls: &["http://127.0.0.1:8545"],
            wrapped_native: None,
        }]);
        assert_eq!(registry.resolve("local"), "0x7a69");
        assert_eq!(registry.search_order(), &["0x7a69"]);
        assert_eq!(registry.scan_list(), &["0x7a69"]);
    }
}
