use std::sync::Arc;

use crate::data::chains::ChainRegistry;
use crate::data::providers::moralis::MoralisClient;

/// Fail-soft spot-price lookups. Pricing is an enhancement layered onto
/// transaction data, never a precondition for returning it: every failure
/// path here is 0.0, not an error.
#[derive(Clone)]
pub struct PriceEnricher {
    registry: Arc<ChainRegistry>,
    moralis: MoralisClient,
}

impl PriceEnricher {
    pub fn new(registry: Arc<ChainRegistry>, moralis: MoralisClient) -> Self {
        Self { registry, moralis }
    }

    /// Spot USD price of a chain's native asset, via its registered
    /// wrapped-native contract. Chains without one (and testnets) price at
    /// 0.0.
    pub async fn native_price(&self, chain_id: &str) -> f64 {
        match self.registry.wrapped_native(chain_id) {
            Some(contract) => self.moralis.token_price(contract, chain_id).await,
            None => 0.0,
        }
    }

    /// Spot USD price of an arbitrary ERC-20 contract.
    pub async fn token_price(&self, contract: &str, chain_id: &str) -> f64 {
        self.moralis.token_price(contract, chain_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::data::chains::ChainDescriptor;

    use super::*;

    #[tokio::test]
    async fn test_chain_without_wrapped_native_prices_at_zero() {
        // No wrapped-native route registered, so no network call is made.
        let registry = ChainRegistry::with_chains(vec![ChainDescriptor {
            id: "0xbeef",
            name: "Isolated",
            aliases: &[],
            rpc_urls: &[],
            wrapped_native: None,
        }]);
        let enricher = PriceEnricher::new(Arc::new(registry), MoralisClient::new(None));
        assert_eq!(enricher.native_price("0xbeef").await, 0.0);
    }

    #[tokio::test]
    async fn test_missing_api_key_prices_at_zero() {
        let enricher =
            PriceEnricher::new(Arc::new(ChainRegistry::new()), MoralisClient::new(None));
        assert_eq!(enricher.native_price("0x1").await, 0.0);
        assert_eq!(enricher.token_price("0xdead", "0x1").await, 0.0);
    }
}
