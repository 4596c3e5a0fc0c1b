use clap::{Parser, Subcommand};

use crate::data::providers::ProviderKind;
use crate::data::types::Direction;

#[derive(Parser, Debug)]
#[command(
    name = "chain-agent",
    about = "Multi-provider, multi-chain blockchain transaction resolver"
)]
pub struct Cli {
    /// Moralis Web3 API key (hosted indexer; required for wallet history)
    #[arg(long, env = "MORALIS_API_KEY", global = true)]
    pub moralis_api_key: Option<String>,

    /// Etherscan V2 multichain API key (block explorer)
    #[arg(long, env = "ETHERSCAN_API_KEY", global = true)]
    pub etherscan_api_key: Option<String>,

    /// Print the full result as JSON instead of the text summary
    #[arg(long, global = true)]
    pub json: bool,

    /// Write the resolved transactions to a CSV file
    #[arg(long, value_name = "PATH", global = true)]
    pub export_csv: Option<String>,

    /// Write the full result to a JSON file
    #[arg(long, value_name = "PATH", global = true)]
    pub export_json: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wallet transaction history, merged with token transfers
    Wallet {
        /// Wallet address (0x...)
        address: String,

        /// Chain name/id, or "all" to scan every major network
        #[arg(long, default_value = "eth")]
        chain: String,

        /// Transactions to fetch per chain
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Start date, YYYY-MM-DD
        #[arg(long)]
        from_date: Option<String>,

        /// End date, YYYY-MM-DD
        #[arg(long)]
        to_date: Option<String>,

        /// Keep only inbound or outbound transactions
        #[arg(long, value_enum, default_value_t = Direction::All)]
        direction: Direction,

        /// Keep only stablecoin transfers (USDT, USDC, DAI, ...)
        #[arg(long)]
        stablecoins_only: bool,

        #[arg(long, value_enum, default_value_t = ProviderKind::Moralis)]
        provider: ProviderKind,
    },

    /// ERC-20 token transfers for an address
    Transfers {
        /// Wallet address (0x...)
        address: String,

        #[arg(long, default_value = "eth")]
        chain: String,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Look up a single transaction by hash, searching chains if needed
    Tx {
        /// Transaction hash (0x...)
        hash: String,

        /// Chain name/id; omit to search the chain priority list
        #[arg(long)]
        chain: Option<String>,

        #[arg(long, value_enum, default_value_t = ProviderKind::Moralis)]
        provider: ProviderKind,
    },
}
