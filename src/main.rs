use clap::Parser;
use color_eyre::eyre::{Result, eyre};

use chain_agent::Resolver;
use chain_agent::config::{Cli, Command};
use chain_agent::data::export;
use chain_agent::data::types::{
    SingleTransactionResult, TokenTransfersRequest, TokenTransfersResult,
    TransactionLookupRequest, WalletHistoryRequest, WalletHistoryResult,
};
use chain_agent::data::value::format_base_units;
use chain_agent::utils;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let resolver = Resolver::new(cli.moralis_api_key.clone(), cli.etherscan_api_key.clone());

    match &cli.command {
        Command::Wallet {
            address,
            chain,
            limit,
            from_date,
            to_date,
            direction,
            stablecoins_only,
            provider,
        } => {
            let req = WalletHistoryRequest {
                address: address.clone(),
                chain: Some(chain.clone()),
                limit: *limit,
                from_date: from_date.clone(),
                to_date: to_date.clone(),
                direction: *direction,
                stablecoins_only: *stablecoins_only,
                provider: *provider,
            };
            let mut result = resolver.wallet_transactions(&req).await?;

            // The resolver only echoes the filter parameters; applying them
            // is the presentation layer's job.
            if let Some(filters) = result.filters.clone() {
                result.transactions = utils::apply_history_filters(
                    &result.transactions,
                    &result.searched_address,
                    &filters,
                );
            }

            if let Some(path) = &cli.export_csv {
                eprintln!(
                    "{}",
                    export::export_transactions_csv(&result.transactions, path)
                        .map_err(|e| eyre!(e))?
                );
            }
            if let Some(path) = &cli.export_json {
                eprintln!("{}", export::export_result_json(&result, path).map_err(|e| eyre!(e))?);
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                render_wallet(&result);
            }
        }

        Command::Transfers {
            address,
            chain,
            limit,
        } => {
            let req = TokenTransfersRequest {
                address: address.clone(),
                chain: Some(chain.clone()),
                limit: *limit,
            };
            let result = resolver.token_transfers(&req).await?;

            if let Some(path) = &cli.export_json {
                eprintln!("{}", export::export_result_json(&result, path).map_err(|e| eyre!(e))?);
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                render_transfers(&result);
            }
        }

        Command::Tx {
            hash,
            chain,
            provider,
        } => {
            let req = TransactionLookupRequest {
                hash: hash.clone(),
                chain: chain.clone(),
                provider: *provider,
            };
            let result = resolver.transaction_by_hash(&req).await?;

            if let Some(path) = &cli.export_csv {
                eprintln!(
                    "{}",
                    export::export_transactions_csv(
                        std::slice::from_ref(&result.transaction),
                        path
                    )
                    .map_err(|e| eyre!(e))?
                );
            }
            if let Some(path) = &cli.export_json {
                eprintln!("{}", export::export_result_json(&result, path).map_err(|e| eyre!(e))?);
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                render_transaction(&result);
            }
        }
    }

    Ok(())
}

fn render_wallet(result: &WalletHistoryResult) {
    println!(
        "{} transactions for {} on {}",
        result.transactions.len(),
        utils::truncate_hex(&result.searched_address),
        result.chain
    );

    for tx in &result.transactions {
        let decimals = tx.token_decimals.as_deref().unwrap_or("18");
        let symbol = tx.token_symbol.as_deref().unwrap_or("Native");
        let amount = format_base_units(&tx.value, decimals);
        let chain = tx.detected_chain.as_deref().unwrap_or("-");

        let usd = usd_estimate(&amount, symbol, chain, result);
        let status = if tx.is_success() { "" } else { "  [failed]" };

        println!(
            "{:>9}  {:<10} {}  {} -> {}  {} {}{}{}",
            utils::relative_time(tx.block_timestamp),
            chain,
            utils::truncate_hex(&tx.hash),
            utils::truncate_hex(&tx.from_address),
            tx.to_address
                .as_deref()
                .map(utils::truncate_hex)
                .unwrap_or_else(|| "contract creation".to_string()),
            utils::format_amount(&amount),
            symbol,
            usd,
            status,
        );
    }
}

/// Rough USD column: native rows use the chain's spot price, stablecoins pass
/// through 1:1, everything else is left blank.
fn usd_estimate(amount: &str, symbol: &str, chain: &str, result: &WalletHistoryResult) -> String {
    let value = utils::parse_to_float(amount);
    if symbol == "Native" {
        let price = result.price_map.get(chain).copied().unwrap_or(0.0);
        if price > 0.0 {
            return format!("  ({})", utils::format_usd(value * price));
        }
    } else if matches!(symbol, "USDT" | "USDC" | "DAI" | "BUSD") {
        return format!("  ({})", utils::format_usd(value));
    }
    String::new()
}

fn render_transfers(result: &TokenTransfersResult) {
    println!(
        "{} token transfers for {} on {}",
        result.transfers.len(),
        utils::truncate_hex(&result.searched_address),
        result.chain
    );
    for transfer in &result.transfers {
        let amount = format_base_units(&transfer.value, &transfer.token_decimals);
        println!(
            "{}  {} -> {}  {} {}",
            transfer
                .transaction_hash
                .as_deref()
                .map(utils::truncate_hex)
                .unwrap_or_else(|| "-".to_string()),
            utils::truncate_hex(&transfer.from_address),
            utils::truncate_hex(&transfer.to_address),
            utils::format_amount(&amount),
            transfer.token_symbol.as_deref().unwrap_or("Unknown"),
        );
    }
}

fn render_transaction(result: &SingleTransactionResult) {
    let tx = &result.transaction;
    let native_amount = format_base_units(&tx.value, "18");
    let native_price = tx.native_price.unwrap_or(0.0);

    println!("transaction {}", tx.hash);
    println!(
        "  chain     {}   provider {}",
        tx.detected_chain.as_deref().unwrap_or("-"),
        tx.provider.as_deref().unwrap_or("-"),
    );
    println!(
        "  status    {}   {}",
        if tx.is_success() { "success" } else { "failed" },
        utils::relative_time(tx.block_timestamp),
    );
    println!("  from      {}", tx.from_address);
    match (&tx.to_address, &tx.receipt_contract_address) {
        (Some(to), _) => println!("  to        {to}"),
        (None, Some(created)) => println!("  created   {created}"),
        (None, None) => println!("  to        (contract creation)"),
    }
    print!("  value     {} Native", utils::format_amount(&native_amount));
    if native_price > 0.0 {
        print!(
            "  ({})",
            utils::format_usd(utils::parse_to_float(&native_amount) * native_price)
        );
    }
    println!();
    println!(
        "  fee       {} Native",
        utils::format_fee(&tx.receipt_gas_used, &tx.gas_price)
    );
    println!("  block     {}   nonce {}", tx.block_number, tx.nonce);

    if let Some(transfers) = &tx.erc20_transfers {
        for transfer in transfers {
            let amount = format_base_units(&transfer.value, &transfer.token_decimals);
            println!(
                "  token     {} {}  {} -> {}",
                utils::format_amount(&amount),
                transfer.token_symbol.as_deref().unwrap_or("Unknown"),
                utils::truncate_hex(&transfer.from_address),
                utils::truncate_hex(&transfer.to_address),
            );
        }
    }
    if let Some(nfts) = &tx.nft_transfers {
        for nft in nfts {
            println!(
                "  nft       {} x{} (id {})  {}",
                nft.token_symbol.as_deref().unwrap_or("Unknown"),
                nft.amount,
                nft.token_id,
                nft.contract_type,
            );
        }
    }
    if let Some(internal) = &tx.internal_transfers {
        for transfer in internal {
            println!(
                "  internal  {} Native  {} -> {}",
                utils::format_amount(&format_base_units(&transfer.value, "18")),
                utils::truncate_hex(&transfer.from),
                utils::truncate_hex(&transfer.to),
            );
        }
    }
    if let Some(price) = result.token_price {
        if price > 0.0 {
            println!("  token px  {}", utils::format_usd(price));
        }
    }
}
