use std::fs;

use serde::Serialize;

use crate::data::types::NormalizedTransaction;
use crate::data::value::format_base_units;

/// Export normalized transactions to CSV.
///
/// Columns: hash, chain, timestamp, from, to, amount, symbol, status,
/// block_number. The amount column is the display value scaled by the row's
/// token decimal count (18 for native rows).
pub fn export_transactions_csv(
    transactions: &[NormalizedTransaction],
    path: &str,
) -> Result<String, String> {
    let file = fs::File::create(path).map_err(|e| format!("Failed to create file: {e}"))?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "hash",
        "chain",
        "timestamp",
        "from",
        "to",
        "amount",
        "symbol",
        "status",
        "block_number",
    ])
    .map_err(|e| format!("Failed to write CSV header: {e}"))?;

    for tx in transactions {
        let decimals = tx.token_decimals.as_deref().unwrap_or("18");
        wtr.write_record(&[
            tx.hash.clone(),
            tx.detected_chain.clone().unwrap_or_default(),
            tx.block_timestamp.to_rfc3339(),
            tx.from_address.clone(),
            tx.to_address.clone().unwrap_or_default(),
            format_base_units(&tx.value, decimals),
            tx.token_symbol.clone().unwrap_or_else(|| "Native".to_string()),
            if tx.is_success() { "success" } else { "failed" }.to_string(),
            tx.block_number.clone(),
        ])
        .map_err(|e| format!("Failed to write CSV row: {e}"))?;
    }

    wtr.flush().map_err(|e| format!("Failed to flush CSV: {e}"))?;

    Ok(format!(
        "Exported {} transactions to {path}",
        transactions.len()
    ))
}

/// Export any resolved result as pretty-printed JSON.
pub fn export_result_json<T: Serialize>(result: &T, path: &str) -> Result<String, String> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| format!("Failed to serialize result: {e}"))?;
    fs::write(path, json).map_err(|e| format!("Failed to write file: {e}"))?;
    Ok(format!("Exported result to {path}"))
}
