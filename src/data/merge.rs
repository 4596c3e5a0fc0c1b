use std::collections::HashMap;

use crate::data::types::{NormalizedTransaction, TokenTransfer};

/// Reconcile a chain's native-transaction list with its token-transfer list
/// into one de-duplicated, enriched list.
///
/// For every token transfer whose hash matches a native transaction, the
/// transfer is attached to that transaction. When the transaction's native
/// value is exactly "0", the usual signature of a contract-mediated transfer,
/// the transfer's value/symbol/decimals are promoted to the transaction's
/// display fields. The first matching transfer wins the
/// promotion; with several transfers in one transaction this is a heuristic,
/// not a guarantee of picking the economically primary one.
///
/// A transfer whose hash has no native counterpart becomes a minimal
/// pseudo-transaction so it still shows up in history. Re-merging an already
/// merged list is a no-op: attachment is skipped for transfers already
/// present, and pseudo-transactions carry their transfer so they are found by
/// the hash lookup instead of being synthesized again.
pub fn merge_transactions(
    native: Vec<NormalizedTransaction>,
    tokens: &[TokenTransfer],
) -> Vec<NormalizedTransaction> {
    let mut merged = native;
    let mut index_by_hash: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(idx, tx)| (tx.hash.clone(), idx))
        .collect();

    for transfer in tokens {
        let hash = transfer.transaction_hash.clone().unwrap_or_default();

        match index_by_hash.get(&hash) {
            Some(&idx) => {
                let tx = &mut merged[idx];
                let attached = tx.erc20_transfers.get_or_insert_with(Vec::new);
                if !attached.contains(transfer) {
                    attached.push(transfer.clone());
                }

                if tx.value == "0" {
                    tx.value = transfer.value.clone();
                    tx.token_symbol = transfer.token_symbol.clone();
                    tx.token_decimals = Some(transfer.token_decimals.clone());
                }
            }
            None => {
                let pseudo = NormalizedTransaction::from_token_transfer(transfer);
                index_by_hash.insert(pseudo.hash.clone(), merged.len());
                merged.push(pseudo);
            }
        }
    }

    merged
}
