//! The `entry` module is a fundamental building block of Proof of History.
//!
//! Each entry contains three pieces of data. The `num_hashes` field is the
//! number of hashes performed since the previous entry.  The `hash` field is
//! the result of hashing `hash` from the previous entry `num_hashes` times.
//! The `transactions` field points to transactions that took place shortly
//! before `hash` was generated.

use {
    ridgeline_sdk::{
        hash::{extend_and_hash, hash, Hash},
        transaction::VersionedTransaction,
    },
    serde_derive::{Deserialize, Serialize},
};

/// Each entry tick is the result of hashing the previous tick's hash.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct Entry {
    /// The number of hashes since the previous Entry ID.
    pub num_hashes: u64,

    /// The SHA-256 hash `num_hashes` after the previous Entry ID.
    pub hash: Hash,

    /// An unordered list of transactions that were observed before the Entry
    /// ID was generated. They may have been observed before a previous Entry
    /// ID but were pushed back into this list to ensure deterministic
    /// interpretation of the ledger.
    pub transactions: Vec<VersionedTransaction>,
}

impl Entry {
    /// Creates the next Entry `num_hashes` after `start_hash`.
    pub fn new(prev_hash: &Hash, mut num_hashes: u64, transactions: Vec<VersionedTransaction>) -> Self {
        // If you passed in transactions, but passed in num_hashes == 0, then
        // next_hash will generate the next hash and set num_hashes to 1
        if num_hashes == 0 && !transactions.is_empty() {
            num_hashes = 1;
        }

        let hash = next_hash(prev_hash, num_hashes, &transactions);
        Entry {
            num_hashes,
            hash,
            transactions,
        }
    }

    pub fn is_tick(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Creates the hash `num_hashes` after `start_hash`. If the transaction
/// contains a signature, the final hash will be a hash of both the previous
/// ID and the signature.  If num_hashes is zero and there's no transaction
/// data, start_hash is returned.
pub fn next_hash(
    start_hash: &Hash,
    num_hashes: u64,
    transactions: &[VersionedTransaction],
) -> Hash {
    if num_hashes == 0 && transactions.is_empty() {
        return *start_hash;
    }

    let mut poh = *start_hash;
    for _ in 1..num_hashes {
        poh = hash(poh.as_ref());
    }

    if transactions.is_empty() {
        hash(poh.as_ref())
    } else {
        let tx_hash = hash_transactions(transactions);
        extend_and_hash(&poh, tx_hash.as_ref())
    }
}

fn hash_transactions(transactions: &[VersionedTransaction]) -> Hash {
    let mut hash_data = vec![];
    for transaction in transactions {
        for signature in &transaction.signatures {
            hash_data.extend_from_slice(signature.as_ref());
        }
    }
    hash(&hash_data)
}

/// Creates the next Tick or Transaction Entry `num_hashes` after
/// `start_hash`.
pub fn next_entry(prev_hash: &Hash, num_hashes: u64, transactions: Vec<VersionedTransaction>) -> Entry {
    assert!(num_hashes > 0 || transactions.is_empty());
    Entry {
        num_hashes,
        hash: next_hash(prev_hash, num_hashes, &transactions),
        transactions,
    }
}

/// Creates the next entries for given transactions.
pub fn next_entries(
    start_hash: &Hash,
    num_hashes: u64,
    transaction_batches: Vec<Vec<VersionedTransaction>>,
) -> Vec<Entry> {
    let mut hash = *start_hash;
    let mut entries = vec![];
    for transactions in transaction_batches {
        let entry = next_entry(&hash, num_hashes, transactions);
        hash = entry.hash;
        entries.push(entry);
    }
    entries
}

/// Creates `num_ticks` empty tick entries chained from `start_hash`.
pub fn create_ticks(num_ticks: u64, hashes_per_tick: u64, mut hash: Hash) -> Vec<Entry> {
    let mut ticks = Vec::with_capacity(num_ticks as usize);
    for _ in 0..num_ticks {
        let new_tick = next_entry(&hash, hashes_per_tick, vec![]);
        hash = new_tick.hash;
        ticks.push(new_tick);
    }

    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_chains_through_hash() {
        let zero = Hash::default();
        let tick = next_entry(&zero, 1, vec![]);
        assert_eq!(tick.num_hashes, 1);
        assert_ne!(tick.hash, zero);
        assert!(tick.is_tick());

        // zero hashes, zero transactions is the identity
        let same = next_entry(&zero, 0, vec![]);
        assert_eq!(same.hash, zero);
    }

    #[test]
    fn test_transaction_entry_mixes_in_signatures() {
        let zero = Hash::default();
        let tx = VersionedTransaction::new_unique();
        let entry = next_entry(&zero, 1, vec![tx.clone()]);
        assert!(!entry.is_tick());
        assert_ne!(entry.hash, next_entry(&zero, 1, vec![]).hash);

        // deterministic for the same input
        assert_eq!(entry.hash, next_entry(&zero, 1, vec![tx]).hash);
    }

    #[test]
    fn test_create_ticks_chains() {
        let start = Hash::new_unique();
        let ticks = create_ticks(3, 1, start);
        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[1].hash, next_hash(&ticks[0].hash, 1, &[]));
    }
}
