//! Composed views of processed transactions and confirmed blocks, as read
//! back out of the ledger.

use {
    ridgeline_entry::entry::Entry,
    ridgeline_sdk::{
        clock::{Slot, UnixTimestamp},
        hash::Hash,
        pubkey::Pubkey,
        signature::Signature,
        transaction::{TransactionError, TransactionResult, VersionedTransaction},
    },
    serde_derive::{Deserialize, Serialize},
};

/// The state change that occurred to an account as a result of a reward.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardType {
    Fee,
    Rent,
    Staking,
    Voting,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Reward {
    pub pubkey: Pubkey,
    pub lamports: i64,
    /// Account balance in lamports after `lamports` was applied
    pub post_balance: u64,
    pub reward_type: Option<RewardType>,
    /// Vote account commission when the reward was credited, only present
    /// for voting and staking rewards
    pub commission: Option<u8>,
}

pub type Rewards = Vec<Reward>;

/// Rewards as stored per slot, with the optional partition count the runtime
/// recorded when the reward set was split across blocks.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RewardsAndNumPartitions {
    pub rewards: Rewards,
    pub num_partitions: Option<u64>,
}

/// The execution result persisted for a processed transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransactionStatusMeta {
    pub status: TransactionResult<()>,
    pub fee: u64,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub log_messages: Option<Vec<String>>,
}

impl Default for TransactionStatusMeta {
    fn default() -> Self {
        Self {
            status: Ok(()),
            fee: 0,
            pre_balances: vec![],
            post_balances: vec![],
            log_messages: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedTransactionWithStatusMeta {
    pub transaction: VersionedTransaction,
    pub meta: TransactionStatusMeta,
}

/// A block as composed by the blockstore reader; transaction metadata is
/// required to be present for every transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedConfirmedBlock {
    pub previous_blockhash: Hash,
    pub blockhash: Hash,
    pub parent_slot: Slot,
    pub transactions: Vec<VersionedTransactionWithStatusMeta>,
    pub rewards: Rewards,
    pub num_partitions: Option<u64>,
    pub block_time: Option<UnixTimestamp>,
    pub block_height: Option<u64>,
}

/// Wrapper for a block with the per-entry summaries populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedConfirmedBlockWithEntries {
    pub block: VersionedConfirmedBlock,
    pub entries: Vec<EntrySummary>,
}

/// Data needed to reconstruct an Entry, given an ordered list of transactions
/// within a block. Used to traverse the entry boundaries of a block without
/// duplicating the transactions themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntrySummary {
    pub num_hashes: u64,
    pub hash: Hash,
    pub num_transactions: u64,
    pub starting_transaction_index: usize,
}

impl EntrySummary {
    pub fn new(starting_transaction_index: usize, entry: &Entry) -> Self {
        Self {
            num_hashes: entry.num_hashes,
            hash: entry.hash,
            num_transactions: entry.transactions.len() as u64,
            starting_transaction_index,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionWithStatusMeta {
    Complete(VersionedTransactionWithStatusMeta),
}

impl TransactionWithStatusMeta {
    pub fn transaction_signature(&self) -> &Signature {
        match self {
            Self::Complete(VersionedTransactionWithStatusMeta { transaction, .. }) => {
                &transaction.signatures[0]
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmedTransactionWithStatusMeta {
    pub slot: Slot,
    pub tx_with_meta: TransactionWithStatusMeta,
    pub block_time: Option<UnixTimestamp>,
}

/// One row of a signatures-for-address listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmedTransactionStatusWithSignature {
    pub signature: Signature,
    pub slot: Slot,
    pub err: Option<TransactionError>,
    pub memo: Option<String>,
    pub block_time: Option<UnixTimestamp>,
}
