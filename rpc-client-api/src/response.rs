use {
    ridgeline_sdk::{clock::Slot, transaction::TransactionError},
    serde_derive::{Deserialize, Serialize},
    std::collections::HashMap,
};

/// Leader schedule for an epoch: base-58 leader identity to the slot indices
/// (relative to the first slot of the epoch) it is scheduled for.
pub type RpcLeaderSchedule = HashMap<String, Vec<usize>>;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransactionConfirmationStatus {
    Processed,
    Confirmed,
    Finalized,
}

/// The status of a signature as reported by `getSignatureStatuses`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub slot: Slot,
    /// None indicates the transaction is finalized (rooted)
    pub confirmations: Option<usize>,
    pub err: Option<TransactionError>,
    pub confirmation_status: Option<TransactionConfirmationStatus>,
}

impl TransactionStatus {
    pub fn satisfies_commitment(&self) -> bool {
        self.confirmations.is_none()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcSignatureStatusConfig {
    pub search_transaction_history: bool,
}
