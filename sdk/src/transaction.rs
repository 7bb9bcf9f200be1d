//! Versioned transactions and their error taxonomy.

use {
    crate::{
        hash::Hash,
        message::{Message, VersionedMessage},
        pubkey::Pubkey,
        sanitize::{Sanitize, SanitizeError},
        signature::Signature,
    },
    serde_derive::{Deserialize, Serialize},
    thiserror::Error,
};

/// Reasons a processed transaction might have resulted in an error.
#[derive(Error, Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum TransactionError {
    /// An account is already being processed in another transaction in a way
    /// that does not support parallelism
    #[error("Account in use")]
    AccountInUse,

    /// Attempt to debit an account but found no record of a prior credit.
    #[error("Attempt to debit an account but found no record of a prior credit.")]
    AccountNotFound,

    /// The from `Pubkey` does not have sufficient balance to pay the fee to
    /// schedule the transaction
    #[error("Insufficient funds for fee")]
    InsufficientFundsForFee,

    /// The ledger does not have an entry for this blockhash; either the
    /// transaction arrived too late or the blockhash is forged
    #[error("Blockhash not found")]
    BlockhashNotFound,

    /// An instruction's program id was not found or is not executable
    #[error("Attempt to load a program that does not exist")]
    ProgramAccountNotFound,

    /// The transaction has a signature that does not pass verification
    #[error("Transaction did not pass signature verification")]
    SignatureFailure,

    /// This transaction has already been processed
    #[error("This transaction has already been processed")]
    AlreadyProcessed,

    /// An error occurred while processing an instruction
    #[error("Error processing Instruction {0}: custom program error: {1:#x}")]
    InstructionError(u8, u32),

    /// The transaction failed sanitization checks
    #[error("Transaction failed to sanitize accounts offsets correctly")]
    SanitizeFailure,
}

pub type TransactionResult<T> = std::result::Result<T, TransactionError>;

// Type alias kept for readability at call sites that deal with serialized
// transactions headed for the wire.
pub type WireTransaction = Vec<u8>;

/// A transaction in one of the message formats the cluster understands.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VersionedTransaction {
    /// List of signatures
    pub signatures: Vec<Signature>,
    /// Message to sign
    pub message: VersionedMessage,
}

impl Sanitize for VersionedTransaction {
    fn sanitize(&self) -> Result<(), SanitizeError> {
        self.message.sanitize()?;

        // Once the "verify_tx_signatures_len" feature is enabled, this
        // check will be enforced during signature verification as well
        if self.signatures.len() != usize::from(self.message.header().num_required_signatures) {
            return Err(SanitizeError::IndexOutOfBounds);
        }

        Ok(())
    }
}

impl VersionedTransaction {
    /// An unsigned transaction from a payer key; test and tooling helper.
    pub fn new_unsigned(payer: Pubkey, recent_blockhash: Hash) -> Self {
        Self {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(Message::new_with_blockhash(
                1,
                vec![payer],
                recent_blockhash,
            )),
        }
    }

    /// A sanitized transaction with a unique first signature; test helper.
    pub fn new_unique() -> Self {
        Self {
            signatures: vec![Signature::new_unique()],
            message: VersionedMessage::Legacy(Message::new_with_blockhash(
                1,
                vec![Pubkey::new_unique()],
                Hash::new_unique(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_signature_count() {
        let mut tx = VersionedTransaction::new_unique();
        assert_eq!(tx.sanitize(), Ok(()));

        tx.signatures.push(Signature::new_unique());
        assert_eq!(tx.sanitize(), Err(SanitizeError::IndexOutOfBounds));

        tx.signatures.clear();
        assert_eq!(tx.sanitize(), Err(SanitizeError::IndexOutOfBounds));
    }

    #[test]
    fn test_bincode_round_trip() {
        let tx = VersionedTransaction::new_unique();
        let bytes = bincode::serialize(&tx).unwrap();
        assert_eq!(bincode::deserialize::<VersionedTransaction>(&bytes).unwrap(), tx);
    }
}
