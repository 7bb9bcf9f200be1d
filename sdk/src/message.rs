//! The message format consumed by the ledger and forwarded to leaders.

use {
    crate::{
        hash::Hash,
        pubkey::Pubkey,
        sanitize::{Sanitize, SanitizeError},
    },
    serde_derive::{Deserialize, Serialize},
};

/// Describes the organization of a message's account keys.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    /// The number of signatures required for this message to be considered
    /// valid. The signers of those signatures must match the first
    /// `num_required_signatures` of [`Message::account_keys`].
    pub num_required_signatures: u8,
    /// The last `num_readonly_signed_accounts` of the signed keys are
    /// read-only accounts.
    pub num_readonly_signed_accounts: u8,
    /// The last `num_readonly_unsigned_accounts` of the unsigned keys are
    /// read-only accounts.
    pub num_readonly_unsigned_accounts: u8,
}

/// An instruction to execute a program, with its accounts and data resolved
/// through indexes into the message's account-key list.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompiledInstruction {
    /// Index into the message's account keys of the program account.
    pub program_id_index: u8,
    /// Ordered indices into the message's account keys of the instruction
    /// accounts.
    pub accounts: Vec<u8>,
    /// The program input data.
    pub data: Vec<u8>,
}

impl Sanitize for CompiledInstruction {}

#[derive(Serialize, Deserialize, Default, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// The message header, identifying signed and read-only `account_keys`.
    pub header: MessageHeader,

    /// All the account keys used by this transaction.
    pub account_keys: Vec<Pubkey>,

    /// The id of a recent ledger entry.
    pub recent_blockhash: Hash,

    /// Programs that will be executed in sequence and committed in one atomic
    /// transaction if all succeed.
    pub instructions: Vec<CompiledInstruction>,
}

impl Sanitize for Message {
    fn sanitize(&self) -> Result<(), SanitizeError> {
        // signing area and read-only non-signing area should not overlap
        if self.header.num_required_signatures as usize
            + self.header.num_readonly_unsigned_accounts as usize
            > self.account_keys.len()
        {
            return Err(SanitizeError::IndexOutOfBounds);
        }

        // there should be at least 1 RW fee-payer account.
        if self.header.num_required_signatures == 0 {
            return Err(SanitizeError::IndexOutOfBounds);
        }

        for ci in &self.instructions {
            if ci.program_id_index as usize >= self.account_keys.len() {
                return Err(SanitizeError::IndexOutOfBounds);
            }
            // A program cannot be a payer.
            if ci.program_id_index == 0 {
                return Err(SanitizeError::IndexOutOfBounds);
            }
            for ai in &ci.accounts {
                if *ai as usize >= self.account_keys.len() {
                    return Err(SanitizeError::IndexOutOfBounds);
                }
            }
        }
        Ok(())
    }
}

impl Message {
    pub fn new_with_blockhash(
        num_required_signatures: u8,
        account_keys: Vec<Pubkey>,
        recent_blockhash: Hash,
    ) -> Self {
        Self {
            header: MessageHeader {
                num_required_signatures,
                ..MessageHeader::default()
            },
            account_keys,
            recent_blockhash,
            instructions: vec![],
        }
    }

    /// All account keys referenced by the message, in order.
    pub fn static_account_keys(&self) -> &[Pubkey] {
        &self.account_keys
    }
}

/// Either a legacy message or one of the versioned formats.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum VersionedMessage {
    Legacy(Message),
}

impl VersionedMessage {
    pub fn header(&self) -> &MessageHeader {
        match self {
            Self::Legacy(message) => &message.header,
        }
    }

    pub fn static_account_keys(&self) -> &[Pubkey] {
        match self {
            Self::Legacy(message) => &message.account_keys,
        }
    }

    pub fn recent_blockhash(&self) -> &Hash {
        match self {
            Self::Legacy(message) => &message.recent_blockhash,
        }
    }
}

impl Sanitize for VersionedMessage {
    fn sanitize(&self) -> Result<(), SanitizeError> {
        match self {
            Self::Legacy(message) => message.sanitize(),
        }
    }
}

impl Default for VersionedMessage {
    fn default() -> Self {
        Self::Legacy(Message::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_requires_fee_payer() {
        let message = Message::default();
        assert_eq!(message.sanitize(), Err(SanitizeError::IndexOutOfBounds));

        let message = Message::new_with_blockhash(
            1,
            vec![Pubkey::new_unique()],
            Hash::default(),
        );
        assert_eq!(message.sanitize(), Ok(()));
    }

    #[test]
    fn test_sanitize_program_index_bounds() {
        let mut message = Message::new_with_blockhash(
            1,
            vec![Pubkey::new_unique(), Pubkey::new_unique()],
            Hash::default(),
        );
        message.instructions.push(CompiledInstruction {
            program_id_index: 2,
            accounts: vec![],
            data: vec![],
        });
        assert_eq!(message.sanitize(), Err(SanitizeError::IndexOutOfBounds));

        message.instructions[0].program_id_index = 1;
        assert_eq!(message.sanitize(), Ok(()));

        message.instructions[0].accounts = vec![7];
        assert_eq!(message.sanitize(), Err(SanitizeError::IndexOutOfBounds));
    }
}
