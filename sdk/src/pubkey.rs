use {
    serde_derive::{Deserialize, Serialize},
    std::{convert::TryFrom, fmt, mem, str::FromStr},
    thiserror::Error,
};

/// Number of bytes in a pubkey.
pub const PUBKEY_BYTES: usize = 32;
/// Maximum string length of a base58 encoded pubkey.
const MAX_BASE58_LEN: usize = 44;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePubkeyError {
    #[error("string is the wrong size")]
    WrongSize,
    #[error("invalid base58 encoded string")]
    Invalid,
}

/// The address of an account or a slot leader.
#[derive(
    Serialize, Deserialize, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[repr(transparent)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub fn new(pubkey_vec: &[u8]) -> Self {
        Self(<[u8; PUBKEY_BYTES]>::try_from(pubkey_vec).expect("Slice must be the same length as a Pubkey"))
    }

    pub const fn new_from_array(pubkey_array: [u8; PUBKEY_BYTES]) -> Self {
        Self(pubkey_array)
    }

    /// unique Pubkey for tests and benchmarks.
    pub fn new_unique() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static I: AtomicU64 = AtomicU64::new(1);

        let mut b = [0u8; PUBKEY_BYTES];
        let i = I.fetch_add(1, Ordering::Relaxed);
        // use big endian representation to ensure that recent unique pubkeys
        // are always larger than less recent unique pubkeys
        b[0..8].copy_from_slice(&i.to_be_bytes());
        Self::new(&b)
    }

    pub fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl FromStr for Pubkey {
    type Err = ParsePubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParsePubkeyError::WrongSize);
        }
        let pubkey_vec = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParsePubkeyError::Invalid)?;
        if pubkey_vec.len() != mem::size_of::<Pubkey>() {
            Err(ParsePubkeyError::WrongSize)
        } else {
            Ok(Pubkey::new(&pubkey_vec))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_unique() {
        assert!(Pubkey::new_unique() != Pubkey::new_unique());
    }

    #[test]
    fn test_pubkey_fromstr() {
        let pubkey = Pubkey::new_unique();
        let pubkey_base58_str = bs58::encode(pubkey.0).into_string();
        assert_eq!(pubkey_base58_str.parse::<Pubkey>(), Ok(pubkey));

        let bad = "I".repeat(MAX_BASE58_LEN);
        assert_eq!(bad.parse::<Pubkey>(), Err(ParsePubkeyError::Invalid));
    }
}
