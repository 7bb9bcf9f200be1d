//! The Ridgeline host and client SDK.
//!
//! Primitives shared by the ledger storage engine and the long-running
//! services: fixed-width digests and identifiers, clock constants, timing
//! helpers, and the versioned transaction format.

pub mod clock;
pub mod epoch_info;
pub mod hash;
pub mod message;
pub mod packet;
pub mod pubkey;
pub mod sanitize;
pub mod signature;
pub mod timing;
pub mod transaction;
pub mod transport;
