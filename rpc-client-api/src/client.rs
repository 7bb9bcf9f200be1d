//! The oracle interface the forwarding service consumes.
//!
//! Transport is out of scope here; a production binary plugs in an HTTP
//! JSON-RPC client, tests plug in a mock. Implementations must return
//! signature statuses in the order of the supplied signatures.

use {
    crate::{
        client_error::Result,
        response::{RpcLeaderSchedule, RpcSignatureStatusConfig, TransactionStatus},
    },
    ridgeline_sdk::{epoch_info::EpochInfo, hash::Hash, signature::Signature},
};

pub trait RpcApi: Send + Sync {
    /// `getEpochInfo`
    fn get_epoch_info(&self) -> Result<EpochInfo>;

    /// `getLatestBlockhash`
    fn get_latest_blockhash(&self) -> Result<Hash>;

    /// `getLeaderSchedule` for the current epoch
    fn get_leader_schedule(&self) -> Result<Option<RpcLeaderSchedule>>;

    /// `getBlockHeight`
    fn get_block_height(&self) -> Result<u64>;

    /// `getSignatureStatuses`; one entry per requested signature, in request
    /// order
    fn get_signature_statuses(
        &self,
        signatures: &[Signature],
        config: RpcSignatureStatusConfig,
    ) -> Result<Vec<Option<TransactionStatus>>>;
}
