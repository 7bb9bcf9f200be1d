//! A refreshed snapshot of the cluster state the sender needs: epoch info,
//! the flattened leader schedule, a recent blockhash, and the leader to
//! TPU-socket map.

use {
    crate::tpu_info::TpuInfo,
    ridgeline_rpc_client_api::client::RpcApi,
    ridgeline_sdk::{
        clock::{Slot, DEFAULT_MS_PER_SLOT, NUM_CONSECUTIVE_LEADER_SLOTS},
        epoch_info::EpochInfo,
        hash::Hash,
        pubkey::Pubkey,
    },
    std::{
        collections::HashMap,
        net::SocketAddr,
        sync::Arc,
        time::Instant,
    },
};

use ridgeline_rpc_client_api::client_error::{ClientError, Result as ClientResult};

/// One slot of the epoch's schedule, resolved to an absolute slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotLeader {
    pub slot: Slot,
    pub leader: Pubkey,
}

pub struct ServiceInfo<T> {
    rpc_client: Arc<dyn RpcApi>,
    tpu_info: T,
    epoch_info: EpochInfo,
    /// When `epoch_info` was captured; leader-slot arithmetic is relative to
    /// this instant.
    epoch_info_instant: Instant,
    latest_blockhash: Hash,
    /// Schedule of the current epoch, flattened and sorted by slot ascending.
    slot_leaders: Vec<SlotLeader>,
    leader_addresses: HashMap<Pubkey, SocketAddr>,
}

impl<T: TpuInfo> ServiceInfo<T> {
    /// Fetch the initial snapshot; the refresh worker keeps it current
    /// afterwards.
    pub fn new(rpc_client: Arc<dyn RpcApi>, tpu_info: T) -> ClientResult<Self> {
        let mut info = Self {
            rpc_client,
            tpu_info,
            epoch_info: EpochInfo {
                epoch: 0,
                slot_index: 0,
                slots_in_epoch: 0,
                absolute_slot: 0,
                block_height: 0,
                transaction_count: None,
            },
            epoch_info_instant: Instant::now(),
            latest_blockhash: Hash::default(),
            slot_leaders: vec![],
            leader_addresses: HashMap::new(),
        };
        info.refresh()?;
        Ok(info)
    }

    pub fn rpc_client(&self) -> &dyn RpcApi {
        &*self.rpc_client
    }

    pub fn latest_blockhash(&self) -> Hash {
        self.latest_blockhash
    }

    pub fn epoch_info(&self) -> &EpochInfo {
        &self.epoch_info
    }

    /// Re-fetch epoch info and blockhash, rebuild the flattened leader
    /// schedule, and re-resolve each scheduled leader to a TPU socket.
    pub fn refresh(&mut self) -> ClientResult<()> {
        let epoch_info = self.rpc_client.get_epoch_info()?;
        let epoch_info_instant = Instant::now();
        let latest_blockhash = self.rpc_client.get_latest_blockhash()?;

        let leader_schedule = self.rpc_client.get_leader_schedule()?.unwrap_or_default();
        let epoch_start_slot = epoch_info.absolute_slot - epoch_info.slot_index;
        let mut slot_leaders = Vec::new();
        for (leader, slot_indexes) in leader_schedule {
            let leader: Pubkey = leader.parse().map_err(|err| {
                ClientError::ParseError(format!("leader pubkey in schedule: {err:?}"))
            })?;
            for slot_index in slot_indexes {
                slot_leaders.push(SlotLeader {
                    slot: epoch_start_slot + slot_index as u64,
                    leader,
                });
            }
        }
        slot_leaders.sort_by_key(|slot_leader| slot_leader.slot);

        self.tpu_info.refresh_recent_peers();
        let mut leader_addresses = HashMap::new();
        for SlotLeader { leader, .. } in &slot_leaders {
            if leader_addresses.contains_key(leader) {
                continue;
            }
            match self.tpu_info.tpu_socket_addr(leader) {
                Some(address) => {
                    leader_addresses.insert(*leader, address);
                }
                None => warn!("No TPU address for scheduled leader {}", leader),
            }
        }

        debug!(
            "Refreshed service info: epoch {}, {} scheduled slots, {} reachable leaders",
            epoch_info.epoch,
            slot_leaders.len(),
            leader_addresses.len(),
        );

        self.epoch_info = epoch_info;
        self.epoch_info_instant = epoch_info_instant;
        self.latest_blockhash = latest_blockhash;
        self.slot_leaders = slot_leaders;
        self.leader_addresses = leader_addresses;
        Ok(())
    }

    /// TPU addresses of the current leader and the next `max_count - 1`
    /// leaders, assuming 400ms slots since the epoch info was captured.
    pub fn leader_addresses(&self, max_count: u64) -> ClientResult<Vec<SocketAddr>> {
        let slots_elapsed =
            self.epoch_info_instant.elapsed().as_millis() as u64 / DEFAULT_MS_PER_SLOT;
        let mut addresses = Vec::with_capacity(max_count as usize);
        for i in 0..max_count {
            let slot_index =
                self.epoch_info.slot_index + slots_elapsed + NUM_CONSECUTIVE_LEADER_SLOTS * i;
            let slot_leader = self.slot_leaders.get(slot_index as usize).ok_or_else(|| {
                ClientError::Custom(format!(
                    "slot index {slot_index} is past the end of the leader schedule"
                ))
            })?;
            let address = self
                .leader_addresses
                .get(&slot_leader.leader)
                .ok_or_else(|| {
                    ClientError::Custom(format!(
                        "no TPU address for leader {}",
                        slot_leader.leader
                    ))
                })?;
            addresses.push(*address);
        }
        Ok(addresses)
    }
}
