//! The `blockstore` module provides the read side of the ledger: it
//! reconstructs confirmed blocks, entries, and transactions from the
//! column-family store whose atomic unit is a shred, while a background
//! cleaner may be compacting slots out from under it.

use {
    crate::{
        ancestor_iterator::AncestorIterator,
        blockstore_db::{
            columns as cf, BlockstoreError, Column, Database, IteratorDirection, IteratorMode,
            LedgerColumn, Result,
        },
        blockstore_meta::*,
        shred::{self, Shred, ShredType, SHRED_PAYLOAD_SIZE},
    },
    bincode::deserialize,
    ridgeline_entry::entry::{create_ticks, next_entry, Entry},
    ridgeline_measure::measure::Measure,
    ridgeline_metrics::datapoint_info,
    ridgeline_sdk::{
        clock::{Slot, UnixTimestamp, DEFAULT_TICKS_PER_SECOND, MS_PER_TICK},
        hash::Hash,
        pubkey::Pubkey,
        sanitize::Sanitize,
        signature::Signature,
        timing::timestamp,
        transaction::VersionedTransaction,
    },
    ridgeline_transaction_status::{
        ConfirmedTransactionStatusWithSignature, ConfirmedTransactionWithStatusMeta, EntrySummary,
        Rewards, RewardsAndNumPartitions, TransactionStatusMeta, TransactionWithStatusMeta,
        VersionedConfirmedBlock, VersionedConfirmedBlockWithEntries,
        VersionedTransactionWithStatusMeta,
    },
    rocksdb::DBRawIterator,
    std::{
        cmp,
        collections::{BTreeSet, HashMap, HashSet, VecDeque},
        fs,
        io::{Error as IoError, ErrorKind},
        path::{Path, PathBuf},
        sync::{
            atomic::{AtomicU64, Ordering},
            Mutex, RwLock, RwLockReadGuard,
        },
    },
    tempfile::{Builder, TempDir},
};

pub const BLOCKSTORE_DIRECTORY: &str = "rocksdb";

pub const MAX_TURBINE_PROPAGATION_IN_MS: u64 = 100;
pub const MAX_TURBINE_DELAY_IN_TICKS: u64 = MAX_TURBINE_PROPAGATION_IN_MS / MS_PER_TICK;

type CompletedRanges = Vec<(u32, u32)>;

#[derive(Default)]
pub struct SignatureInfosForAddress {
    pub infos: Vec<ConfirmedTransactionStatusWithSignature>,
    pub found_before: bool,
}

// ledger window
pub struct Blockstore {
    ledger_path: PathBuf,
    db: Database,
    meta_cf: LedgerColumn<cf::SlotMeta>,
    dead_slots_cf: LedgerColumn<cf::DeadSlots>,
    duplicate_slots_cf: LedgerColumn<cf::DuplicateSlots>,
    roots_cf: LedgerColumn<cf::Root>,
    data_shred_cf: LedgerColumn<cf::ShredData>,
    code_shred_cf: LedgerColumn<cf::ShredCode>,
    transaction_status_cf: LedgerColumn<cf::TransactionStatus>,
    address_signatures_cf: LedgerColumn<cf::AddressSignatures>,
    transaction_memos_cf: LedgerColumn<cf::TransactionMemos>,
    rewards_cf: LedgerColumn<cf::Rewards>,
    blocktime_cf: LedgerColumn<cf::Blocktime>,
    perf_samples_cf: LedgerColumn<cf::PerfSamples>,
    block_height_cf: LedgerColumn<cf::BlockHeight>,
    program_costs_cf: LedgerColumn<cf::ProgramCosts>,
    bank_hash_cf: LedgerColumn<cf::BankHash>,
    optimistic_slots_cf: LedgerColumn<cf::OptimisticSlots>,
    max_root: AtomicU64,
    insert_shreds_lock: Mutex<()>,
    /// The last slot that has been purged by the cleanup service; slots at or
    /// below it may disappear from any column at any moment.
    pub lowest_cleanup_slot: RwLock<Slot>,
}

impl Blockstore {
    /// Opens a Ledger in directory, provides "infinite" window of shreds
    pub fn open(ledger_path: &Path) -> Result<Blockstore> {
        fs::create_dir_all(ledger_path)?;
        let blockstore_path = ledger_path.join(BLOCKSTORE_DIRECTORY);

        let mut measure = Measure::start("blockstore open");
        info!("Opening blockstore at {:?}", blockstore_path);
        let db = Database::open(&blockstore_path)?;

        let meta_cf = db.column();
        let dead_slots_cf = db.column();
        let duplicate_slots_cf = db.column();
        let roots_cf = db.column();
        let data_shred_cf = db.column();
        let code_shred_cf = db.column();
        let transaction_status_cf = db.column();
        let address_signatures_cf = db.column();
        let transaction_memos_cf = db.column();
        let rewards_cf = db.column();
        let blocktime_cf = db.column();
        let perf_samples_cf = db.column();
        let block_height_cf = db.column();
        let program_costs_cf = db.column();
        let bank_hash_cf = db.column();
        let optimistic_slots_cf = db.column();

        // Get max root or 0 if it doesn't exist
        let max_root = db
            .iter::<cf::Root>(IteratorMode::End)?
            .next()
            .map(|(slot, _)| slot)
            .unwrap_or(0);

        measure.stop();
        info!("{:?} {}", blockstore_path, measure);
        let blockstore = Blockstore {
            ledger_path: ledger_path.to_path_buf(),
            db,
            meta_cf,
            dead_slots_cf,
            duplicate_slots_cf,
            roots_cf,
            data_shred_cf,
            code_shred_cf,
            transaction_status_cf,
            address_signatures_cf,
            transaction_memos_cf,
            rewards_cf,
            blocktime_cf,
            perf_samples_cf,
            block_height_cf,
            program_costs_cf,
            bank_hash_cf,
            optimistic_slots_cf,
            max_root: AtomicU64::new(max_root),
            insert_shreds_lock: Mutex::new(()),
            lowest_cleanup_slot: RwLock::new(0),
        };
        Ok(blockstore)
    }

    pub fn destroy(ledger_path: &Path) -> Result<()> {
        // Database::destroy() fails if the path doesn't exist
        fs::create_dir_all(ledger_path)?;
        let blockstore_path = ledger_path.join(BLOCKSTORE_DIRECTORY);
        Database::destroy(&blockstore_path)
    }

    /// The path to the ledger store
    pub fn ledger_path(&self) -> &PathBuf {
        &self.ledger_path
    }

    pub fn storage_size(&self) -> Result<u64> {
        self.db.storage_size()
    }

    pub fn meta(&self, slot: Slot) -> Result<Option<SlotMeta>> {
        self.meta_cf.get(slot)
    }

    /// Manually update the meta for a slot.
    /// Can interfere with automatic meta update and potentially break chaining.
    /// Dangerous. Use with care.
    pub fn put_meta(&self, slot: Slot, meta: &SlotMeta) -> Result<()> {
        self.meta_cf.put(slot, meta)
    }

    /// Returns true if the specified slot is full.
    pub fn is_full(&self, slot: Slot) -> bool {
        if let Ok(Some(meta)) = self.meta_cf.get(slot) {
            return meta.is_full();
        }
        false
    }

    /// Returns the max root or 0 if it does not exist.
    pub fn max_root(&self) -> Slot {
        self.max_root.load(Ordering::Relaxed)
    }

    pub fn slot_meta_iterator(
        &self,
        slot: Slot,
    ) -> Result<impl Iterator<Item = (Slot, SlotMeta)> + '_> {
        let meta_iter = self
            .db
            .iter::<cf::SlotMeta>(IteratorMode::From(slot, IteratorDirection::Forward))?;
        Ok(meta_iter.map(|(slot, slot_meta_bytes)| {
            (
                slot,
                deserialize(&slot_meta_bytes).unwrap_or_else(|e| {
                    panic!("Could not deserialize SlotMeta for slot {slot}: {e:?}")
                }),
            )
        }))
    }

    pub fn slot_data_iterator(
        &self,
        slot: Slot,
        index: u64,
    ) -> Result<impl Iterator<Item = ((u64, u64), Box<[u8]>)> + '_> {
        let slot_iterator = self.db.iter::<cf::ShredData>(IteratorMode::From(
            (slot, index),
            IteratorDirection::Forward,
        ))?;
        Ok(slot_iterator.take_while(move |((shred_slot, _), _)| *shred_slot == slot))
    }

    pub fn slot_coding_iterator(
        &self,
        slot: Slot,
        index: u64,
    ) -> Result<impl Iterator<Item = ((u64, u64), Box<[u8]>)> + '_> {
        let slot_iterator = self.db.iter::<cf::ShredCode>(IteratorMode::From(
            (slot, index),
            IteratorDirection::Forward,
        ))?;
        Ok(slot_iterator.take_while(move |((shred_slot, _), _)| *shred_slot == slot))
    }

    fn prepare_rooted_slot_iterator(
        &self,
        slot: Slot,
        direction: IteratorDirection,
    ) -> Result<impl Iterator<Item = Slot> + '_> {
        let slot_iterator = self
            .db
            .iter::<cf::Root>(IteratorMode::From(slot, direction))?;
        Ok(slot_iterator.map(move |(rooted_slot, _)| rooted_slot))
    }

    pub fn rooted_slot_iterator(&self, slot: Slot) -> Result<impl Iterator<Item = Slot> + '_> {
        self.prepare_rooted_slot_iterator(slot, IteratorDirection::Forward)
    }

    pub fn reversed_rooted_slot_iterator(
        &self,
        slot: Slot,
    ) -> Result<impl Iterator<Item = Slot> + '_> {
        self.prepare_rooted_slot_iterator(slot, IteratorDirection::Reverse)
    }

    pub fn reversed_optimistic_slots_iterator(
        &self,
    ) -> Result<impl Iterator<Item = (Slot, Hash, UnixTimestamp)> + '_> {
        let iterator = self.db.iter::<cf::OptimisticSlots>(IteratorMode::End)?;
        Ok(iterator.map(|(slot, bytes)| {
            let meta: OptimisticSlotMetaVersioned = deserialize(&bytes).unwrap();
            (slot, meta.hash(), meta.timestamp())
        }))
    }

    pub fn dead_slots_iterator(&self, slot: Slot) -> Result<impl Iterator<Item = Slot> + '_> {
        let dead_slots_iterator = self
            .db
            .iter::<cf::DeadSlots>(IteratorMode::From(slot, IteratorDirection::Forward))?;
        Ok(dead_slots_iterator.map(|(slot, _)| slot))
    }

    pub fn duplicate_slots_iterator(&self, slot: Slot) -> Result<impl Iterator<Item = Slot> + '_> {
        let duplicate_slots_iterator = self
            .db
            .iter::<cf::DuplicateSlots>(IteratorMode::From(slot, IteratorDirection::Forward))?;
        Ok(duplicate_slots_iterator.map(|(slot, _)| slot))
    }

    /// Determines if we can iterate from `starting_slot` to >= `ending_slot`
    /// by full slots; `starting_slot` is excluded from the `is_full()` check.
    ///
    /// Any visited slot that is absent or not yet full fails the whole range,
    /// even when another fork could still reach `ending_slot`.
    pub fn slot_range_connected(&self, starting_slot: Slot, ending_slot: Slot) -> bool {
        if starting_slot == ending_slot {
            return true;
        }

        let mut next_slots: VecDeque<_> = match self.meta(starting_slot) {
            Ok(Some(starting_slot_meta)) => starting_slot_meta.next_slots.into(),
            _ => return false,
        };
        let mut last_slot = starting_slot;
        while let Some(slot) = next_slots.pop_front() {
            let slot_meta = match self.meta(slot) {
                Ok(Some(slot_meta)) => slot_meta,
                _ => return false,
            };
            if !slot_meta.is_full() {
                return false;
            }
            if slot == ending_slot {
                return true;
            }
            assert_eq!(slot, last_slot + 1);
            last_slot = slot;
            next_slots.extend(slot_meta.next_slots);
        }

        false
    }

    pub fn get_data_shred(&self, slot: Slot, index: u64) -> Result<Option<Vec<u8>>> {
        let shred = self.data_shred_cf.get_bytes((slot, index))?;
        shred
            .map(|shred| {
                if shred.len() == SHRED_PAYLOAD_SIZE {
                    Ok(shred)
                } else {
                    Err(BlockstoreError::InvalidDataShred)
                }
            })
            .transpose()
    }

    pub fn get_data_shreds_for_slot(
        &self,
        slot: Slot,
        start_index: u64,
    ) -> std::result::Result<Vec<Shred>, shred::ShredError> {
        self.slot_data_iterator(slot, start_index)
            .expect("blockstore couldn't fetch iterator")
            .map(|data| Shred::new_from_serialized_shred(data.1.to_vec()))
            .collect()
    }

    pub fn get_coding_shred(&self, slot: Slot, index: u64) -> Result<Option<Vec<u8>>> {
        self.code_shred_cf.get_bytes((slot, index))
    }

    pub fn get_coding_shreds_for_slot(
        &self,
        slot: Slot,
        start_index: u64,
    ) -> std::result::Result<Vec<Shred>, shred::ShredError> {
        self.slot_coding_iterator(slot, start_index)
            .expect("blockstore couldn't fetch iterator")
            .map(|code| Shred::new_from_serialized_shred(code.1.to_vec()))
            .collect()
    }

    // Given a start and end entry index, find all the missing
    // indexes in the ledger in the range [start_index, end_index)
    // for the slot with the specified slot
    fn find_missing_indexes<C>(
        db_iterator: &mut DBRawIterator,
        slot: Slot,
        first_timestamp: u64,
        defer_threshold_ticks: u64,
        start_index: u64,
        end_index: u64,
        max_missing: usize,
    ) -> Result<Vec<u64>>
    where
        C: Column<Index = (u64, u64)>,
    {
        if start_index >= end_index || max_missing == 0 {
            return Ok(vec![]);
        }

        let mut missing_indexes = vec![];
        let ticks_since_first_insert =
            DEFAULT_TICKS_PER_SECOND * timestamp().saturating_sub(first_timestamp) / 1000;

        // Seek to the first shred with index >= start_index
        db_iterator.seek(C::key((slot, start_index)));

        // The index of the first missing shred in the slot
        let mut prev_index = start_index;
        'outer: loop {
            if !db_iterator.valid() {
                for i in prev_index..end_index {
                    missing_indexes.push(i);
                    if missing_indexes.len() == max_missing {
                        break;
                    }
                }
                break;
            }
            let (current_slot, index) =
                C::index(db_iterator.key().ok_or(BlockstoreError::IteratorMissingKey)?);

            let current_index = {
                if current_slot > slot {
                    end_index
                } else {
                    index
                }
            };

            let upper_index = cmp::min(current_index, end_index);
            // the tick that will be used to figure out the timeout for this hole
            let data = db_iterator
                .value()
                .ok_or(BlockstoreError::IteratorMissingValue)?;
            let reference_tick = u64::from(shred::layout::get_reference_tick(data).map_err(
                |err| {
                    BlockstoreError::InvalidShredData(Box::new(bincode::ErrorKind::Custom(
                        format!("Could not parse reference tick: {err:?}"),
                    )))
                },
            )?);
            if ticks_since_first_insert < reference_tick + defer_threshold_ticks {
                // The higher index holes have not timed out yet
                break 'outer;
            }
            for i in prev_index..upper_index {
                missing_indexes.push(i);
                if missing_indexes.len() == max_missing {
                    break 'outer;
                }
            }

            if current_slot > slot {
                break;
            }

            if current_index >= end_index {
                break;
            }

            prev_index = current_index + 1;
            db_iterator.next();
        }

        Ok(missing_indexes)
    }

    /// The missing data-shred indexes of `slot` within
    /// `[start_index, end_index)`, capped at `max_missing` entries. Holes
    /// above a shred younger than `defer_threshold_ticks` are not reported
    /// yet; they may still arrive over the network.
    pub fn find_missing_data_indexes(
        &self,
        slot: Slot,
        first_timestamp: u64,
        defer_threshold_ticks: u64,
        start_index: u64,
        end_index: u64,
        max_missing: usize,
    ) -> Result<Vec<u64>> {
        let mut db_iterator = self.db.raw_iterator_cf(self.db.cf_handle::<cf::ShredData>())?;
        Self::find_missing_indexes::<cf::ShredData>(
            &mut db_iterator,
            slot,
            first_timestamp,
            defer_threshold_ticks,
            start_index,
            end_index,
            max_missing,
        )
    }

    pub fn get_block_time(&self, slot: Slot) -> Result<Option<UnixTimestamp>> {
        datapoint_info!("blockstore-rpc-api", ("method", "get_block_time", String));
        let _lock = self.check_lowest_cleanup_slot(slot)?;
        self.blocktime_cf.get(slot)
    }

    pub fn cache_block_time(&self, slot: Slot, timestamp: UnixTimestamp) -> Result<()> {
        self.blocktime_cf.put(slot, &timestamp)
    }

    pub fn get_block_height(&self, slot: Slot) -> Result<Option<u64>> {
        datapoint_info!("blockstore-rpc-api", ("method", "get_block_height", String));
        let _lock = self.check_lowest_cleanup_slot(slot)?;
        self.block_height_cf.get(slot)
    }

    pub fn cache_block_height(&self, slot: Slot, block_height: u64) -> Result<()> {
        self.block_height_cf.put(slot, &block_height)
    }

    /// The first complete block that is available in the Blockstore ledger
    pub fn get_first_available_block(&self) -> Result<Slot> {
        let mut root_iterator = self.rooted_slot_iterator(self.lowest_slot_with_genesis())?;
        let first_root = root_iterator.next().unwrap_or_default();
        // If the first root is slot 0, it is genesis. Genesis is always complete, so it is correct
        // to return it as first-available.
        if first_root == 0 {
            return Ok(first_root);
        }
        // Otherwise, the block at root-index 0 cannot ever be complete, because it is missing its
        // parent blockhash. A parent blockhash must be calculated from the entries of the previous
        // block. Therefore, the first available complete block is that at root-index 1.
        Ok(root_iterator.next().unwrap_or_default())
    }

    pub fn get_rooted_block(
        &self,
        slot: Slot,
        require_previous_blockhash: bool,
    ) -> Result<VersionedConfirmedBlock> {
        datapoint_info!("blockstore-rpc-api", ("method", "get_rooted_block", String));
        let _lock = self.check_lowest_cleanup_slot(slot)?;

        if self.is_root(slot) {
            return self.get_complete_block(slot, require_previous_blockhash);
        }
        Err(BlockstoreError::SlotNotRooted)
    }

    pub fn get_complete_block(
        &self,
        slot: Slot,
        require_previous_blockhash: bool,
    ) -> Result<VersionedConfirmedBlock> {
        self.do_get_complete_block_with_entries(
            slot,
            require_previous_blockhash,
            false, // populate_entries
            false, // allow_dead_slots
        )
        .map(|result| result.block)
    }

    pub fn get_rooted_block_with_entries(
        &self,
        slot: Slot,
        require_previous_blockhash: bool,
    ) -> Result<VersionedConfirmedBlockWithEntries> {
        datapoint_info!(
            "blockstore-rpc-api",
            ("method", "get_rooted_block_with_entries", String)
        );
        let _lock = self.check_lowest_cleanup_slot(slot)?;

        if self.is_root(slot) {
            return self.do_get_complete_block_with_entries(
                slot, require_previous_blockhash,
                true,  // populate_entries
                false, // allow_dead_slots
            );
        }
        Err(BlockstoreError::SlotNotRooted)
    }

    pub fn get_complete_block_with_entries(
        &self,
        slot: Slot,
        require_previous_blockhash: bool,
        populate_entries: bool,
        allow_dead_slots: bool,
    ) -> Result<VersionedConfirmedBlockWithEntries> {
        self.do_get_complete_block_with_entries(
            slot,
            require_previous_blockhash,
            populate_entries,
            allow_dead_slots,
        )
    }

    fn do_get_complete_block_with_entries(
        &self,
        slot: Slot,
        require_previous_blockhash: bool,
        populate_entries: bool,
        allow_dead_slots: bool,
    ) -> Result<VersionedConfirmedBlockWithEntries> {
        let Some(slot_meta) = self.meta_cf.get(slot)? else {
            info!("SlotMeta not found for slot {}", slot);
            return Err(BlockstoreError::SlotUnavailable);
        };
        if slot_meta.is_full() {
            let (slot_entries, _, _) =
                self.get_slot_entries_with_shred_info(slot, 0, allow_dead_slots)?;
            if !slot_entries.is_empty() {
                let blockhash = slot_entries
                    .last()
                    .map(|entry| entry.hash)
                    .unwrap_or_else(|| panic!("Rooted slot {slot:?} must have blockhash"));
                let mut starting_transaction_index = 0;
                let mut entries = if populate_entries {
                    Vec::with_capacity(slot_entries.len())
                } else {
                    Vec::new()
                };
                let slot_transaction_iterator = slot_entries
                    .into_iter()
                    .flat_map(|entry| {
                        if populate_entries {
                            entries.push(EntrySummary::new(starting_transaction_index, &entry));
                            starting_transaction_index += entry.transactions.len();
                        }
                        entry.transactions
                    })
                    .map(|transaction| {
                        if let Err(err) = transaction.sanitize() {
                            warn!(
                                "Blockstore::get_block sanitize failed: {:?}, slot: {:?}, {:?}",
                                err, slot, transaction,
                            );
                        }
                        transaction
                    });
                let parent_slot_entries = slot_meta
                    .parent_slot
                    .and_then(|parent_slot| {
                        self.get_slot_entries_with_shred_info(
                            parent_slot,
                            /*shred_start_index:*/ 0,
                            allow_dead_slots,
                        )
                        .ok()
                        .map(|(entries, _, _)| entries)
                    })
                    .unwrap_or_default();
                if parent_slot_entries.is_empty() && require_previous_blockhash {
                    return Err(BlockstoreError::ParentEntriesUnavailable);
                }
                let previous_blockhash = if !parent_slot_entries.is_empty() {
                    get_last_hash(parent_slot_entries.iter()).unwrap()
                } else {
                    Hash::default()
                };

                let RewardsAndNumPartitions {
                    rewards,
                    num_partitions,
                } = self.rewards_cf.get(slot)?.unwrap_or_default();

                // The Blocktime and BlockHeight column families are updated asynchronously; they
                // may not be written by the time the complete slot entries are available. In this
                // case, these fields will be `None`.
                let block_time = self.blocktime_cf.get(slot)?;
                let block_height = self.block_height_cf.get(slot)?;

                let block = VersionedConfirmedBlock {
                    previous_blockhash,
                    blockhash,
                    // A full slot has parent_slot populated from the shreds
                    // received; only genesis legitimately has none and its
                    // composite reports parent slot 0.
                    parent_slot: slot_meta.parent_slot.unwrap_or_default(),
                    transactions: self
                        .map_transactions_to_statuses(slot, slot_transaction_iterator)?,
                    rewards,
                    num_partitions,
                    block_time,
                    block_height,
                };
                return Ok(VersionedConfirmedBlockWithEntries { block, entries });
            }
        }
        Err(BlockstoreError::SlotUnavailable)
    }

    pub fn map_transactions_to_statuses(
        &self,
        slot: Slot,
        iterator: impl Iterator<Item = VersionedTransaction>,
    ) -> Result<Vec<VersionedTransactionWithStatusMeta>> {
        iterator
            .map(|transaction| {
                let signature = transaction.signatures[0];
                Ok(VersionedTransactionWithStatusMeta {
                    transaction,
                    meta: self
                        .read_transaction_status((signature, slot))?
                        .ok_or(BlockstoreError::MissingTransactionMetadata)?,
                })
            })
            .collect()
    }

    pub fn read_transaction_status(
        &self,
        index: (Signature, Slot),
    ) -> Result<Option<TransactionStatusMeta>> {
        self.transaction_status_cf.get(index)
    }

    pub fn write_transaction_status(
        &self,
        slot: Slot,
        signature: Signature,
        writable_keys: Vec<&Pubkey>,
        readonly_keys: Vec<&Pubkey>,
        status: TransactionStatusMeta,
        transaction_index: usize,
    ) -> Result<()> {
        let transaction_index = u32::try_from(transaction_index)
            .map_err(|_| BlockstoreError::TransactionIndexOverflow)?;
        self.transaction_status_cf.put((signature, slot), &status)?;
        for address in writable_keys {
            self.address_signatures_cf.put(
                (*address, slot, transaction_index, signature),
                &AddressSignatureMeta { writeable: true },
            )?;
        }
        for address in readonly_keys {
            self.address_signatures_cf.put(
                (*address, slot, transaction_index, signature),
                &AddressSignatureMeta { writeable: false },
            )?;
        }
        Ok(())
    }

    pub fn read_transaction_memos(&self, signature: Signature) -> Result<Option<String>> {
        self.transaction_memos_cf.get(signature)
    }

    pub fn write_transaction_memos(&self, signature: &Signature, memos: String) -> Result<()> {
        self.transaction_memos_cf.put(*signature, &memos)
    }

    /// Acquires the `lowest_cleanup_slot` lock and returns a tuple of the held lock
    /// and lowest available slot.
    ///
    /// The function will return BlockstoreError::SlotCleanedUp if the input
    /// `slot` has already been cleaned-up.
    fn check_lowest_cleanup_slot(&self, slot: Slot) -> Result<RwLockReadGuard<Slot>> {
        // lowest_cleanup_slot is the last slot that was not cleaned up by LedgerCleanupService
        let lowest_cleanup_slot = self.lowest_cleanup_slot.read().unwrap();
        if *lowest_cleanup_slot > 0 && *lowest_cleanup_slot >= slot {
            return Err(BlockstoreError::SlotCleanedUp);
        }
        // Make caller hold this lock properly; otherwise LedgerCleanupService can purge/compact
        // needed slots here at any given moment
        Ok(lowest_cleanup_slot)
    }

    /// Acquires the lock of `lowest_cleanup_slot` and returns the tuple of
    /// the held lock and the lowest available slot.
    ///
    /// This function ensures a consistent result by using lowest_cleanup_slot
    /// as the lower bound for reading columns that do not employ strong read
    /// consistency with slot-based delete_range.
    fn ensure_lowest_cleanup_slot(&self) -> (RwLockReadGuard<Slot>, Slot) {
        let lowest_cleanup_slot = self.lowest_cleanup_slot.read().unwrap();
        let lowest_available_slot = (*lowest_cleanup_slot).saturating_add(1);

        // Make caller hold this lock properly; otherwise LedgerCleanupService can purge/compact
        // needed slots here at any given moment.
        // Blockstore callers, like rpc, can process concurrent read queries
        (lowest_cleanup_slot, lowest_available_slot)
    }

    pub fn lowest_cleanup_slot(&self) -> Slot {
        *self.lowest_cleanup_slot.read().unwrap()
    }

    pub fn set_lowest_cleanup_slot(&self, slot: Slot) {
        *self.lowest_cleanup_slot.write().unwrap() = slot;
    }

    // Returns a transaction status, as well as a loop counter for unit testing
    fn get_transaction_status_with_counter(
        &self,
        signature: Signature,
        confirmed_unrooted_slots: &[Slot],
    ) -> Result<(Option<(Slot, TransactionStatusMeta)>, u64)> {
        let mut counter = 0;
        let (lock, _) = self.ensure_lowest_cleanup_slot();
        let first_available_block = self.get_first_available_block()?;

        let iterator = self.transaction_status_cf.iter(IteratorMode::From(
            (signature, first_available_block),
            IteratorDirection::Forward,
        ))?;

        for ((sig, slot), _data) in iterator {
            counter += 1;
            if sig != signature {
                break;
            }
            if !self.is_root(slot) && !confirmed_unrooted_slots.contains(&slot) {
                continue;
            }
            let status = self
                .transaction_status_cf
                .get((sig, slot))?
                .ok_or(BlockstoreError::MissingValue)?;
            drop(lock);
            return Ok((Some((slot, status)), counter));
        }
        drop(lock);

        Ok((None, counter))
    }

    /// Returns a transaction status
    pub fn get_rooted_transaction_status(
        &self,
        signature: Signature,
    ) -> Result<Option<(Slot, TransactionStatusMeta)>> {
        datapoint_info!(
            "blockstore-rpc-api",
            ("method", "get_rooted_transaction_status", String)
        );
        self.get_transaction_status(signature, &[])
    }

    /// Returns a transaction status
    pub fn get_transaction_status(
        &self,
        signature: Signature,
        confirmed_unrooted_slots: &[Slot],
    ) -> Result<Option<(Slot, TransactionStatusMeta)>> {
        datapoint_info!(
            "blockstore-rpc-api",
            ("method", "get_transaction_status", String)
        );
        self.get_transaction_status_with_counter(signature, confirmed_unrooted_slots)
            .map(|(status, _)| status)
    }

    /// Returns a complete transaction if it was processed in a root
    pub fn get_rooted_transaction(
        &self,
        signature: Signature,
    ) -> Result<Option<ConfirmedTransactionWithStatusMeta>> {
        datapoint_info!(
            "blockstore-rpc-api",
            ("method", "get_rooted_transaction", String)
        );
        self.get_transaction_with_status(signature, &[])
    }

    /// Returns a complete transaction
    pub fn get_complete_transaction(
        &self,
        signature: Signature,
        highest_confirmed_slot: Slot,
    ) -> Result<Option<ConfirmedTransactionWithStatusMeta>> {
        datapoint_info!(
            "blockstore-rpc-api",
            ("method", "get_complete_transaction", String)
        );
        let max_root = self.max_root();
        let confirmed_unrooted_slots =
            self.confirmed_unrooted_slots(highest_confirmed_slot, max_root)?;
        self.get_transaction_with_status(signature, &confirmed_unrooted_slots)
    }

    /// The ancestors of `highest_slot` that are above the current max root,
    /// i.e. optimistically confirmed but not yet rooted.
    fn confirmed_unrooted_slots(&self, highest_slot: Slot, max_root: Slot) -> Result<Vec<Slot>> {
        let mut confirmed_unrooted_slots = vec![];
        for slot in AncestorIterator::new_inclusive(highest_slot, self) {
            let slot = slot?;
            if slot <= max_root {
                break;
            }
            confirmed_unrooted_slots.push(slot);
        }
        Ok(confirmed_unrooted_slots)
    }

    fn get_transaction_with_status(
        &self,
        signature: Signature,
        confirmed_unrooted_slots: &[Slot],
    ) -> Result<Option<ConfirmedTransactionWithStatusMeta>> {
        if let Some((slot, meta)) =
            self.get_transaction_status(signature, confirmed_unrooted_slots)?
        {
            let transaction = self
                .find_transaction_in_slot(slot, signature)?
                .ok_or(BlockstoreError::TransactionStatusSlotMismatch)?; // Should not happen

            let block_time = self.get_block_time(slot)?;
            Ok(Some(ConfirmedTransactionWithStatusMeta {
                slot,
                tx_with_meta: TransactionWithStatusMeta::Complete(
                    VersionedTransactionWithStatusMeta { transaction, meta },
                ),
                block_time,
            }))
        } else {
            Ok(None)
        }
    }

    // Linear scan of a whole slot's entries; this is the read path's known
    // hot spot for large blocks.
    fn find_transaction_in_slot(
        &self,
        slot: Slot,
        signature: Signature,
    ) -> Result<Option<VersionedTransaction>> {
        let slot_entries = self.get_slot_entries(slot, 0)?;
        Ok(slot_entries
            .iter()
            .cloned()
            .flat_map(|entry| entry.transactions)
            .map(|transaction| {
                if let Err(err) = transaction.sanitize() {
                    warn!(
                        "Blockstore::find_transaction_in_slot sanitize failed: {:?}, slot: {:?}, {:?}",
                        err, slot, transaction,
                    );
                }
                transaction
            })
            .find(|transaction| transaction.signatures[0] == signature))
    }

    // Returns all signatures for an address in a particular slot, regardless
    // of whether that slot has been rooted. The transactions will be ordered
    // by their occurrence in the block
    fn find_address_signatures_for_slot(
        &self,
        pubkey: Pubkey,
        slot: Slot,
    ) -> Result<Vec<(Slot, Signature)>> {
        let (lock, lowest_available_slot) = self.ensure_lowest_cleanup_slot();
        let mut signatures: Vec<(Slot, Signature)> = vec![];
        if slot < lowest_available_slot {
            drop(lock);
            return Ok(signatures);
        }
        let index_iterator = self.address_signatures_cf.iter(IteratorMode::From(
            (pubkey, slot, 0, Signature::default()),
            IteratorDirection::Forward,
        ))?;
        for ((address, transaction_slot, _transaction_index, signature), _) in index_iterator {
            if transaction_slot > slot || address != pubkey {
                break;
            }
            signatures.push((slot, signature));
        }
        drop(lock);
        Ok(signatures)
    }

    // The signatures of a block, in block order.
    fn get_block_signatures(&self, slot: Slot) -> Result<Vec<Signature>> {
        let block = self.get_complete_block(slot, false).map_err(|err| {
            BlockstoreError::Io(IoError::new(
                ErrorKind::Other,
                format!("Unable to get block: {err}"),
            ))
        })?;

        Ok(block
            .transactions
            .into_iter()
            .filter_map(|transaction_with_meta| {
                transaction_with_meta
                    .transaction
                    .signatures
                    .into_iter()
                    .next()
            })
            .collect())
    }

    pub fn get_confirmed_signatures_for_address(
        &self,
        address: Pubkey,
        highest_slot: Slot, // highest_confirmed_root or highest_confirmed_slot
        before: Option<Signature>,
        until: Option<Signature>,
        limit: usize,
    ) -> Result<SignatureInfosForAddress> {
        datapoint_info!(
            "blockstore-rpc-api",
            ("method", "get_confirmed_signatures_for_address", String)
        );
        let max_root = self.max_root();
        let confirmed_unrooted_slots = self.confirmed_unrooted_slots(highest_slot, max_root)?;

        // Figure the `slot` to start listing signatures at, based on the ledger location of the
        // `before` signature if present.  Also generate a HashSet of signatures that should
        // be excluded from the results.
        let mut get_before_slot_timer = Measure::start("get_before_slot_timer");
        let (slot, mut before_excluded_signatures) = match before {
            None => (highest_slot, None),
            Some(before) => {
                let transaction_status =
                    self.get_transaction_status(before, &confirmed_unrooted_slots)?;
                match transaction_status {
                    None => return Ok(SignatureInfosForAddress::default()),
                    Some((slot, _)) => {
                        let mut slot_signatures = self.get_block_signatures(slot)?;
                        slot_signatures.reverse();
                        if let Some(pos) = slot_signatures.iter().position(|&x| x == before) {
                            slot_signatures.truncate(pos + 1);
                        }

                        (
                            slot,
                            Some(slot_signatures.into_iter().collect::<HashSet<_>>()),
                        )
                    }
                }
            }
        };
        get_before_slot_timer.stop();

        let first_available_block = self.get_first_available_block()?;
        // Generate a HashSet of signatures that should be excluded from the results based on
        // `until` signature
        let mut get_until_slot_timer = Measure::start("get_until_slot_timer");
        let (lowest_slot, until_excluded_signatures) = match until {
            None => (first_available_block, HashSet::new()),
            Some(until) => {
                let transaction_status =
                    self.get_transaction_status(until, &confirmed_unrooted_slots)?;
                match transaction_status {
                    None => (first_available_block, HashSet::new()),
                    Some((slot, _)) => {
                        let mut slot_signatures = self.get_block_signatures(slot)?;
                        if let Some(pos) = slot_signatures.iter().position(|&x| x == until) {
                            slot_signatures.truncate(pos + 1);
                        }

                        (slot, slot_signatures.into_iter().collect::<HashSet<_>>())
                    }
                }
            }
        };
        get_until_slot_timer.stop();

        // Fetch the list of signatures that affect the given address
        let mut address_signatures = vec![];

        // Get signatures in `slot`
        let mut get_initial_slot_timer = Measure::start("get_initial_slot_timer");
        let mut signatures = self.find_address_signatures_for_slot(address, slot)?;
        signatures.reverse();
        if let Some(excluded_signatures) = before_excluded_signatures.take() {
            address_signatures.extend(
                signatures
                    .into_iter()
                    .filter(|(_, signature)| !excluded_signatures.contains(signature)),
            )
        } else {
            address_signatures.append(&mut signatures);
        }
        get_initial_slot_timer.stop();

        // Iterate through the previous slots in reverse until the limit is
        // reached
        let mut address_signatures_iter_timer = Measure::start("address_signatures_iter_timer");
        let (lock, _) = self.ensure_lowest_cleanup_slot();
        let mut iterator = self.address_signatures_cf.iter(IteratorMode::From(
            // Ragged seek: the minimal key of `slot` places the reverse
            // iterator at the last entry of an earlier slot
            (address, slot, 0, Signature::default()),
            IteratorDirection::Reverse,
        ))?;
        while address_signatures.len() < limit {
            if let Some(((key_address, key_slot, _transaction_index, signature), _)) =
                iterator.next()
            {
                if key_address != address || key_slot < lowest_slot {
                    break;
                }
                if key_slot >= slot {
                    continue;
                }
                if self.is_root(key_slot) || confirmed_unrooted_slots.contains(&key_slot) {
                    address_signatures.push((key_slot, signature));
                }
                continue;
            }
            break;
        }
        drop(lock);
        address_signatures_iter_timer.stop();

        let mut address_signatures: Vec<(Slot, Signature)> = address_signatures
            .into_iter()
            .filter(|(_, signature)| !until_excluded_signatures.contains(signature))
            .collect();
        address_signatures.truncate(limit);

        // Fill in the status information for each found transaction
        let mut get_status_info_timer = Measure::start("get_status_info_timer");
        let mut infos = vec![];
        for (slot, signature) in address_signatures.into_iter() {
            let transaction_status =
                self.get_transaction_status(signature, &confirmed_unrooted_slots)?;
            let err = transaction_status.and_then(|(_slot, status)| status.status.err());
            let memo = self.read_transaction_memos(signature)?;
            let block_time = self.get_block_time(slot)?;
            infos.push(ConfirmedTransactionStatusWithSignature {
                signature,
                slot,
                err,
                memo,
                block_time,
            });
        }
        get_status_info_timer.stop();

        datapoint_info!(
            "blockstore-get-conf-sigs-for-addr",
            (
                "get_before_slot_us",
                get_before_slot_timer.as_us() as i64,
                i64
            ),
            (
                "get_initial_slot_us",
                get_initial_slot_timer.as_us() as i64,
                i64
            ),
            (
                "address_signatures_iter_us",
                address_signatures_iter_timer.as_us() as i64,
                i64
            ),
            (
                "get_status_info_us",
                get_status_info_timer.as_us() as i64,
                i64
            ),
            (
                "get_until_slot_us",
                get_until_slot_timer.as_us() as i64,
                i64
            )
        );

        Ok(SignatureInfosForAddress {
            infos,
            found_before: true, // if `before` signature was not found, this method returned early
        })
    }

    pub fn read_rewards(&self, index: Slot) -> Result<Option<Rewards>> {
        self.rewards_cf
            .get(index)
            .map(|result| result.map(|option| option.rewards))
    }

    pub fn write_rewards(&self, index: Slot, rewards: RewardsAndNumPartitions) -> Result<()> {
        self.rewards_cf.put(index, &rewards)
    }

    pub fn get_recent_perf_samples(&self, num: usize) -> Result<Vec<(Slot, PerfSample)>> {
        self.db
            .iter::<cf::PerfSamples>(IteratorMode::End)?
            .take(num)
            .map(|(slot, data)| {
                let perf_sample: PerfSample = deserialize(&data)?;
                Ok((slot, perf_sample))
            })
            .collect()
    }

    pub fn write_perf_sample(&self, index: Slot, perf_sample: &PerfSample) -> Result<()> {
        self.perf_samples_cf.put(index, perf_sample)
    }

    pub fn read_program_costs(&self) -> Result<Vec<(Pubkey, u64)>> {
        self.db
            .iter::<cf::ProgramCosts>(IteratorMode::End)?
            .map(|(pubkey, data)| {
                let program_cost: ProgramCost = deserialize(&data)?;
                Ok((pubkey, program_cost.cost))
            })
            .collect()
    }

    pub fn write_program_cost(&self, key: &Pubkey, value: &u64) -> Result<()> {
        self.program_costs_cf
            .put(*key, &ProgramCost { cost: *value })
    }

    pub fn delete_program_cost(&self, key: &Pubkey) -> Result<()> {
        self.program_costs_cf.delete(*key)
    }

    /// Returns the entry vector for the slot starting with `shred_start_index`
    pub fn get_slot_entries(&self, slot: Slot, shred_start_index: u64) -> Result<Vec<Entry>> {
        self.get_slot_entries_with_shred_info(slot, shred_start_index, false)
            .map(|x| x.0)
    }

    /// Returns the entry vector for the slot starting with `shred_start_index`, the number of
    /// shreds that comprise the entry vector, and whether the slot is full (consumed all shreds).
    pub fn get_slot_entries_with_shred_info(
        &self,
        slot: Slot,
        start_index: u64,
        allow_dead_slots: bool,
    ) -> Result<(Vec<Entry>, u64, bool)> {
        let (completed_ranges, slot_meta) = self.get_completed_ranges(slot, start_index)?;

        // Check if the slot is dead *after* fetching completed ranges to avoid a race
        // where a slot is marked dead by another thread before the completed range query finishes.
        // This should be sufficient because full slots will never be marked dead from another thread,
        // this can only happen during entry processing during replay stage.
        if self.is_dead(slot) && !allow_dead_slots {
            return Err(BlockstoreError::DeadSlot);
        } else if completed_ranges.is_empty() {
            return Ok((vec![], 0, false));
        }

        let slot_meta = slot_meta.unwrap();
        let num_shreds = completed_ranges
            .last()
            .map(|(_, end_index)| u64::from(*end_index) - start_index + 1)
            .unwrap_or(0);

        let entries: Result<Vec<Vec<Entry>>> = completed_ranges
            .into_iter()
            .map(|(start_index, end_index)| {
                self.get_entries_in_data_block(slot, start_index, end_index, Some(&slot_meta))
            })
            .collect();
        let entries: Vec<Entry> = entries?.into_iter().flatten().collect();
        Ok((entries, num_shreds, slot_meta.is_full()))
    }

    fn get_completed_ranges(
        &self,
        slot: Slot,
        start_index: u64,
    ) -> Result<(CompletedRanges, Option<SlotMeta>)> {
        let _lock = self.check_lowest_cleanup_slot(slot)?;

        let slot_meta = self.meta_cf.get(slot)?;
        if slot_meta.is_none() {
            return Ok((vec![], slot_meta));
        }

        let slot_meta = slot_meta.unwrap();
        // Find all the ranges for the completed data blocks
        let completed_ranges = Self::get_completed_data_ranges(
            start_index as u32,
            &slot_meta.completed_data_indexes,
            slot_meta.consumed as u32,
        );

        Ok((completed_ranges, Some(slot_meta)))
    }

    // Get the range of indexes [start_index, end_index] of every completed data block
    fn get_completed_data_ranges(
        start_index: u32,
        completed_data_indexes: &BTreeSet<u32>,
        consumed: u32,
    ) -> CompletedRanges {
        // `consumed` is the next missing shred index, but shred `i` existing in
        // completed_data_end_indexes implies it's not missing
        assert!(!completed_data_indexes.contains(&consumed));
        completed_data_indexes
            .range(start_index..consumed)
            .scan(start_index, |begin, index| {
                let out = (*begin, *index);
                *begin = index + 1;
                Some(out)
            })
            .collect()
    }

    pub fn get_entries_in_data_block(
        &self,
        slot: Slot,
        start_index: u32,
        end_index: u32,
        slot_meta: Option<&SlotMeta>,
    ) -> Result<Vec<Entry>> {
        let keys: Vec<(Slot, u64)> = (start_index..=end_index)
            .map(|index| (slot, u64::from(index)))
            .collect();

        let data_shreds: Result<Vec<Option<Vec<u8>>>> = self
            .data_shred_cf
            .multi_get_bytes(keys)
            .into_iter()
            .collect();
        let data_shreds = data_shreds?;

        let data_shreds: Result<Vec<Shred>> = data_shreds
            .into_iter()
            .enumerate()
            .map(|(idx, shred_bytes)| {
                let index = start_index as usize + idx;
                let Some(shred_bytes) = shred_bytes else {
                    if let Some(slot_meta) = slot_meta {
                        if slot > self.lowest_cleanup_slot() {
                            return Err(BlockstoreError::CorruptedBlockstore(format!(
                                "Shred with slot: {}, index: {}, consumed: {}, completed_indexes: \
                                 {:?} must exist if shred index was included in a range: {} {}",
                                slot,
                                index,
                                slot_meta.consumed,
                                slot_meta.completed_data_indexes,
                                start_index,
                                end_index
                            )));
                        }
                    }
                    return Err(BlockstoreError::InvalidShredData(Box::new(
                        bincode::ErrorKind::Custom(format!(
                            "Missing shred for slot {slot}, index {index}"
                        )),
                    )));
                };
                Shred::new_from_serialized_shred(shred_bytes).map_err(|err| {
                    BlockstoreError::InvalidShredData(Box::new(bincode::ErrorKind::Custom(
                        format!("Could not reconstruct shred from shred payload: {err:?}"),
                    )))
                })
            })
            .collect();
        let data_shreds = data_shreds?;
        let last_shred = data_shreds.last().unwrap();
        assert!(last_shred.data_complete() || last_shred.last_in_slot());

        let deshred_payload = shred::deshred(&data_shreds).map_err(|e| {
            BlockstoreError::InvalidShredData(Box::new(bincode::ErrorKind::Custom(format!(
                "Could not reconstruct data block from constituent shreds, error: {e:?}"
            ))))
        })?;

        debug!("{:?} shreds in last FEC set", data_shreds.len());
        bincode::deserialize::<Vec<Entry>>(&deshred_payload).map_err(|e| {
            BlockstoreError::InvalidShredData(Box::new(bincode::ErrorKind::Custom(format!(
                "could not reconstruct entries: {e:?}"
            ))))
        })
    }

    // Returns slots connecting to any element of the list `slots`.
    pub fn get_slots_since(&self, slots: &[Slot]) -> Result<HashMap<Slot, Vec<Slot>>> {
        let slot_metas: Result<Vec<Option<SlotMeta>>> =
            self.meta_cf.multi_get(slots.to_vec()).into_iter().collect();
        let slot_metas = slot_metas?;

        let result: HashMap<Slot, Vec<Slot>> = slots
            .iter()
            .zip(slot_metas)
            .filter_map(|(slot, meta)| meta.map(|meta| (*slot, meta.next_slots)))
            .collect();

        Ok(result)
    }

    pub fn is_root(&self, slot: Slot) -> bool {
        matches!(self.roots_cf.get(slot), Ok(Some(true)))
    }

    /// Returns true if a slot is between the rooted slot bounds of the ledger, but has not itself
    /// been rooted. This is either because the slot was skipped, or due to a gap in ledger data,
    /// as when booting from a newer snapshot.
    pub fn is_skipped(&self, slot: Slot) -> bool {
        let lowest_root = self
            .rooted_slot_iterator(0)
            .ok()
            .and_then(|mut iter| iter.next())
            .unwrap_or_default();
        match self.roots_cf.get(slot).ok().flatten() {
            Some(_) => false,
            None => slot < self.max_root() && slot > lowest_root,
        }
    }

    pub fn set_roots<'a>(&self, rooted_slots: impl Iterator<Item = &'a Slot>) -> Result<()> {
        let mut write_batch = self.db.batch()?;
        let mut max_new_rooted_slot = 0;
        for slot in rooted_slots {
            max_new_rooted_slot = cmp::max(max_new_rooted_slot, *slot);
            write_batch.put::<cf::Root>(*slot, &true)?;
        }

        self.db.write(write_batch)?;
        self.max_root.fetch_max(max_new_rooted_slot, Ordering::Relaxed);
        Ok(())
    }

    pub fn insert_bank_hash(&self, slot: Slot, frozen_hash: Hash, is_duplicate_confirmed: bool) {
        if let Some(prev_value) = self.bank_hash_cf.get(slot).unwrap() {
            if prev_value.frozen_hash() == frozen_hash && prev_value.is_duplicate_confirmed() {
                // Don't overwrite is_duplicate_confirmed == true with is_duplicate_confirmed == false,
                // which may happen on startup when processing from blockstore processor because the
                // blocks may not reflect earlier observed gossip votes from before the restart.
                return;
            }
        }
        let data = FrozenHashVersioned::Current(FrozenHashStatus {
            frozen_hash,
            is_duplicate_confirmed,
        });
        self.bank_hash_cf.put(slot, &data).unwrap()
    }

    pub fn get_bank_hash(&self, slot: Slot) -> Option<Hash> {
        self.bank_hash_cf
            .get(slot)
            .unwrap()
            .map(|versioned| versioned.frozen_hash())
    }

    pub fn is_duplicate_confirmed(&self, slot: Slot) -> bool {
        self.bank_hash_cf
            .get(slot)
            .unwrap()
            .map(|versioned| versioned.is_duplicate_confirmed())
            .unwrap_or(false)
    }

    pub fn insert_optimistic_slot(
        &self,
        slot: Slot,
        hash: &Hash,
        timestamp: UnixTimestamp,
    ) -> Result<()> {
        let slot_data = OptimisticSlotMetaVersioned::new(*hash, timestamp);
        self.optimistic_slots_cf.put(slot, &slot_data)
    }

    /// The hash and timestamp a slot received optimistic confirmation with.
    pub fn get_optimistic_slot(&self, slot: Slot) -> Result<Option<(Hash, UnixTimestamp)>> {
        Ok(self
            .optimistic_slots_cf
            .get(slot)?
            .map(|meta| (meta.hash(), meta.timestamp())))
    }

    /// Returns information about the `num` latest optimistically confirmed slot
    pub fn get_latest_optimistic_slots(
        &self,
        num: usize,
    ) -> Result<Vec<(Slot, Hash, UnixTimestamp)>> {
        Ok(self.reversed_optimistic_slots_iterator()?.take(num).collect())
    }

    pub fn is_dead(&self, slot: Slot) -> bool {
        matches!(
            self.dead_slots_cf
                .get(slot)
                .expect("fetch from DeadSlots column family failed"),
            Some(true)
        )
    }

    pub fn set_dead_slot(&self, slot: Slot) -> Result<()> {
        self.dead_slots_cf.put(slot, &true)
    }

    pub fn remove_dead_slot(&self, slot: Slot) -> Result<()> {
        self.dead_slots_cf.delete(slot)
    }

    pub fn store_duplicate_if_not_existing(
        &self,
        slot: Slot,
        shred1: Vec<u8>,
        shred2: Vec<u8>,
    ) -> Result<()> {
        if !self.has_duplicate_shreds_in_slot(slot) {
            self.store_duplicate_slot(slot, shred1, shred2)
        } else {
            Ok(())
        }
    }

    pub fn store_duplicate_slot(&self, slot: Slot, shred1: Vec<u8>, shred2: Vec<u8>) -> Result<()> {
        let duplicate_slot_proof = DuplicateSlotProof::new(shred1, shred2);
        self.duplicate_slots_cf.put(slot, &duplicate_slot_proof)
    }

    pub fn get_duplicate_slot(&self, slot: u64) -> Option<DuplicateSlotProof> {
        self.duplicate_slots_cf
            .get(slot)
            .expect("fetch from DuplicateSlots column family failed")
    }

    /// The first duplicate-slot proof in the ledger, if any slot has one.
    pub fn get_first_duplicate_proof(&self) -> Option<(Slot, DuplicateSlotProof)> {
        let mut iter = self
            .db
            .iter::<cf::DuplicateSlots>(IteratorMode::From(0, IteratorDirection::Forward))
            .unwrap();
        iter.next()
            .map(|(slot, proof_bytes)| (slot, deserialize(&proof_bytes).unwrap()))
    }

    pub fn has_duplicate_shreds_in_slot(&self, slot: Slot) -> bool {
        self.duplicate_slots_cf
            .get(slot)
            .expect("fetch from DuplicateSlots column family failed")
            .is_some()
    }

    // `shred` is assumed to have slot and index equal to the given slot and index.
    // Returns the existing shred if `new_shred` is not equal to the existing shred at the
    // given slot and index as this implies the leader generated two different shreds with
    // the same slot and index
    pub fn is_shred_duplicate(&self, shred: &Shred) -> Option<Vec<u8>> {
        let (slot, index, shred_type) = shred.id().unwrap();
        let mut other_payload = match shred_type {
            ShredType::Data => self.get_data_shred(slot, u64::from(index)),
            ShredType::Code => self.get_coding_shred(slot, u64::from(index)),
        }
        .expect("fetch from ShredData/ShredCode column family failed")?;
        if let Ok(signature) = shred.retransmitter_signature() {
            if let Err(err) = shred::layout::set_retransmitter_signature(&mut other_payload, &signature)
            {
                error!("set retransmitter signature failed: {err:?}");
            }
        }
        (other_payload != *shred.payload()).then_some(other_payload)
    }

    // find the first available slot in blockstore that has some data in it
    pub fn lowest_slot(&self) -> Slot {
        for (slot, meta) in self
            .slot_meta_iterator(0)
            .expect("unable to iterate over meta")
        {
            if slot > 0 && meta.received > 0 {
                return slot;
            }
        }
        // This means blockstore is empty, should never get here aside from right at boot.
        self.max_root()
    }

    fn lowest_slot_with_genesis(&self) -> Slot {
        for (slot, meta) in self
            .slot_meta_iterator(0)
            .expect("unable to iterate over meta")
        {
            if meta.received > 0 {
                return slot;
            }
        }
        // This means blockstore is empty, should never get here aside from right at boot.
        self.max_root()
    }

    /// Returns the highest available slot in the blockstore
    pub fn highest_slot(&self) -> Result<Option<Slot>> {
        let highest_slot = self
            .db
            .iter::<cf::SlotMeta>(IteratorMode::End)?
            .next()
            .map(|(slot, _)| slot);
        Ok(highest_slot)
    }

    /// Store data shreds (and archive code shreds) into the ledger.
    ///
    /// This is the minimal write surface a read-mostly node needs to populate
    /// its ledger from already-verified shreds; the full insertion pipeline
    /// with erasure recovery and duplicate detection lives upstream of this
    /// store.
    pub fn insert_shreds(&self, shreds: Vec<Shred>) -> Result<()> {
        let _lock = self.insert_shreds_lock.lock().unwrap();
        let mut write_batch = self.db.batch()?;

        let mut just_inserted: HashSet<(Slot, u64)> = HashSet::new();
        let mut slot_metas: HashMap<Slot, SlotMeta> = HashMap::new();

        for shred in &shreds {
            let slot = shred.slot();
            let index = u64::from(shred.index());
            if !shred.is_data() {
                write_batch.put_bytes::<cf::ShredCode>((slot, index), shred.payload())?;
                continue;
            }

            if !slot_metas.contains_key(&slot) {
                let meta = self
                    .meta(slot)?
                    .unwrap_or_else(|| SlotMeta::new(slot, shred.parent().ok().flatten()));
                slot_metas.insert(slot, meta);
            }
            let meta = slot_metas.get_mut(&slot).unwrap();
            if meta.first_shred_timestamp == 0 {
                meta.first_shred_timestamp = timestamp();
            }
            meta.received = cmp::max(meta.received, index + 1);
            if shred.data_complete() || shred.last_in_slot() {
                meta.completed_data_indexes.insert(shred.index());
            }
            if shred.last_in_slot() {
                meta.last_index = Some(index);
            }
            write_batch.put_bytes::<cf::ShredData>((slot, index), shred.payload())?;
            just_inserted.insert((slot, index));
        }

        // Advance `consumed` and chain each slot to its parent
        let slots: Vec<Slot> = slot_metas.keys().copied().collect();
        for slot in slots {
            let meta = slot_metas.get_mut(&slot).unwrap();
            while just_inserted.contains(&(slot, meta.consumed))
                || self
                    .data_shred_cf
                    .get_bytes((slot, meta.consumed))?
                    .is_some()
            {
                meta.consumed += 1;
            }

            let Some(parent_slot) = meta.parent_slot else {
                continue;
            };
            if let Some(parent_meta) = slot_metas.get_mut(&parent_slot) {
                if !parent_meta.next_slots.contains(&slot) {
                    parent_meta.next_slots.push(slot);
                }
            } else {
                let mut parent_meta = self
                    .meta(parent_slot)?
                    .unwrap_or_else(|| SlotMeta::new_orphan(parent_slot));
                if !parent_meta.next_slots.contains(&slot) {
                    parent_meta.next_slots.push(slot);
                    slot_metas.insert(parent_slot, parent_meta);
                }
            }
        }

        for (slot, meta) in slot_metas.iter() {
            write_batch.put::<cf::SlotMeta>(*slot, meta)?;
        }

        self.db.write(write_batch)?;
        Ok(())
    }
}

fn get_last_hash<'a>(iterator: impl Iterator<Item = &'a Entry>) -> Option<Hash> {
    iterator.last().map(|entry| entry.hash)
}

#[macro_export]
macro_rules! tmp_ledger_name {
    () => {
        &format!("{}-{}", file!(), line!())
    };
}

#[macro_export]
macro_rules! get_tmp_ledger_path_auto_delete {
    () => {
        $crate::blockstore::get_ledger_path_from_name_auto_delete($crate::tmp_ledger_name!())
    };
}

pub fn get_ledger_path_from_name_auto_delete(name: &str) -> TempDir {
    let mut path = [
        std::env::var("FARF_DIR").unwrap_or_else(|_| "farf".to_string()),
        name.to_string(),
    ]
    .iter()
    .collect::<PathBuf>();
    // path is a directory so .file_name() returns the last component of the path
    let last = path.file_name().unwrap().to_str().unwrap().to_string();
    path.pop();
    fs::create_dir_all(&path).unwrap();
    Builder::new()
        .prefix(&last)
        .rand_bytes(0)
        .tempdir_in(path)
        .unwrap()
}

pub fn entries_to_test_shreds(
    entries: &[Entry],
    slot: Slot,
    parent_slot: Slot,
    is_full_slot: bool,
    next_shred_index: u32,
) -> Vec<Shred> {
    shred::entries_to_data_shreds(
        entries,
        slot,
        parent_slot,
        is_full_slot,
        0, // reference_tick
        next_shred_index,
    )
}

// used for tests only
pub fn make_slot_entries(
    slot: Slot,
    parent_slot: Slot,
    num_entries: u64,
) -> (Vec<Shred>, Vec<Entry>) {
    let entries = create_ticks(num_entries, /*hashes_per_tick:*/ 1, Hash::new_unique());
    let shreds = entries_to_test_shreds(&entries, slot, parent_slot, true, 0);
    (shreds, entries)
}

// used for tests only
// Create `num_transactions` transactions, each in its own entry and chased by
// a tick entry.
pub fn make_slot_entries_with_transactions(num_transactions: u64) -> Vec<Entry> {
    let mut hash = Hash::default();
    let mut entries: Vec<Entry> = Vec::new();
    for _ in 0..num_transactions {
        let transaction = VersionedTransaction::new_unique();
        let entry = next_entry(&hash, 1, vec![transaction]);
        hash = entry.hash;
        entries.push(entry);
        let mut ticks = create_ticks(1, 1, hash);
        hash = ticks.last().unwrap().hash;
        entries.append(&mut ticks);
    }
    entries
}

#[cfg(test)]
pub mod tests {
    use {
        super::*,
        crate::get_tmp_ledger_path_auto_delete,
        ridgeline_sdk::transaction::TransactionError,
        ridgeline_transaction_status::{Reward, RewardType},
    };

    fn write_default_status(
        blockstore: &Blockstore,
        slot: Slot,
        transaction: &VersionedTransaction,
        address: &Pubkey,
        transaction_index: usize,
    ) {
        blockstore
            .write_transaction_status(
                slot,
                transaction.signatures[0],
                vec![address],
                vec![],
                TransactionStatusMeta::default(),
                transaction_index,
            )
            .unwrap();
    }

    // Insert a full slot of transaction-bearing entries and record a status
    // for each transaction under `address`.
    fn setup_transaction_slot(
        blockstore: &Blockstore,
        slot: Slot,
        parent_slot: Slot,
        address: &Pubkey,
    ) -> Vec<Entry> {
        let entries = make_slot_entries_with_transactions(2);
        let shreds = entries_to_test_shreds(&entries, slot, parent_slot, true, 0);
        blockstore.insert_shreds(shreds).unwrap();
        for (transaction_index, transaction) in entries
            .iter()
            .flat_map(|entry| entry.transactions.iter())
            .enumerate()
        {
            write_default_status(blockstore, slot, transaction, address, transaction_index);
        }
        entries
    }

    fn slot_signatures(entries: &[Entry]) -> Vec<Signature> {
        entries
            .iter()
            .flat_map(|entry| entry.transactions.iter())
            .map(|transaction| transaction.signatures[0])
            .collect()
    }

    #[test]
    fn test_insert_shreds_builds_meta() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let (shreds, entries) = make_slot_entries(2, 1, 10);
        let num_shreds = shreds.len() as u64;
        blockstore.insert_shreds(shreds).unwrap();

        let meta = blockstore.meta(2).unwrap().unwrap();
        assert_eq!(meta.slot, 2);
        assert_eq!(meta.parent_slot, Some(1));
        assert_eq!(meta.consumed, num_shreds);
        assert_eq!(meta.received, num_shreds);
        assert_eq!(meta.last_index, Some(num_shreds - 1));
        assert!(meta.is_full());
        assert!(blockstore.is_full(2));
        assert!(meta
            .completed_data_indexes
            .contains(&((num_shreds - 1) as u32)));

        // parent orphan meta chains to the child
        let parent_meta = blockstore.meta(1).unwrap().unwrap();
        assert_eq!(parent_meta.next_slots, vec![2]);
        assert!(!blockstore.is_full(1));

        assert_eq!(blockstore.get_slot_entries(2, 0).unwrap(), entries);
    }

    #[test]
    fn test_is_full_and_slot_range_connected() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        for slot in 1..=3 {
            let (shreds, _) = make_slot_entries(slot, slot - 1, 4);
            blockstore.insert_shreds(shreds).unwrap();
        }
        assert!(blockstore.slot_range_connected(1, 3));

        // un-full slot 2 breaks the range
        let mut meta = blockstore.meta(2).unwrap().unwrap();
        meta.last_index = None;
        blockstore.put_meta(2, &meta).unwrap();
        assert!(!blockstore.slot_range_connected(1, 3));
    }

    #[test]
    fn test_slot_range_connected_same_slot() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        // even an absent slot is considered connected to itself
        assert!(blockstore.slot_range_connected(54, 54));
    }

    #[test]
    fn test_slot_range_connected_unknown_start() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        assert!(!blockstore.slot_range_connected(1, 3));
    }

    #[test]
    fn test_find_missing_data_indexes() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let slot = 10;
        let shreds: Vec<Shred> = [0, 2, 5]
            .iter()
            .map(|index| {
                Shred::new_from_data(
                    slot, *index, 1,    // parent_offset
                    &[9; 10], false, false, 0, 0, 0,
                )
            })
            .collect();
        blockstore.insert_shreds(shreds).unwrap();

        assert_eq!(
            blockstore
                .find_missing_data_indexes(slot, 0, 0, 0, 6, 10)
                .unwrap(),
            vec![1, 3, 4]
        );
        assert_eq!(
            blockstore
                .find_missing_data_indexes(slot, 0, 0, 0, 6, 2)
                .unwrap(),
            vec![1, 3]
        );

        // empty ranges and a zero budget short circuit
        assert!(blockstore
            .find_missing_data_indexes(slot, 0, 0, 6, 6, 10)
            .unwrap()
            .is_empty());
        assert!(blockstore
            .find_missing_data_indexes(slot, 0, 0, 4, 3, 10)
            .unwrap()
            .is_empty());
        assert!(blockstore
            .find_missing_data_indexes(slot, 0, 0, 0, 6, 0)
            .unwrap()
            .is_empty());

        // holes above a shred that has not yet timed out are not reported
        assert!(blockstore
            .find_missing_data_indexes(
                slot,
                timestamp(), // first_timestamp
                DEFAULT_TICKS_PER_SECOND,
                0,
                6,
                10
            )
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_find_missing_data_indexes_past_slot_end() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        // a shred in a higher slot bounds the scan of an empty slot
        let shred = Shred::new_from_data(11, 0, 1, &[9; 10], false, false, 0, 0, 0);
        blockstore.insert_shreds(vec![shred]).unwrap();

        assert_eq!(
            blockstore
                .find_missing_data_indexes(10, 0, 0, 0, 3, 10)
                .unwrap(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_get_first_available_block() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();
        assert_eq!(blockstore.get_first_available_block().unwrap(), 0);

        let (shreds, _) = make_slot_entries(5, 4, 4);
        blockstore.insert_shreds(shreds).unwrap();
        blockstore.set_roots([5, 7, 9].iter()).unwrap();

        // the first root is missing its parent-blockhash dependency, so the
        // second qualifies
        assert_eq!(blockstore.get_first_available_block().unwrap(), 7);
    }

    #[test]
    fn test_get_first_available_block_genesis() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let entries = create_ticks(4, 1, Hash::default());
        let shreds = entries_to_test_shreds(&entries, 0, 0, true, 0);
        blockstore.insert_shreds(shreds).unwrap();
        blockstore.set_roots([0, 1].iter()).unwrap();

        // genesis is always complete
        assert_eq!(blockstore.get_first_available_block().unwrap(), 0);
    }

    #[test]
    fn test_is_skipped() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        blockstore.set_roots([1, 5].iter()).unwrap();
        assert_eq!(blockstore.max_root(), 5);

        assert!(blockstore.is_skipped(3));
        assert!(!blockstore.is_skipped(5));
        assert!(!blockstore.is_skipped(0));
        assert!(!blockstore.is_skipped(1));
        assert!(!blockstore.is_skipped(6));
    }

    #[test]
    fn test_max_root_is_monotonic() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        assert_eq!(blockstore.max_root(), 0);
        blockstore.set_roots([7].iter()).unwrap();
        assert_eq!(blockstore.max_root(), 7);
        blockstore.set_roots([3].iter()).unwrap();
        assert_eq!(blockstore.max_root(), 7);
    }

    #[test]
    fn test_get_transaction_status_respects_roots() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let address = Pubkey::new_unique();
        let transaction = VersionedTransaction::new_unique();
        let signature = transaction.signatures[0];
        write_default_status(&blockstore, 4, &transaction, &address, 0);

        // neither rooted nor optimistically confirmed
        let (status, counter) = blockstore
            .get_transaction_status_with_counter(signature, &[])
            .unwrap();
        assert_eq!(status, None);
        assert_eq!(counter, 1);

        // optimistically confirmed
        let (status, counter) = blockstore
            .get_transaction_status_with_counter(signature, &[4])
            .unwrap();
        assert_eq!(status.unwrap().0, 4);
        assert_eq!(counter, 1);

        // rooted
        blockstore.set_roots([4].iter()).unwrap();
        let (status, _) = blockstore
            .get_transaction_status_with_counter(signature, &[])
            .unwrap();
        assert_eq!(status.unwrap().0, 4);

        // unknown signature
        assert_eq!(
            blockstore
                .get_transaction_status(Signature::new_unique(), &[])
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_get_rooted_block() {
        ridgeline_logger::setup();
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();
        let address = Pubkey::new_unique();

        let (parent_shreds, parent_entries) = make_slot_entries(1, 0, 6);
        blockstore.insert_shreds(parent_shreds).unwrap();
        let entries = setup_transaction_slot(&blockstore, 2, 1, &address);

        // not yet rooted
        assert!(matches!(
            blockstore.get_rooted_block(2, true),
            Err(BlockstoreError::SlotNotRooted)
        ));

        blockstore.set_roots([1, 2].iter()).unwrap();
        blockstore.cache_block_time(2, 100).unwrap();
        blockstore.cache_block_height(2, 1).unwrap();
        let rewards = RewardsAndNumPartitions {
            rewards: vec![Reward {
                pubkey: address,
                lamports: 42,
                post_balance: 42,
                reward_type: Some(RewardType::Fee),
                commission: None,
            }],
            num_partitions: None,
        };
        blockstore.write_rewards(2, rewards.clone()).unwrap();

        let block = blockstore.get_rooted_block(2, true).unwrap();
        assert_eq!(block.parent_slot, 1);
        assert_eq!(block.blockhash, entries.last().unwrap().hash);
        assert_eq!(
            block.previous_blockhash,
            parent_entries.last().unwrap().hash
        );
        assert_eq!(
            block.transactions.len(),
            entries
                .iter()
                .map(|entry| entry.transactions.len())
                .sum::<usize>()
        );
        assert_eq!(block.block_time, Some(100));
        assert_eq!(block.block_height, Some(1));
        assert_eq!(block.rewards, rewards.rewards);

        // re-reading an unchanged block yields the same composite value
        assert_eq!(blockstore.get_rooted_block(2, true).unwrap(), block);

        // per-entry summaries carry a running transaction index
        let with_entries = blockstore.get_rooted_block_with_entries(2, true).unwrap();
        assert_eq!(with_entries.block, block);
        assert_eq!(with_entries.entries.len(), entries.len());
        let mut running_index = 0;
        for (summary, entry) in with_entries.entries.iter().zip(entries.iter()) {
            assert_eq!(summary.hash, entry.hash);
            assert_eq!(summary.num_hashes, entry.num_hashes);
            assert_eq!(summary.num_transactions, entry.transactions.len() as u64);
            assert_eq!(summary.starting_transaction_index, running_index);
            running_index += entry.transactions.len();
        }
    }

    #[test]
    fn test_get_complete_block_without_parent() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();
        let address = Pubkey::new_unique();

        // slot 7 is full, but its parent was never observed
        let entries = setup_transaction_slot(&blockstore, 7, 6, &address);

        assert!(matches!(
            blockstore.get_complete_block(7, true),
            Err(BlockstoreError::ParentEntriesUnavailable)
        ));

        let block = blockstore.get_complete_block(7, false).unwrap();
        assert_eq!(block.previous_blockhash, Hash::default());
        assert_eq!(block.blockhash, entries.last().unwrap().hash);
    }

    #[test]
    fn test_get_complete_block_genesis() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        // genesis has no parent at all
        let entries = create_ticks(4, 1, Hash::default());
        let shreds = entries_to_test_shreds(&entries, 0, 0, true, 0);
        blockstore.insert_shreds(shreds).unwrap();

        let block = blockstore.get_complete_block(0, false).unwrap();
        assert_eq!(block.previous_blockhash, Hash::default());
        assert_eq!(block.parent_slot, 0);
        assert!(block.transactions.is_empty());

        assert!(matches!(
            blockstore.get_complete_block(0, true),
            Err(BlockstoreError::ParentEntriesUnavailable)
        ));
    }

    #[test]
    fn test_get_complete_block_not_full() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let entries = create_ticks(4, 1, Hash::new_unique());
        let shreds = entries_to_test_shreds(&entries, 3, 2, /*is_full_slot:*/ false, 0);
        blockstore.insert_shreds(shreds).unwrap();

        assert!(matches!(
            blockstore.get_complete_block(3, false),
            Err(BlockstoreError::SlotUnavailable)
        ));
        // absent slot behaves the same
        assert!(matches!(
            blockstore.get_complete_block(33, false),
            Err(BlockstoreError::SlotUnavailable)
        ));
    }

    #[test]
    fn test_get_complete_block_missing_metadata() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let entries = make_slot_entries_with_transactions(1);
        let shreds = entries_to_test_shreds(&entries, 9, 8, true, 0);
        blockstore.insert_shreds(shreds).unwrap();

        assert!(matches!(
            blockstore.get_complete_block(9, false),
            Err(BlockstoreError::MissingTransactionMetadata)
        ));
    }

    #[test]
    fn test_dead_slot_ordering() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let (shreds, entries) = make_slot_entries(5, 4, 4);
        blockstore.insert_shreds(shreds).unwrap();
        blockstore.set_dead_slot(5).unwrap();
        assert!(blockstore.is_dead(5));

        assert!(matches!(
            blockstore.get_slot_entries(5, 0),
            Err(BlockstoreError::DeadSlot)
        ));
        let (dead_entries, num_shreds, is_full) = blockstore
            .get_slot_entries_with_shred_info(5, 0, /*allow_dead_slots:*/ true)
            .unwrap();
        assert_eq!(dead_entries, entries);
        assert!(num_shreds > 0);
        assert!(is_full);

        blockstore.remove_dead_slot(5).unwrap();
        assert!(!blockstore.is_dead(5));
        assert_eq!(blockstore.get_slot_entries(5, 0).unwrap(), entries);
    }

    #[test]
    fn test_slot_cleaned_up() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let (shreds, _) = make_slot_entries(5, 4, 4);
        blockstore.insert_shreds(shreds).unwrap();

        blockstore.set_lowest_cleanup_slot(5);
        assert!(matches!(
            blockstore.get_slot_entries(5, 0),
            Err(BlockstoreError::SlotCleanedUp)
        ));
        assert!(matches!(
            blockstore.get_block_time(5),
            Err(BlockstoreError::SlotCleanedUp)
        ));
        assert!(matches!(
            blockstore.get_rooted_block(5, false),
            Err(BlockstoreError::SlotCleanedUp)
        ));

        // slots above the cleanup floor stay readable
        assert!(blockstore.get_block_time(6).unwrap().is_none());
    }

    #[test]
    fn test_get_complete_transaction() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();
        let address = Pubkey::new_unique();

        let (parent_shreds, _) = make_slot_entries(1, 0, 6);
        blockstore.insert_shreds(parent_shreds).unwrap();
        let rooted_entries = setup_transaction_slot(&blockstore, 2, 1, &address);
        blockstore.set_roots([1, 2].iter()).unwrap();
        // slot 3 is confirmed but not rooted
        let unrooted_entries = setup_transaction_slot(&blockstore, 3, 2, &address);

        let rooted_signature = slot_signatures(&rooted_entries)[0];
        let unrooted_signature = slot_signatures(&unrooted_entries)[0];

        let confirmed = blockstore
            .get_rooted_transaction(rooted_signature)
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.slot, 2);
        assert_eq!(
            confirmed.tx_with_meta.transaction_signature(),
            &rooted_signature
        );

        // the unrooted transaction is only visible when its slot is within
        // the confirmed ancestry
        assert_eq!(
            blockstore.get_rooted_transaction(unrooted_signature).unwrap(),
            None
        );
        let complete = blockstore
            .get_complete_transaction(unrooted_signature, 3)
            .unwrap()
            .unwrap();
        assert_eq!(complete.slot, 3);

        assert_eq!(
            blockstore
                .get_complete_transaction(Signature::new_unique(), 3)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_get_confirmed_signatures_for_address() {
        ridgeline_logger::setup();
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();
        let address = Pubkey::new_unique();

        let (parent_shreds, _) = make_slot_entries(1, 0, 6);
        blockstore.insert_shreds(parent_shreds).unwrap();
        let slot2_entries = setup_transaction_slot(&blockstore, 2, 1, &address);
        let slot3_entries = setup_transaction_slot(&blockstore, 3, 2, &address);
        blockstore.set_roots([1, 2, 3].iter()).unwrap();

        let slot2_signatures = slot_signatures(&slot2_entries);
        let slot3_signatures = slot_signatures(&slot3_entries);

        let all = blockstore
            .get_confirmed_signatures_for_address(address, 3, None, None, usize::MAX)
            .unwrap();
        assert!(all.found_before);
        let collected: Vec<(Slot, Signature)> = all
            .infos
            .iter()
            .map(|info| (info.slot, info.signature))
            .collect();
        assert_eq!(
            collected,
            vec![
                (3, slot3_signatures[1]),
                (3, slot3_signatures[0]),
                (2, slot2_signatures[1]),
                (2, slot2_signatures[0]),
            ]
        );

        // limit truncates from the newest end
        let limited = blockstore
            .get_confirmed_signatures_for_address(address, 3, None, None, 3)
            .unwrap();
        assert_eq!(limited.infos.len(), 3);
        assert_eq!(limited.infos[0].signature, slot3_signatures[1]);

        // `before` excludes itself and everything newer
        let before = blockstore
            .get_confirmed_signatures_for_address(
                address,
                3,
                Some(slot3_signatures[1]),
                None,
                usize::MAX,
            )
            .unwrap();
        assert!(before.found_before);
        let collected: Vec<Signature> =
            before.infos.iter().map(|info| info.signature).collect();
        assert_eq!(
            collected,
            vec![
                slot3_signatures[0],
                slot2_signatures[1],
                slot2_signatures[0]
            ]
        );

        // `until` excludes itself and everything older
        let until = blockstore
            .get_confirmed_signatures_for_address(
                address,
                3,
                Some(slot3_signatures[1]),
                Some(slot2_signatures[0]),
                usize::MAX,
            )
            .unwrap();
        let collected: Vec<Signature> =
            until.infos.iter().map(|info| info.signature).collect();
        assert_eq!(collected, vec![slot3_signatures[0], slot2_signatures[1]]);

        // an unknown `before` signature short circuits
        let missing = blockstore
            .get_confirmed_signatures_for_address(
                address,
                3,
                Some(Signature::new_unique()),
                None,
                usize::MAX,
            )
            .unwrap();
        assert!(!missing.found_before);
        assert!(missing.infos.is_empty());

        // another address sees nothing
        let other = blockstore
            .get_confirmed_signatures_for_address(
                Pubkey::new_unique(),
                3,
                None,
                None,
                usize::MAX,
            )
            .unwrap();
        assert!(other.infos.is_empty());
    }

    #[test]
    fn test_get_confirmed_signatures_for_address_memos_and_errs() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();
        let address = Pubkey::new_unique();

        let entries = make_slot_entries_with_transactions(1);
        let shreds = entries_to_test_shreds(&entries, 2, 1, true, 0);
        blockstore.insert_shreds(shreds).unwrap();
        let signature = slot_signatures(&entries)[0];
        let status = TransactionStatusMeta {
            status: Err(TransactionError::BlockhashNotFound),
            ..TransactionStatusMeta::default()
        };
        blockstore
            .write_transaction_status(2, signature, vec![&address], vec![], status, 0)
            .unwrap();
        blockstore
            .write_transaction_memos(&signature, "test memo".to_string())
            .unwrap();
        blockstore.set_roots([1, 2].iter()).unwrap();
        blockstore.cache_block_time(2, 123).unwrap();

        let results = blockstore
            .get_confirmed_signatures_for_address(address, 2, None, None, usize::MAX)
            .unwrap();
        let info = &results.infos[0];
        assert_eq!(info.signature, signature);
        assert_eq!(info.err, Some(TransactionError::BlockhashNotFound));
        assert_eq!(info.memo, Some("test memo".to_string()));
        assert_eq!(info.block_time, Some(123));
    }

    #[test]
    fn test_get_completed_data_ranges() {
        let completed_data_indexes: BTreeSet<u32> = [2, 4, 9].iter().copied().collect();

        assert_eq!(
            Blockstore::get_completed_data_ranges(0, &completed_data_indexes, 10),
            vec![(0, 2), (3, 4), (5, 9)]
        );
        assert_eq!(
            Blockstore::get_completed_data_ranges(3, &completed_data_indexes, 10),
            vec![(3, 4), (5, 9)]
        );
        // `consumed` bounds the ranges
        assert_eq!(
            Blockstore::get_completed_data_ranges(0, &completed_data_indexes, 5),
            vec![(0, 2), (3, 4)]
        );
        assert_eq!(
            Blockstore::get_completed_data_ranges(5, &completed_data_indexes, 5),
            vec![]
        );
    }

    #[test]
    #[should_panic]
    fn test_get_completed_data_ranges_consumed_invariant() {
        let completed_data_indexes: BTreeSet<u32> = [2, 4].iter().copied().collect();
        Blockstore::get_completed_data_ranges(0, &completed_data_indexes, 4);
    }

    #[test]
    fn test_get_slot_entries_multiple_ranges() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let first_entries = create_ticks(4, 1, Hash::new_unique());
        let first_shreds = entries_to_test_shreds(&first_entries, 6, 5, false, 0);
        let next_index = first_shreds.len() as u32;
        let second_entries = create_ticks(4, 1, Hash::new_unique());
        let second_shreds = entries_to_test_shreds(&second_entries, 6, 5, true, next_index);

        blockstore.insert_shreds(first_shreds).unwrap();
        blockstore.insert_shreds(second_shreds).unwrap();

        let all_entries: Vec<Entry> = first_entries
            .iter()
            .chain(second_entries.iter())
            .cloned()
            .collect();
        let (entries, num_shreds, is_full) = blockstore
            .get_slot_entries_with_shred_info(6, 0, false)
            .unwrap();
        assert_eq!(entries, all_entries);
        assert_eq!(
            num_shreds,
            blockstore.meta(6).unwrap().unwrap().consumed
        );
        assert!(is_full);

        // a mid-slot start index only returns the trailing ranges
        let entries = blockstore
            .get_slot_entries(6, u64::from(next_index))
            .unwrap();
        assert_eq!(entries, second_entries);

        // no complete ranges means no entries
        assert_eq!(blockstore.get_slot_entries(99, 0).unwrap(), vec![]);
    }

    #[test]
    fn test_get_data_shred() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let (shreds, _) = make_slot_entries(3, 2, 8);
        blockstore.insert_shreds(shreds.clone()).unwrap();

        assert_eq!(
            blockstore.get_data_shred(3, 0).unwrap().unwrap(),
            *shreds[0].payload()
        );
        assert_eq!(blockstore.get_data_shred(3, 999).unwrap(), None);

        let round_tripped = blockstore.get_data_shreds_for_slot(3, 0).unwrap();
        assert_eq!(round_tripped, shreds);

        // a stored shred of the wrong size is rejected
        blockstore
            .data_shred_cf
            .put_bytes((4, 0), &[1, 2, 3])
            .unwrap();
        assert!(matches!(
            blockstore.get_data_shred(4, 0),
            Err(BlockstoreError::InvalidDataShred)
        ));
    }

    #[test]
    fn test_get_coding_shred() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        assert_eq!(blockstore.get_coding_shred(3, 0).unwrap(), None);
        blockstore
            .code_shred_cf
            .put_bytes((3, 0), &[8; SHRED_PAYLOAD_SIZE])
            .unwrap();
        assert!(blockstore.get_coding_shred(3, 0).unwrap().is_some());
    }

    #[test]
    fn test_is_shred_duplicate() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let stored = Shred::new_from_data(4, 0, 1, &[1; 16], true, true, 0, 0, 0);
        blockstore.insert_shreds(vec![stored.clone()]).unwrap();

        // no stored shred at this index
        let elsewhere = Shred::new_from_data(4, 1, 1, &[1; 16], true, true, 0, 0, 0);
        assert_eq!(blockstore.is_shred_duplicate(&elsewhere), None);

        // byte-identical shred is not a duplicate
        assert_eq!(blockstore.is_shred_duplicate(&stored), None);

        // a conflicting version is reported with the stored payload
        let conflicting = Shred::new_from_data(4, 0, 1, &[2; 16], true, true, 0, 0, 0);
        assert_eq!(
            blockstore.is_shred_duplicate(&conflicting),
            Some(stored.payload().clone())
        );

        // a copy differing only in the retransmitter signature is not a
        // duplicate: the stored copy is re-signed before comparison
        let mut resigned_payload = stored.payload().clone();
        shred::layout::set_retransmitter_signature(
            &mut resigned_payload,
            &Signature::new_unique(),
        )
        .unwrap();
        let resigned = Shred::new_from_serialized_shred(resigned_payload).unwrap();
        assert_eq!(blockstore.is_shred_duplicate(&resigned), None);
    }

    #[test]
    fn test_duplicate_slot_proofs() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        assert!(!blockstore.has_duplicate_shreds_in_slot(5));
        assert_eq!(blockstore.get_first_duplicate_proof(), None);

        blockstore
            .store_duplicate_slot(5, vec![1, 2], vec![3, 4])
            .unwrap();
        assert!(blockstore.has_duplicate_shreds_in_slot(5));
        let proof = blockstore.get_duplicate_slot(5).unwrap();
        assert_eq!(proof.shred1, vec![1, 2]);
        assert_eq!(proof.shred2, vec![3, 4]);

        // the existing proof is not overwritten
        blockstore
            .store_duplicate_if_not_existing(5, vec![9], vec![9])
            .unwrap();
        assert_eq!(blockstore.get_duplicate_slot(5).unwrap().shred1, vec![1, 2]);

        let (slot, first_proof) = blockstore.get_first_duplicate_proof().unwrap();
        assert_eq!(slot, 5);
        assert_eq!(first_proof.shred1, vec![1, 2]);

        assert_eq!(
            blockstore
                .duplicate_slots_iterator(0)
                .unwrap()
                .collect::<Vec<_>>(),
            vec![5]
        );
    }

    #[test]
    fn test_optimistic_slots() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let hashes: Vec<Hash> = (0..3).map(|_| Hash::new_unique()).collect();
        for (i, hash) in hashes.iter().enumerate() {
            let slot = i as Slot + 1;
            blockstore
                .insert_optimistic_slot(slot, hash, slot as UnixTimestamp * 10)
                .unwrap();
        }

        assert_eq!(
            blockstore.get_optimistic_slot(2).unwrap(),
            Some((hashes[1], 20))
        );
        assert_eq!(blockstore.get_optimistic_slot(9).unwrap(), None);

        // newest first, at most `num`
        let latest = blockstore.get_latest_optimistic_slots(2).unwrap();
        assert_eq!(latest, vec![(3, hashes[2], 30), (2, hashes[1], 20)]);

        let all = blockstore.get_latest_optimistic_slots(10).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].0, 1);
    }

    #[test]
    fn test_bank_hash() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        assert_eq!(blockstore.get_bank_hash(7), None);
        assert!(!blockstore.is_duplicate_confirmed(7));

        let frozen_hash = Hash::new_unique();
        blockstore.insert_bank_hash(7, frozen_hash, true);
        assert_eq!(blockstore.get_bank_hash(7), Some(frozen_hash));
        assert!(blockstore.is_duplicate_confirmed(7));

        // duplicate-confirmed is never downgraded
        blockstore.insert_bank_hash(7, frozen_hash, false);
        assert!(blockstore.is_duplicate_confirmed(7));
    }

    #[test]
    fn test_lowest_and_highest_slot() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        assert_eq!(blockstore.highest_slot().unwrap(), None);

        let (shreds, _) = make_slot_entries(4, 3, 4);
        blockstore.insert_shreds(shreds).unwrap();
        let (shreds, _) = make_slot_entries(9, 4, 4);
        blockstore.insert_shreds(shreds).unwrap();

        assert_eq!(blockstore.lowest_slot(), 4);
        assert_eq!(blockstore.highest_slot().unwrap(), Some(9));
    }

    #[test]
    fn test_get_slots_since() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let (shreds, _) = make_slot_entries(2, 1, 4);
        blockstore.insert_shreds(shreds).unwrap();
        let (shreds, _) = make_slot_entries(3, 1, 4);
        blockstore.insert_shreds(shreds).unwrap();

        let result = blockstore.get_slots_since(&[1, 2, 42]).unwrap();
        assert_eq!(result[&1], vec![2, 3]);
        assert_eq!(result[&2], Vec::<Slot>::new());
        assert!(!result.contains_key(&42));
    }

    #[test]
    fn test_perf_samples() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        assert!(blockstore.get_recent_perf_samples(10).unwrap().is_empty());

        for slot in 1..=3 {
            let sample = PerfSample {
                num_transactions: slot * 100,
                num_slots: slot,
                sample_period_secs: 60,
                num_non_vote_transactions: slot * 10,
            };
            blockstore.write_perf_sample(slot, &sample).unwrap();
        }

        let recent = blockstore.get_recent_perf_samples(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].0, 3);
        assert_eq!(recent[1].0, 2);
        assert_eq!(recent[0].1.num_transactions, 300);
    }

    #[test]
    fn test_program_costs() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let key1 = Pubkey::new_unique();
        let key2 = Pubkey::new_unique();
        blockstore.write_program_cost(&key1, &100).unwrap();
        blockstore.write_program_cost(&key2, &200).unwrap();

        let mut costs = blockstore.read_program_costs().unwrap();
        costs.sort_by_key(|(_, cost)| *cost);
        assert_eq!(costs.len(), 2);
        assert_eq!(costs[0], (key1, 100));
        assert_eq!(costs[1], (key2, 200));

        blockstore.delete_program_cost(&key1).unwrap();
        assert_eq!(blockstore.read_program_costs().unwrap().len(), 1);
    }

    #[test]
    fn test_transaction_memos() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        let signature = Signature::new_unique();
        assert_eq!(blockstore.read_transaction_memos(signature).unwrap(), None);
        blockstore
            .write_transaction_memos(&signature, "memo".to_string())
            .unwrap();
        assert_eq!(
            blockstore.read_transaction_memos(signature).unwrap(),
            Some("memo".to_string())
        );
    }

    #[test]
    fn test_rewards_round_trip() {
        let ledger_path = get_tmp_ledger_path_auto_delete!();
        let blockstore = Blockstore::open(ledger_path.path()).unwrap();

        assert_eq!(blockstore.read_rewards(4).unwrap(), None);
        let rewards = RewardsAndNumPartitions {
            rewards: vec![Reward {
                pubkey: Pubkey::new_unique(),
                lamports: -42,
                post_balance: 0,
                reward_type: Some(RewardType::Rent),
                commission: None,
            }],
            num_partitions: Some(2),
        };
        blockstore.write_rewards(4, rewards.clone()).unwrap();
        assert_eq!(blockstore.read_rewards(4).unwrap(), Some(rewards.rewards));
    }
}
