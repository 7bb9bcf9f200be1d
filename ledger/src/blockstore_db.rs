pub use rocksdb::Direction as IteratorDirection;
use {
    bincode::{deserialize, serialize},
    byteorder::{BigEndian, ByteOrder},
    rocksdb::{
        self, ColumnFamily, ColumnFamilyDescriptor, DBIterator, DBPinnableSlice, DBRawIterator,
        IteratorMode as RocksIteratorMode, Options, WriteBatch as RWriteBatch, DB,
    },
    ridgeline_sdk::{
        clock::{Slot, UnixTimestamp},
        pubkey::Pubkey,
        signature::Signature,
    },
    serde::{de::DeserializeOwned, Serialize},
    std::{collections::HashMap, fs, marker::PhantomData, path::Path, sync::Arc},
    thiserror::Error,
};

// Column family for metadata about a leader slot
const META_CF: &str = "meta";
// Column family for slots that have been marked as dead
const DEAD_SLOTS_CF: &str = "dead_slots";
// Column family for storing proof that there were multiple
// versions of a slot
const DUPLICATE_SLOTS_CF: &str = "duplicate_slots";
/// Column family for bank hashes
const BANK_HASH_CF: &str = "bank_hashes";
// Column family for root data
const ROOT_CF: &str = "root";
/// Column family for Data Shreds
const DATA_SHRED_CF: &str = "data_shred";
/// Column family for Code Shreds
const CODE_SHRED_CF: &str = "code_shred";
/// Column family for Transaction Status
const TRANSACTION_STATUS_CF: &str = "transaction_status";
/// Column family for Address Signatures
const ADDRESS_SIGNATURES_CF: &str = "address_signatures";
/// Column family for TransactionMemos
const TRANSACTION_MEMOS_CF: &str = "transaction_memos";
/// Column family for Rewards
const REWARDS_CF: &str = "rewards";
/// Column family for Blocktime
const BLOCKTIME_CF: &str = "blocktime";
/// Column family for Performance Samples
const PERF_SAMPLES_CF: &str = "perf_samples";
/// Column family for BlockHeight
const BLOCK_HEIGHT_CF: &str = "block_height";
/// Column family for ProgramCosts
const PROGRAM_COSTS_CF: &str = "program_costs";
/// Column family for optimistic slots
const OPTIMISTIC_SLOTS_CF: &str = "optimistic_slots";

#[derive(Error, Debug)]
pub enum BlockstoreError {
    #[error("invalid shred data: {0}")]
    InvalidShredData(Box<bincode::ErrorKind>),
    #[error("invalid data shred payload size")]
    InvalidDataShred,
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("slot is not rooted")]
    SlotNotRooted,
    #[error("dead slot")]
    DeadSlot,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] Box<bincode::ErrorKind>),
    #[error("fs extra error: {0}")]
    FsExtraError(#[from] fs_extra::error::Error),
    #[error("slot cleaned up")]
    SlotCleanedUp,
    #[error("transaction found in a slot that does not match its status")]
    TransactionStatusSlotMismatch,
    #[error("parent entries unavailable")]
    ParentEntriesUnavailable,
    #[error("slot unavailable")]
    SlotUnavailable,
    #[error("missing transaction metadata")]
    MissingTransactionMetadata,
    #[error("slot meta is missing its parent slot")]
    MissingParentSlot,
    #[error("missing value for known key")]
    MissingValue,
    #[error("transaction index overflow")]
    TransactionIndexOverflow,
    #[error("corrupted blockstore: {0}")]
    CorruptedBlockstore(String),
    #[error("iterator produced an entry without a key")]
    IteratorMissingKey,
    #[error("iterator produced an entry without a value")]
    IteratorMissingValue,
}
pub type Result<T> = std::result::Result<T, BlockstoreError>;

pub enum IteratorMode<Index> {
    Start,
    End,
    From(Index, IteratorDirection),
}

pub mod columns {
    #[derive(Debug)]
    /// The slot metadata column.
    ///
    /// This column family tracks the status of the received shred data for a
    /// given slot.  Tracking the progress as the slot fills up allows us to
    /// know if the slot (or pieces of the slot) are ready to be replayed.
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: `blockstore_meta::SlotMeta`
    pub struct SlotMeta;

    #[derive(Debug)]
    /// The dead slots column.
    ///
    /// A slot is marked as dead if the validator thinks it will never be able
    /// to successfully replay this slot.
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: bool
    pub struct DeadSlots;

    #[derive(Debug)]
    /// The duplicate slots column.
    ///
    /// Stores proof that there were multiple versions of a slot.
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: `blockstore_meta::DuplicateSlotProof`
    pub struct DuplicateSlots;

    #[derive(Debug)]
    /// The bank hash column.
    ///
    /// This column family persists the bank hash of a given slot.  Note that
    /// not every slot has a bank hash (e.g., a dead slot.)
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: `blockstore_meta::FrozenHashVersioned`
    pub struct BankHash;

    #[derive(Debug)]
    /// The root column.
    ///
    /// This column family persists whether a slot is a root.  Slots on the
    /// main fork will be inserted into this column when they are finalized.
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: bool
    pub struct Root;

    #[derive(Debug)]
    /// The shred data column
    ///
    /// index type: (u64, u64)
    /// value type: Vec<u8>
    pub struct ShredData;

    #[derive(Debug)]
    /// The shred erasure code column
    ///
    /// index type: (u64, u64)
    /// value type: Vec<u8>
    pub struct ShredCode;

    #[derive(Debug)]
    /// The transaction status column
    ///
    /// index type: (Signature, Slot)
    /// value type: `ridgeline_transaction_status::TransactionStatusMeta`
    pub struct TransactionStatus;

    #[derive(Debug)]
    /// The address signatures column
    ///
    /// index type: (Pubkey, Slot, u32, Signature)
    /// value type: `blockstore_meta::AddressSignatureMeta`
    pub struct AddressSignatures;

    #[derive(Debug)]
    /// The transaction memos column
    ///
    /// index type: Signature
    /// value type: String
    pub struct TransactionMemos;

    #[derive(Debug)]
    /// The rewards column
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: `ridgeline_transaction_status::RewardsAndNumPartitions`
    pub struct Rewards;

    #[derive(Debug)]
    /// The blocktime column
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: `UnixTimestamp`
    pub struct Blocktime;

    #[derive(Debug)]
    /// The performance samples column
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: `blockstore_meta::PerfSample`
    pub struct PerfSamples;

    #[derive(Debug)]
    /// The block height column
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: u64
    pub struct BlockHeight;

    #[derive(Debug)]
    /// The program costs column
    ///
    /// index type: `Pubkey`
    /// value type: `blockstore_meta::ProgramCost`
    pub struct ProgramCosts;

    #[derive(Debug)]
    /// The optimistic slot column
    ///
    /// index type: u64 (see `SlotColumn`)
    /// value type: `blockstore_meta::OptimisticSlotMetaVersioned`
    pub struct OptimisticSlots;

    // When adding a new column ...
    // - Add struct above and implement `Column` and `ColumnName` traits
    // - Add descriptor in Rocks::cf_descriptors() and name in Rocks::columns()
}

#[derive(Debug)]
struct Rocks {
    db: rocksdb::DB,
}

impl Rocks {
    fn open(path: &Path) -> Result<Rocks> {
        fs::create_dir_all(path)?;

        let mut db_options = Options::default();
        db_options.create_if_missing(true);
        db_options.create_missing_column_families(true);

        let db = Rocks {
            db: DB::open_cf_descriptors(&db_options, path, Self::cf_descriptors())?,
        };

        Ok(db)
    }

    fn cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
        use columns::*;

        vec![
            new_cf_descriptor::<SlotMeta>(),
            new_cf_descriptor::<DeadSlots>(),
            new_cf_descriptor::<DuplicateSlots>(),
            new_cf_descriptor::<BankHash>(),
            new_cf_descriptor::<Root>(),
            new_cf_descriptor::<ShredData>(),
            new_cf_descriptor::<ShredCode>(),
            new_cf_descriptor::<TransactionStatus>(),
            new_cf_descriptor::<AddressSignatures>(),
            new_cf_descriptor::<TransactionMemos>(),
            new_cf_descriptor::<Rewards>(),
            new_cf_descriptor::<Blocktime>(),
            new_cf_descriptor::<PerfSamples>(),
            new_cf_descriptor::<BlockHeight>(),
            new_cf_descriptor::<ProgramCosts>(),
            new_cf_descriptor::<OptimisticSlots>(),
        ]
    }

    fn columns() -> Vec<&'static str> {
        use columns::*;

        vec![
            SlotMeta::NAME,
            DeadSlots::NAME,
            DuplicateSlots::NAME,
            BankHash::NAME,
            Root::NAME,
            ShredData::NAME,
            ShredCode::NAME,
            TransactionStatus::NAME,
            AddressSignatures::NAME,
            TransactionMemos::NAME,
            Rewards::NAME,
            Blocktime::NAME,
            PerfSamples::NAME,
            BlockHeight::NAME,
            ProgramCosts::NAME,
            OptimisticSlots::NAME,
        ]
    }

    fn destroy(path: &Path) -> Result<()> {
        DB::destroy(&Options::default(), path)?;

        Ok(())
    }

    fn cf_handle(&self, cf: &str) -> &ColumnFamily {
        self.db
            .cf_handle(cf)
            .expect("should never get an unknown column")
    }

    fn get_cf(&self, cf: &ColumnFamily, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let opt = self.db.get_cf(cf, key)?;
        Ok(opt)
    }

    fn get_pinned_cf(&self, cf: &ColumnFamily, key: &[u8]) -> Result<Option<DBPinnableSlice>> {
        let opt = self.db.get_pinned_cf(cf, key)?;
        Ok(opt)
    }

    fn put_cf(&self, cf: &ColumnFamily, key: &[u8], value: &[u8]) -> Result<()> {
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    fn multi_get_cf(
        &self,
        cf: &ColumnFamily,
        keys: Vec<&[u8]>,
    ) -> Vec<Result<Option<DBPinnableSlice>>> {
        self.db
            .batched_multi_get_cf(cf, keys, false)
            .into_iter()
            .map(|result| result.map_err(BlockstoreError::RocksDb))
            .collect()
    }

    fn delete_cf(&self, cf: &ColumnFamily, key: &[u8]) -> Result<()> {
        self.db.delete_cf(cf, key)?;
        Ok(())
    }

    fn iterator_cf<C>(&self, cf: &ColumnFamily, iterator_mode: IteratorMode<C::Index>) -> DBIterator
    where
        C: Column,
    {
        let start_key;
        let iterator_mode = match iterator_mode {
            IteratorMode::From(start_from, direction) => {
                start_key = C::key(start_from);
                RocksIteratorMode::From(&start_key, direction)
            }
            IteratorMode::Start => RocksIteratorMode::Start,
            IteratorMode::End => RocksIteratorMode::End,
        };
        self.db.iterator_cf(cf, iterator_mode)
    }

    fn raw_iterator_cf(&self, cf: &ColumnFamily) -> DBRawIterator {
        self.db.raw_iterator_cf(cf)
    }

    fn batch(&self) -> RWriteBatch {
        RWriteBatch::default()
    }

    fn write(&self, batch: RWriteBatch) -> Result<()> {
        self.db.write(batch)?;
        Ok(())
    }
}

pub trait Column {
    type Index;

    fn key(index: Self::Index) -> Vec<u8>;
    fn index(key: &[u8]) -> Self::Index;
    // this return Slot or some u64
    fn slot(index: Self::Index) -> Slot;
    #[allow(clippy::wrong_self_convention)]
    fn as_index(slot: Slot) -> Self::Index;
}

pub trait ColumnName {
    const NAME: &'static str;
}

pub trait TypedColumn: Column {
    type Type: Serialize + DeserializeOwned;
}

impl TypedColumn for columns::AddressSignatures {
    type Type = crate::blockstore_meta::AddressSignatureMeta;
}

impl TypedColumn for columns::TransactionMemos {
    type Type = String;
}

impl TypedColumn for columns::TransactionStatus {
    type Type = ridgeline_transaction_status::TransactionStatusMeta;
}

/// SlotColumn is a trait for slot-based column families.  Its index is
/// essentially Slot (or more generally speaking, has a 1:1 mapping to Slot).
pub trait SlotColumn<Index = u64> {}

impl<T: SlotColumn> Column for T {
    type Index = u64;

    /// Converts a u64 Index to its RocksDB key.
    fn key(slot: u64) -> Vec<u8> {
        let mut key = vec![0; 8];
        BigEndian::write_u64(&mut key[..], slot);
        key
    }

    /// Converts a RocksDB key to its u64 Index.
    fn index(key: &[u8]) -> u64 {
        BigEndian::read_u64(&key[..8])
    }

    fn slot(index: u64) -> Slot {
        index
    }

    #[allow(clippy::wrong_self_convention)]
    /// Converts a Slot to its u64 Index.
    fn as_index(slot: Slot) -> u64 {
        slot
    }
}

impl Column for columns::TransactionStatus {
    type Index = (Signature, Slot);

    fn key((signature, slot): (Signature, Slot)) -> Vec<u8> {
        let mut key = vec![0; 64 + 8]; // size_of Signature + size_of Slot
        key[0..64].copy_from_slice(signature.as_ref());
        BigEndian::write_u64(&mut key[64..72], slot);
        key
    }

    fn index(key: &[u8]) -> (Signature, Slot) {
        if key.len() != 72 {
            Self::as_index(0)
        } else {
            let signature = Signature::new(&key[0..64]);
            let slot = BigEndian::read_u64(&key[64..72]);
            (signature, slot)
        }
    }

    fn slot(index: Self::Index) -> Slot {
        index.1
    }

    #[allow(clippy::wrong_self_convention)]
    fn as_index(slot: Slot) -> Self::Index {
        (Signature::default(), slot)
    }
}
impl ColumnName for columns::TransactionStatus {
    const NAME: &'static str = TRANSACTION_STATUS_CF;
}

impl Column for columns::AddressSignatures {
    type Index = (Pubkey, Slot, /*transaction index:*/ u32, Signature);

    fn key((pubkey, slot, transaction_index, signature): Self::Index) -> Vec<u8> {
        let mut key = vec![0; 32 + 8 + 4 + 64];
        key[0..32].copy_from_slice(pubkey.as_ref());
        BigEndian::write_u64(&mut key[32..40], slot);
        BigEndian::write_u32(&mut key[40..44], transaction_index);
        key[44..108].copy_from_slice(signature.as_ref());
        key
    }

    fn index(key: &[u8]) -> Self::Index {
        let pubkey = Pubkey::new(&key[0..32]);
        let slot = BigEndian::read_u64(&key[32..40]);
        let transaction_index = BigEndian::read_u32(&key[40..44]);
        let signature = Signature::new(&key[44..108]);
        (pubkey, slot, transaction_index, signature)
    }

    fn slot(index: Self::Index) -> Slot {
        index.1
    }

    #[allow(clippy::wrong_self_convention)]
    fn as_index(slot: Slot) -> Self::Index {
        (Pubkey::default(), slot, 0, Signature::default())
    }
}
impl ColumnName for columns::AddressSignatures {
    const NAME: &'static str = ADDRESS_SIGNATURES_CF;
}

impl Column for columns::TransactionMemos {
    type Index = Signature;

    fn key(signature: Signature) -> Vec<u8> {
        let mut key = vec![0; 64]; // size_of Signature
        key[0..64].copy_from_slice(signature.as_ref());
        key
    }

    fn index(key: &[u8]) -> Signature {
        Signature::new(&key[0..64])
    }

    fn slot(_index: Self::Index) -> Slot {
        unimplemented!()
    }

    #[allow(clippy::wrong_self_convention)]
    fn as_index(_index: u64) -> Self::Index {
        Signature::default()
    }
}
impl ColumnName for columns::TransactionMemos {
    const NAME: &'static str = TRANSACTION_MEMOS_CF;
}

impl ColumnName for columns::ProgramCosts {
    const NAME: &'static str = PROGRAM_COSTS_CF;
}
impl TypedColumn for columns::ProgramCosts {
    type Type = crate::blockstore_meta::ProgramCost;
}
impl Column for columns::ProgramCosts {
    type Index = Pubkey;

    fn key(pubkey: Pubkey) -> Vec<u8> {
        let mut key = vec![0; 32]; // size_of Pubkey
        key[0..32].copy_from_slice(pubkey.as_ref());
        key
    }

    fn index(key: &[u8]) -> Self::Index {
        Pubkey::new(&key[0..32])
    }

    fn slot(_index: Self::Index) -> Slot {
        unimplemented!()
    }

    #[allow(clippy::wrong_self_convention)]
    fn as_index(_index: u64) -> Self::Index {
        Pubkey::default()
    }
}

impl Column for columns::ShredCode {
    type Index = (u64, u64);

    fn key(index: (u64, u64)) -> Vec<u8> {
        columns::ShredData::key(index)
    }

    fn index(key: &[u8]) -> (u64, u64) {
        columns::ShredData::index(key)
    }

    fn slot(index: Self::Index) -> Slot {
        index.0
    }

    #[allow(clippy::wrong_self_convention)]
    fn as_index(slot: Slot) -> Self::Index {
        (slot, 0)
    }
}
impl ColumnName for columns::ShredCode {
    const NAME: &'static str = CODE_SHRED_CF;
}

impl Column for columns::ShredData {
    type Index = (u64, u64);

    fn key((slot, index): (u64, u64)) -> Vec<u8> {
        let mut key = vec![0; 16];
        BigEndian::write_u64(&mut key[..8], slot);
        BigEndian::write_u64(&mut key[8..16], index);
        key
    }

    fn index(key: &[u8]) -> (u64, u64) {
        let slot = BigEndian::read_u64(&key[..8]);
        let index = BigEndian::read_u64(&key[8..16]);
        (slot, index)
    }

    fn slot(index: Self::Index) -> Slot {
        index.0
    }

    #[allow(clippy::wrong_self_convention)]
    fn as_index(slot: Slot) -> Self::Index {
        (slot, 0)
    }
}
impl ColumnName for columns::ShredData {
    const NAME: &'static str = DATA_SHRED_CF;
}

impl SlotColumn for columns::DeadSlots {}
impl ColumnName for columns::DeadSlots {
    const NAME: &'static str = DEAD_SLOTS_CF;
}
impl TypedColumn for columns::DeadSlots {
    type Type = bool;
}

impl SlotColumn for columns::DuplicateSlots {}
impl ColumnName for columns::DuplicateSlots {
    const NAME: &'static str = DUPLICATE_SLOTS_CF;
}
impl TypedColumn for columns::DuplicateSlots {
    type Type = crate::blockstore_meta::DuplicateSlotProof;
}

impl SlotColumn for columns::BankHash {}
impl ColumnName for columns::BankHash {
    const NAME: &'static str = BANK_HASH_CF;
}
impl TypedColumn for columns::BankHash {
    type Type = crate::blockstore_meta::FrozenHashVersioned;
}

impl SlotColumn for columns::Root {}
impl ColumnName for columns::Root {
    const NAME: &'static str = ROOT_CF;
}
impl TypedColumn for columns::Root {
    type Type = bool;
}

impl SlotColumn for columns::SlotMeta {}
impl ColumnName for columns::SlotMeta {
    const NAME: &'static str = META_CF;
}
impl TypedColumn for columns::SlotMeta {
    type Type = crate::blockstore_meta::SlotMeta;
}

impl SlotColumn for columns::Rewards {}
impl ColumnName for columns::Rewards {
    const NAME: &'static str = REWARDS_CF;
}
impl TypedColumn for columns::Rewards {
    type Type = ridgeline_transaction_status::RewardsAndNumPartitions;
}

impl SlotColumn for columns::Blocktime {}
impl ColumnName for columns::Blocktime {
    const NAME: &'static str = BLOCKTIME_CF;
}
impl TypedColumn for columns::Blocktime {
    type Type = UnixTimestamp;
}

impl SlotColumn for columns::PerfSamples {}
impl ColumnName for columns::PerfSamples {
    const NAME: &'static str = PERF_SAMPLES_CF;
}
impl TypedColumn for columns::PerfSamples {
    type Type = crate::blockstore_meta::PerfSample;
}

impl SlotColumn for columns::BlockHeight {}
impl ColumnName for columns::BlockHeight {
    const NAME: &'static str = BLOCK_HEIGHT_CF;
}
impl TypedColumn for columns::BlockHeight {
    type Type = u64;
}

impl SlotColumn for columns::OptimisticSlots {}
impl ColumnName for columns::OptimisticSlots {
    const NAME: &'static str = OPTIMISTIC_SLOTS_CF;
}
impl TypedColumn for columns::OptimisticSlots {
    type Type = crate::blockstore_meta::OptimisticSlotMetaVersioned;
}

#[derive(Debug)]
pub struct Database {
    backend: Arc<Rocks>,
    path: Arc<Path>,
}

#[derive(Debug)]
pub struct LedgerColumn<C>
where
    C: Column + ColumnName,
{
    backend: Arc<Rocks>,
    column: PhantomData<C>,
}

pub struct WriteBatch<'a> {
    write_batch: RWriteBatch,
    map: HashMap<&'static str, &'a ColumnFamily>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let backend = Arc::new(Rocks::open(path)?);

        Ok(Database {
            backend,
            path: Arc::from(path),
        })
    }

    pub fn destroy(path: &Path) -> Result<()> {
        Rocks::destroy(path)?;

        Ok(())
    }

    pub fn get<C>(&self, key: C::Index) -> Result<Option<C::Type>>
    where
        C: TypedColumn + ColumnName,
    {
        if let Some(pinnable_slice) = self
            .backend
            .get_pinned_cf(self.cf_handle::<C>(), &C::key(key))?
        {
            let value = deserialize(pinnable_slice.as_ref())?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    pub fn iter<C>(
        &self,
        iterator_mode: IteratorMode<C::Index>,
    ) -> Result<impl Iterator<Item = (C::Index, Box<[u8]>)> + '_>
    where
        C: Column + ColumnName,
    {
        let cf = self.cf_handle::<C>();
        let iter = self.backend.iterator_cf::<C>(cf, iterator_mode);
        Ok(iter.map(|pair| {
            let (key, value) = pair.unwrap();
            (C::index(&key), value)
        }))
    }

    #[inline]
    pub fn cf_handle<C: ColumnName>(&self) -> &ColumnFamily
    where
        C: Column + ColumnName,
    {
        self.backend.cf_handle(C::NAME)
    }

    pub fn column<C>(&self) -> LedgerColumn<C>
    where
        C: Column + ColumnName,
    {
        LedgerColumn {
            backend: Arc::clone(&self.backend),
            column: PhantomData,
        }
    }

    #[inline]
    pub fn raw_iterator_cf(&self, cf: &ColumnFamily) -> Result<DBRawIterator> {
        Ok(self.backend.raw_iterator_cf(cf))
    }

    pub fn batch(&self) -> Result<WriteBatch> {
        let write_batch = self.backend.batch();
        let map = Rocks::columns()
            .into_iter()
            .map(|desc| (desc, self.backend.cf_handle(desc)))
            .collect();

        Ok(WriteBatch { write_batch, map })
    }

    pub fn write(&self, batch: WriteBatch) -> Result<()> {
        self.backend.write(batch.write_batch)
    }

    pub fn storage_size(&self) -> Result<u64> {
        Ok(fs_extra::dir::get_size(&self.path)?)
    }
}

impl<C> LedgerColumn<C>
where
    C: Column + ColumnName,
{
    pub fn get_bytes(&self, key: C::Index) -> Result<Option<Vec<u8>>> {
        self.backend.get_cf(self.handle(), &C::key(key))
    }

    pub fn multi_get_bytes(&self, keys: Vec<C::Index>) -> Vec<Result<Option<Vec<u8>>>> {
        let rocks_keys: Vec<_> = keys.into_iter().map(|key| C::key(key)).collect();
        let ref_rocks_keys: Vec<_> = rocks_keys.iter().map(|k| &k[..]).collect();
        self.backend
            .multi_get_cf(self.handle(), ref_rocks_keys)
            .into_iter()
            .map(|result| {
                result.map(|opt| opt.map(|pinnable_slice| pinnable_slice.as_ref().to_vec()))
            })
            .collect::<Vec<Result<Option<_>>>>()
    }

    pub fn iter(
        &self,
        iterator_mode: IteratorMode<C::Index>,
    ) -> Result<impl Iterator<Item = (C::Index, Box<[u8]>)> + '_> {
        let cf = self.handle();
        let iter = self.backend.iterator_cf::<C>(cf, iterator_mode);
        Ok(iter.map(|pair| {
            let (key, value) = pair.unwrap();
            (C::index(&key), value)
        }))
    }

    #[inline]
    pub fn handle(&self) -> &ColumnFamily {
        self.backend.cf_handle(C::NAME)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> Result<bool> {
        let mut iter = self.backend.raw_iterator_cf(self.handle());
        iter.seek_to_first();
        Ok(!iter.valid())
    }

    pub fn put_bytes(&self, key: C::Index, value: &[u8]) -> Result<()> {
        self.backend.put_cf(self.handle(), &C::key(key), value)
    }

    pub fn delete(&self, key: C::Index) -> Result<()> {
        self.backend.delete_cf(self.handle(), &C::key(key))
    }
}

impl<C> LedgerColumn<C>
where
    C: TypedColumn + ColumnName,
{
    pub fn multi_get(&self, keys: Vec<C::Index>) -> Vec<Result<Option<C::Type>>> {
        let rocks_keys: Vec<_> = keys.into_iter().map(|key| C::key(key)).collect();
        let ref_rocks_keys: Vec<_> = rocks_keys.iter().map(|k| &k[..]).collect();
        self.backend
            .multi_get_cf(self.handle(), ref_rocks_keys)
            .into_iter()
            .map(|result| match result? {
                Some(pinnable_slice) => Ok(Some(deserialize(pinnable_slice.as_ref())?)),
                None => Ok(None),
            })
            .collect::<Vec<Result<Option<_>>>>()
    }

    pub fn get(&self, key: C::Index) -> Result<Option<C::Type>> {
        if let Some(pinnable_slice) = self.backend.get_pinned_cf(self.handle(), &C::key(key))? {
            let value = deserialize(pinnable_slice.as_ref())?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    pub fn put(&self, key: C::Index, value: &C::Type) -> Result<()> {
        let serialized_value = serialize(value)?;
        self.backend
            .put_cf(self.handle(), &C::key(key), &serialized_value)
    }
}

impl<'a> WriteBatch<'a> {
    pub fn put_bytes<C: Column + ColumnName>(&mut self, key: C::Index, bytes: &[u8]) -> Result<()> {
        self.write_batch
            .put_cf(self.get_cf::<C>(), C::key(key), bytes);
        Ok(())
    }

    pub fn delete<C: Column + ColumnName>(&mut self, key: C::Index) -> Result<()> {
        self.write_batch.delete_cf(self.get_cf::<C>(), C::key(key));
        Ok(())
    }

    pub fn put<C: TypedColumn + ColumnName>(
        &mut self,
        key: C::Index,
        value: &C::Type,
    ) -> Result<()> {
        let serialized_value = serialize(&value)?;
        self.write_batch
            .put_cf(self.get_cf::<C>(), C::key(key), serialized_value);
        Ok(())
    }

    #[inline]
    fn get_cf<C: Column + ColumnName>(&self) -> &'a ColumnFamily {
        self.map[C::NAME]
    }
}

fn new_cf_descriptor<C: 'static + Column + ColumnName>() -> ColumnFamilyDescriptor {
    let mut options = Options::default();
    options.create_if_missing(true);
    ColumnFamilyDescriptor::new(C::NAME, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_column_key_order_matches_numeric_order() {
        // BigEndian packing is what makes lexicographic rocksdb order equal
        // numeric slot order
        let low = <columns::SlotMeta as Column>::key(3);
        let high = <columns::SlotMeta as Column>::key(300);
        assert!(low < high);
        assert_eq!(<columns::SlotMeta as Column>::index(&low), 3);
    }

    #[test]
    fn test_shred_data_key_round_trip() {
        let index = (17, 23);
        let key = <columns::ShredData as Column>::key(index);
        assert_eq!(<columns::ShredData as Column>::index(&key), index);
        assert_eq!(<columns::ShredData as Column>::slot(index), 17);
    }

    #[test]
    fn test_transaction_status_key_round_trip() {
        let index = (Signature::new_unique(), 42);
        let key = <columns::TransactionStatus as Column>::key(index);
        assert_eq!(key.len(), 72);
        assert_eq!(<columns::TransactionStatus as Column>::index(&key), index);
    }

    #[test]
    fn test_address_signatures_key_orders_by_transaction_index() {
        let address = Pubkey::new_unique();
        let slot = 5;
        let first = <columns::AddressSignatures as Column>::key((
            address,
            slot,
            0,
            Signature::new_unique(),
        ));
        let second = <columns::AddressSignatures as Column>::key((
            address,
            slot,
            1,
            Signature::default(),
        ));
        assert!(first < second);

        let index = (address, slot, 7, Signature::new_unique());
        let key = <columns::AddressSignatures as Column>::key(index);
        assert_eq!(<columns::AddressSignatures as Column>::index(&key), index);
    }
}
