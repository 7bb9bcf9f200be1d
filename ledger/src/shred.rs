//! The `shred` module defines the data frames pulled from the network and
//! stored by the blockstore. There are two types of shreds: data and coding.
//! Data shreds carry serialized ledger entries while coding shreds provide
//! redundancy to protect against dropped network packets (erasures).
//!
//! Layout of a data shred payload:
//!
//! | common header (83)                            | data header (5)  | data           | resigned  |
//! | signature | type | slot | index | version | fec | parent | flags | size | entries | signature |
//!
//! The trailing signature region is reserved for a retransmitter signature;
//! it is zeroed for shreds that were never re-signed. Erasure coding and
//! signature verification are handled by external collaborators; this module
//! only parses, validates, and reassembles frames.

use {
    bincode::config::Options,
    num_enum::{IntoPrimitive, TryFromPrimitive},
    ridgeline_entry::entry::Entry,
    ridgeline_sdk::{
        clock::Slot,
        packet::PACKET_DATA_SIZE,
        signature::Signature,
    },
    serde::{Deserialize, Serialize},
    std::mem::size_of,
    thiserror::Error,
};

/// The following constants are computed by hand, and hardcoded.
/// `test_shred_constants` ensures that the values are correct.
pub const SIZE_OF_COMMON_SHRED_HEADER: usize = 83;
pub const SIZE_OF_DATA_SHRED_HEADER: usize = 5;
pub const SIZE_OF_CODING_SHRED_HEADER: usize = 6;
pub const SIZE_OF_SIGNATURE: usize = 64;
pub const SIZE_OF_SHRED_TYPE: usize = 1;
pub const SIZE_OF_NONCE: usize = 4;

pub const OFFSET_OF_SHRED_TYPE: usize = SIZE_OF_SIGNATURE;
pub const OFFSET_OF_DATA_SHRED_FLAGS: usize =
    SIZE_OF_COMMON_SHRED_HEADER + size_of::<u16>();
const SHRED_DATA_OFFSET: usize = SIZE_OF_COMMON_SHRED_HEADER + SIZE_OF_DATA_SHRED_HEADER;

/// On-disk and on-wire size of any shred payload.
pub const SHRED_PAYLOAD_SIZE: usize = PACKET_DATA_SIZE - SIZE_OF_NONCE;
/// Capacity available to ledger entries in a single data shred.
pub const SIZE_OF_DATA_SHRED_PAYLOAD: usize = SHRED_PAYLOAD_SIZE
    - SIZE_OF_COMMON_SHRED_HEADER
    - SIZE_OF_DATA_SHRED_HEADER
    - SIZE_OF_SIGNATURE;

pub const SHRED_TICK_REFERENCE_MASK: u8 = 0b0011_1111;
const DATA_COMPLETE_SHRED: u8 = 0b0100_0000;
const LAST_SHRED_IN_SLOT: u8 = 0b1000_0000;

/// An upper bound on maximum number of data shreds we can handle in a slot
/// 32K shreds would allow ~320K peak TPS
/// (32K shreds per slot * 4 TX per shred * 2.5 slots per sec)
pub const MAX_DATA_SHREDS_PER_SLOT: usize = 32_768;

#[derive(Error, Debug)]
pub enum ShredError {
    #[error("invalid shred type")]
    InvalidShredType,

    #[error("invalid payload size: {0}")]
    InvalidPayloadSize(usize),

    #[error("invalid parent offset {parent_offset} for slot {slot}")]
    InvalidParentOffset { slot: Slot, parent_offset: u16 },

    #[error("the shred carries no retransmitter signature")]
    NoRetransmitterSignature,

    #[error("data shreds do not form a contiguous completed block")]
    IncompleteDataSet,

    #[error("serialization error")]
    Serialize(#[from] Box<bincode::ErrorKind>),
}

pub type Result<T> = std::result::Result<T, ShredError>;

#[repr(u8)]
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, IntoPrimitive, Serialize, TryFromPrimitive,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum ShredType {
    Data = 0b1010_0101,
    Code = 0b0101_1010,
}

impl Default for ShredType {
    fn default() -> Self {
        ShredType::Data
    }
}

/// A common header that is present in data and code shred headers
#[derive(Serialize, Clone, Deserialize, Default, PartialEq, Eq, Debug)]
pub struct ShredCommonHeader {
    pub signature: Signature,
    pub shred_type: ShredType,
    pub slot: Slot,
    pub index: u32,
    pub version: u16,
    pub fec_set_index: u32,
}

/// The data shred header has parent offset and flags
#[derive(Serialize, Clone, Default, Deserialize, PartialEq, Eq, Debug)]
pub struct DataShredHeader {
    pub parent_offset: u16,
    pub flags: u8,
    pub size: u16,
}

/// The coding shred header has FEC information
#[derive(Serialize, Clone, Default, Deserialize, PartialEq, Eq, Debug)]
pub struct CodingShredHeader {
    pub num_data_shreds: u16,
    pub num_coding_shreds: u16,
    pub position: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shred {
    pub common_header: ShredCommonHeader,
    pub data_header: DataShredHeader,
    pub coding_header: CodingShredHeader,
    payload: Vec<u8>,
}

/// Tuple which uniquely identifies a shred should it exist.
#[derive(Clone, Copy, Eq, Debug, Hash, PartialEq)]
pub struct ShredId(Slot, /*shred index:*/ u32, ShredType);

impl ShredId {
    pub(crate) fn new(slot: Slot, index: u32, shred_type: ShredType) -> ShredId {
        ShredId(slot, index, shred_type)
    }

    pub fn unwrap(&self) -> (Slot, /*shred index:*/ u32, ShredType) {
        (self.0, self.1, self.2)
    }
}

impl Shred {
    fn deserialize_obj<'de, T>(index: &mut usize, size: usize, buf: &'de [u8]) -> bincode::Result<T>
    where
        T: Deserialize<'de>,
    {
        let end = std::cmp::min(*index + size, buf.len());
        let ret = bincode::options()
            .with_limit(PACKET_DATA_SIZE as u64)
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .deserialize(&buf[*index..end])?;
        *index += size;
        Ok(ret)
    }

    fn serialize_obj_into<'de, T>(
        index: &mut usize,
        size: usize,
        buf: &'de mut [u8],
        obj: &T,
    ) -> bincode::Result<()>
    where
        T: Serialize,
    {
        bincode::serialize_into(&mut buf[*index..*index + size], obj)?;
        *index += size;
        Ok(())
    }

    pub fn new_from_data(
        slot: Slot,
        index: u32,
        parent_offset: u16,
        data: &[u8],
        is_last_data: bool,
        is_last_in_slot: bool,
        reference_tick: u8,
        version: u16,
        fec_set_index: u32,
    ) -> Self {
        assert!(data.len() <= SIZE_OF_DATA_SHRED_PAYLOAD);
        let mut payload = vec![0; SHRED_PAYLOAD_SIZE];
        let common_header = ShredCommonHeader {
            slot,
            index,
            version,
            fec_set_index,
            ..ShredCommonHeader::default()
        };

        let size = (data.len() + SIZE_OF_DATA_SHRED_HEADER + SIZE_OF_COMMON_SHRED_HEADER) as u16;
        let mut data_header = DataShredHeader {
            parent_offset,
            flags: reference_tick.min(SHRED_TICK_REFERENCE_MASK),
            size,
        };

        if is_last_data {
            data_header.flags |= DATA_COMPLETE_SHRED
        }

        if is_last_in_slot {
            data_header.flags |= LAST_SHRED_IN_SLOT
        }

        let mut start = 0;
        Self::serialize_obj_into(
            &mut start,
            SIZE_OF_COMMON_SHRED_HEADER,
            &mut payload,
            &common_header,
        )
        .expect("Failed to write common header into shred buffer");

        Self::serialize_obj_into(
            &mut start,
            SIZE_OF_DATA_SHRED_HEADER,
            &mut payload,
            &data_header,
        )
        .expect("Failed to write data header into shred buffer");

        payload[start..start + data.len()].copy_from_slice(data);

        Self {
            common_header,
            data_header,
            coding_header: CodingShredHeader::default(),
            payload,
        }
    }

    pub fn new_from_serialized_shred(mut payload: Vec<u8>) -> Result<Self> {
        let mut start = 0;
        let common_header: ShredCommonHeader =
            Self::deserialize_obj(&mut start, SIZE_OF_COMMON_SHRED_HEADER, &payload)?;

        // Shreds are always padded out to SHRED_PAYLOAD_SIZE in storage so
        // that the trailing retransmitter-signature region is addressable.
        if payload.len() > SHRED_PAYLOAD_SIZE {
            return Err(ShredError::InvalidPayloadSize(payload.len()));
        }
        payload.resize(SHRED_PAYLOAD_SIZE, 0);
        let (data_header, coding_header) = match common_header.shred_type {
            ShredType::Code => {
                let coding_header: CodingShredHeader =
                    Self::deserialize_obj(&mut start, SIZE_OF_CODING_SHRED_HEADER, &payload)?;
                (DataShredHeader::default(), coding_header)
            }
            ShredType::Data => {
                let data_header: DataShredHeader =
                    Self::deserialize_obj(&mut start, SIZE_OF_DATA_SHRED_HEADER, &payload)?;
                (data_header, CodingShredHeader::default())
            }
        };

        Ok(Self {
            common_header,
            data_header,
            coding_header,
            payload,
        })
    }

    pub fn slot(&self) -> Slot {
        self.common_header.slot
    }

    pub fn index(&self) -> u32 {
        self.common_header.index
    }

    pub fn version(&self) -> u16 {
        self.common_header.version
    }

    pub fn fec_set_index(&self) -> u32 {
        self.common_header.fec_set_index
    }

    pub fn shred_type(&self) -> ShredType {
        self.common_header.shred_type
    }

    pub fn is_data(&self) -> bool {
        self.shred_type() == ShredType::Data
    }

    pub fn id(&self) -> ShredId {
        ShredId::new(self.slot(), self.index(), self.shred_type())
    }

    /// The ancestor slot this data shred chains from, if the parent offset
    /// resolves to a valid slot.
    pub fn parent(&self) -> Result<Option<Slot>> {
        if !self.is_data() {
            return Err(ShredError::InvalidShredType);
        }
        let slot = self.slot();
        if slot == 0 {
            return Ok(None);
        }
        let parent_offset = self.data_header.parent_offset;
        if parent_offset == 0 || u64::from(parent_offset) > slot {
            return Err(ShredError::InvalidParentOffset {
                slot,
                parent_offset,
            });
        }
        Ok(Some(slot - u64::from(parent_offset)))
    }

    pub fn data_complete(&self) -> bool {
        self.is_data() && self.data_header.flags & DATA_COMPLETE_SHRED != 0
    }

    pub fn last_in_slot(&self) -> bool {
        self.is_data() && self.data_header.flags & LAST_SHRED_IN_SLOT != 0
    }

    pub fn reference_tick(&self) -> u8 {
        if self.is_data() {
            self.data_header.flags & SHRED_TICK_REFERENCE_MASK
        } else {
            SHRED_TICK_REFERENCE_MASK
        }
    }

    pub fn payload(&self) -> &Vec<u8> {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// The serialized-entry bytes this data shred carries.
    pub fn data(&self) -> &[u8] {
        let size = self.payload.len().min(usize::from(self.data_header.size));
        let offset = SHRED_DATA_OFFSET.min(size);
        &self.payload[offset..size]
    }

    /// The retransmitter signature of a re-signed shred.
    pub fn retransmitter_signature(&self) -> Result<Signature> {
        layout::get_retransmitter_signature(&self.payload)
    }
}

pub mod layout {
    use super::*;

    fn get_shred_type(shred: &[u8]) -> Result<ShredType> {
        let shred_type = *shred
            .get(OFFSET_OF_SHRED_TYPE)
            .ok_or(ShredError::InvalidPayloadSize(shred.len()))?;
        ShredType::try_from(shred_type).map_err(|_| ShredError::InvalidShredType)
    }

    /// Parse the reference tick straight out of a serialized data shred.
    pub fn get_reference_tick(shred: &[u8]) -> Result<u8> {
        if get_shred_type(shred)? != ShredType::Data {
            return Err(ShredError::InvalidShredType);
        }
        let flags = shred
            .get(OFFSET_OF_DATA_SHRED_FLAGS)
            .ok_or(ShredError::InvalidPayloadSize(shred.len()))?;
        Ok(flags & SHRED_TICK_REFERENCE_MASK)
    }

    /// The trailing retransmitter signature, if the shred was re-signed.
    pub fn get_retransmitter_signature(shred: &[u8]) -> Result<Signature> {
        let offset = shred
            .len()
            .checked_sub(SIZE_OF_SIGNATURE)
            .ok_or(ShredError::InvalidPayloadSize(shred.len()))?;
        let signature = Signature::new(&shred[offset..]);
        if signature == Signature::default() {
            return Err(ShredError::NoRetransmitterSignature);
        }
        Ok(signature)
    }

    pub fn set_retransmitter_signature(shred: &mut [u8], signature: &Signature) -> Result<()> {
        let offset = shred
            .len()
            .checked_sub(SIZE_OF_SIGNATURE)
            .ok_or(ShredError::InvalidPayloadSize(shred.len()))?;
        shred[offset..].copy_from_slice(signature.as_ref());
        Ok(())
    }
}

/// Reconstruct the contiguous byte buffer of serialized entries from an
/// ordered group of data shreds.
pub fn deshred(shreds: &[Shred]) -> Result<Vec<u8>> {
    let index = shreds.first().ok_or(ShredError::IncompleteDataSet)?.index();
    let aligned = shreds.iter().zip(index..).all(|(s, i)| s.index() == i);
    let data_complete = {
        let shred = shreds.last().unwrap();
        shred.data_complete() || shred.last_in_slot()
    };
    if !data_complete || !aligned {
        return Err(ShredError::IncompleteDataSet);
    }
    let data: Vec<_> = shreds.iter().flat_map(Shred::data).copied().collect();
    if data.is_empty() {
        // For backward compatibility. This is needed when the data shred
        // payload is empty, so that deserializing to Vec<Entry> results in
        // an empty vector.
        let data_buffer_size = bincode::serialized_size(&Vec::<Entry>::default()).unwrap() as usize;
        Ok(vec![0u8; data_buffer_size])
    } else {
        Ok(data)
    }
}

/// Shred a batch of entries into one completed data block starting at
/// `next_shred_index`. The caller owns erasure coding and signing; this
/// helper only produces the aligned data shreds the blockstore stores.
pub fn entries_to_data_shreds(
    entries: &[Entry],
    slot: Slot,
    parent_slot: Slot,
    is_last_in_slot: bool,
    reference_tick: u8,
    next_shred_index: u32,
) -> Vec<Shred> {
    let parent_offset = (slot - parent_slot) as u16;
    let serialized = bincode::serialize(entries).expect("Failed to serialize entries");
    let chunks: Vec<&[u8]> = serialized.chunks(SIZE_OF_DATA_SHRED_PAYLOAD).collect();
    let num_shreds = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let is_last_data = i == num_shreds - 1;
            Shred::new_from_data(
                slot,
                next_shred_index + i as u32,
                parent_offset,
                chunk,
                is_last_data,
                is_last_data && is_last_in_slot,
                reference_tick,
                0, // version
                next_shred_index,
            )
        })
        .collect()
}
