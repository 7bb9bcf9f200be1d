//! Protocol time: slots, epochs, and tick arithmetic.

/// The default tick rate that the cluster attempts to achieve.  Note that the
/// actual tick rate at any given time should be expected to drift.
pub const DEFAULT_TICKS_PER_SECOND: u64 = 160;

/// The number of milliseconds per tick (6).
pub const MS_PER_TICK: u64 = 1000 / DEFAULT_TICKS_PER_SECOND;

/// The number of ticks in a slot.
pub const DEFAULT_TICKS_PER_SLOT: u64 = 64;

/// The expected duration of a slot (400 milliseconds).
pub const DEFAULT_MS_PER_SLOT: u64 = 1000 * DEFAULT_TICKS_PER_SLOT / DEFAULT_TICKS_PER_SECOND;

/// The number of consecutive leader slots each leader is assigned.
pub const NUM_CONSECUTIVE_LEADER_SLOTS: u64 = 4;

/// The unit of time given to a leader for encoding a block.
///
/// It is some some number of _ticks_ long.
pub type Slot = u64;

/// The unit of time a given leader schedule is honored.
///
/// It lasts for some number of [`Slot`]s.
pub type Epoch = u64;

/// An approximate measure of real-world time, expressed as Unix time (i.e.
/// seconds since the Unix epoch).
pub type UnixTimestamp = i64;
