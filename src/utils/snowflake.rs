//! Shard-aware identifier layout and generation.
//!
//! Ids are 64-bit values packing `(timestamp, node, sequence)` as 41/10/12
//! bits. The timestamp counts milliseconds since a configurable epoch, the
//! node is the shard number of the owning backend, and the sequence
//! disambiguates ids generated within one millisecond. Generation order is
//! strictly increasing per node.

use crate::error::AppError;
use crate::utils::base58::{self, Base58Error};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;

const NODE_SHIFT: u32 = SEQUENCE_BITS;
const TIMESTAMP_SHIFT: u32 = NODE_BITS + SEQUENCE_BITS;

const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Largest valid shard/node number.
pub const MAX_NODE: u64 = (1 << NODE_BITS) - 1;

/// A shard-encoded short-URL identifier.
///
/// The external (human-facing) representation is the base58 encoding of the
/// raw value; see [`ShortId::to_base58`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortId(u64);

impl ShortId {
    /// Wraps a raw 64-bit id.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Packs components into an id. `node` and `sequence` must already be in
    /// range; excess bits are masked.
    fn from_parts(timestamp: u64, node: u64, sequence: u64) -> Self {
        Self(
            (timestamp << TIMESTAMP_SHIFT)
                | ((node & MAX_NODE) << NODE_SHIFT)
                | (sequence & SEQUENCE_MASK),
        )
    }

    /// The raw 64-bit value.
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// The shard/node number embedded in this id.
    pub fn node(self) -> u64 {
        (self.0 >> NODE_SHIFT) & MAX_NODE
    }

    /// The per-millisecond sequence component.
    pub fn sequence(self) -> u64 {
        self.0 & SEQUENCE_MASK
    }

    /// Milliseconds since the generator epoch at which this id was minted.
    pub fn timestamp_offset(self) -> u64 {
        self.0 >> TIMESTAMP_SHIFT
    }

    /// Encodes the id for external use (URL path segment).
    pub fn to_base58(self) -> String {
        base58::encode(self.0)
    }

    /// Parses an external id string.
    ///
    /// # Errors
    ///
    /// Returns [`Base58Error`] for input outside the alphabet; the read path
    /// maps this to a not-found outcome.
    pub fn parse_base58(encoded: &str) -> Result<Self, Base58Error> {
        base58::decode(encoded).map(Self)
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

/// Source of current wall-clock time in unix milliseconds.
///
/// Abstracted so tests can substitute a deterministic clock.
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Production clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

struct GenState {
    last_offset: u64,
    sequence: u64,
}

/// Monotonic per-shard id generator.
///
/// The `(last_offset, sequence)` pair behind the mutex is the only mutable
/// state the core owns; every [`IdGenerator::generate`] call serializes
/// through it, which is what guarantees uniqueness under concurrent callers.
pub struct IdGenerator<C: TimeSource = SystemClock> {
    node: u64,
    epoch_millis: u64,
    state: Mutex<GenState>,
    clock: C,
}

impl IdGenerator<SystemClock> {
    /// Creates a generator for `node` using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `node` exceeds [`MAX_NODE`].
    pub fn new(node: u64, epoch_millis: u64) -> Result<Self, AppError> {
        Self::with_clock(node, epoch_millis, SystemClock)
    }
}

impl<C: TimeSource> IdGenerator<C> {
    /// Creates a generator with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `node` exceeds [`MAX_NODE`].
    pub fn with_clock(node: u64, epoch_millis: u64, clock: C) -> Result<Self, AppError> {
        if node > MAX_NODE {
            return Err(AppError::Config(format!(
                "node id {node} out of range 0-{MAX_NODE}"
            )));
        }
        Ok(Self {
            node,
            epoch_millis,
            state: Mutex::new(GenState {
                last_offset: 0,
                sequence: 0,
            }),
            clock,
        })
    }

    /// The node number encoded into every generated id.
    pub fn node(&self) -> u64 {
        self.node
    }

    /// Produces the next id.
    ///
    /// Ids from one generator are strictly increasing. Calls within the same
    /// millisecond increment the sequence; when the sequence is exhausted the
    /// call spins (sub-millisecond) until the clock ticks over.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ClockRegression`] if the clock reads behind the
    /// last recorded timestamp - failing loudly beats emitting a duplicate.
    pub fn generate(&self) -> Result<ShortId, AppError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::Internal("id generator lock poisoned".into()))?;

        let mut now = self.offset_millis()?;

        match now.cmp(&state.last_offset) {
            Ordering::Less => {
                return Err(AppError::ClockRegression(state.last_offset - now));
            }
            Ordering::Greater => {
                state.last_offset = now;
                state.sequence = 0;
            }
            Ordering::Equal => {
                state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
                if state.sequence == 0 {
                    // sequence exhausted for this tick
                    while now <= state.last_offset {
                        std::hint::spin_loop();
                        now = self.offset_millis()?;
                    }
                    state.last_offset = now;
                }
            }
        }

        Ok(ShortId::from_parts(
            state.last_offset,
            self.node,
            state.sequence,
        ))
    }

    /// Current clock reading as milliseconds past the configured epoch.
    fn offset_millis(&self) -> Result<u64, AppError> {
        let now = self.clock.now_millis();
        now.checked_sub(self.epoch_millis)
            .ok_or_else(|| AppError::ClockRegression(self.epoch_millis - now))
    }
}
