use crate::error::{BixError, BixResult};
use crate::index::{BixIndex, IndexKey};
use crate::io::SegmentIo;
use crate::slice::SliceKey;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::fmt::{self, Debug, Formatter};

/// directory of indexes, lazily materialized through the io capability
///
/// exclusive access per context is the concurrency model here: one query at a
/// time mutates it, hosts that want parallelism run one context per writer
pub struct BixContext {
    io: Box<dyn SegmentIo>,
    indexes: FxHashMap<IndexKey, BixIndex>,
}

impl Debug for BixContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<bixcontext>")
    }
}

impl BixContext {
    pub fn new(io: Box<dyn SegmentIo>) -> Self {
        Self { io, indexes: FxHashMap::default() }
    }

    /// the index for `key`, read through storage on first touch
    /// creation is idempotent; later calls are a map lookup
    pub fn get_index(&mut self, key: IndexKey) -> BixResult<&mut BixIndex> {
        match self.indexes.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let index = self.io.read_index(key)?;
                if log_enabled!(log::Level::Debug) {
                    let estimate: u64 = index
                        .values()
                        .map(|value| self.io.estimate_size(key.slice_key(value)).unwrap_or(0))
                        .sum();
                    debug!(
                        "BixContext::get_index(key: {}): materialized {} slices (~{} bytes)",
                        key,
                        index.len(),
                        estimate
                    );
                }
                Ok(entry.insert(index))
            }
        }
    }

    /// write path: set or clear one bit of one slice, reading and writing
    /// through storage so later reads in the same query observe it
    pub fn set_bit(&mut self, key: SliceKey, bit: u64, state: bool) -> BixResult<()> {
        self.get_index(key.index_key())?;
        // split the borrow so the index can drive the io capability
        let Self { io, indexes } = self;
        let index = indexes
            .get_mut(&key.index_key())
            .ok_or_else(|| anyhow!(BixError::IndexNotFound(key.index_key())))?;
        index.set_bit(io.as_mut(), key.value, bit, state)
    }

    pub fn io_mut(&mut self) -> &mut dyn SegmentIo {
        self.io.as_mut()
    }
}
