use crate::error::BixResult;
use crate::io::SegmentIo;
use crate::name::BixName;
use crate::query::ValueRange;
use crate::slice::{IndexSlice, SetOp, SliceKey, Value};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};


pub type Partition = u32;

/// the three-level routing key naming one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub partition: Partition,
    pub bucket: BixName,
    pub field: BixName,
}

impl IndexKey {
    pub fn new(partition: Partition, bucket: BixName, field: BixName) -> Self {
        Self { partition, bucket, field }
    }

    pub fn slice_key(self, value: Value) -> SliceKey {
        SliceKey::new(self.partition, self.bucket, self.field, value)
    }
}

impl Display for IndexKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.partition, self.bucket, self.field)
    }
}

/// all slices for one (partition, bucket, field), keyed by discrete value
///
/// the map is ordered so inclusive value ranges materialize with one scan
#[derive(Debug, Clone)]
pub struct BixIndex {
    key: IndexKey,
    slices: BTreeMap<Value, IndexSlice>,
}

impl BixIndex {
    pub fn new(key: IndexKey) -> Self {
        Self { key, slices: BTreeMap::new() }
    }

    pub fn key(&self) -> IndexKey {
        self.key
    }

    /// number of values that have a slice
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.slices.keys().copied()
    }

    pub fn segment_count(&self) -> usize {
        self.slices.values().map(IndexSlice::len).sum()
    }

    pub fn get_slice(&self, value: Value) -> Option<&IndexSlice> {
        self.slices.get(&value)
    }

    /// registers a slice under its own value; replaces any existing one
    pub fn insert_slice(&mut self, slice: IndexSlice) {
        debug_assert_eq!(slice.key().index_key(), self.key);
        self.slices.insert(slice.value(), slice);
    }

    /// the slice for `value`, created empty if absent
    pub fn slice_mut(&mut self, value: Value) -> &mut IndexSlice {
        let key = self.key;
        self.slices.entry(value).or_insert_with(|| IndexSlice::new(key.slice_key(value)))
    }

    pub fn set_bit(
        &mut self,
        io: &mut dyn SegmentIo,
        value: Value,
        bit: u64,
        state: bool,
    ) -> BixResult<()> {
        self.slice_mut(value).set_bit(io, bit, state)
    }

    /// copies the slice for `value` into `output` (a missing value is empty)
    pub fn slice_into(&self, value: Value, output: &mut IndexSlice) {
        output.clear();
        if let Some(slice) = self.slices.get(&value) {
            output.apply(SetOp::Union, slice);
        }
    }

    /// folds the slice of every value inside each inclusive range into
    /// `output` with `op`; a range with `lo > hi` is empty and contributes
    /// nothing
    pub fn slice_ranges(
        &self,
        ranges: &[ValueRange],
        op: SetOp,
        output: &mut IndexSlice,
    ) -> BixResult<()> {
        for range in ranges {
            if range.is_empty() {
                continue;
            }
            for slice in self.slices.range(range.lo..=range.hi).map(|(_, slice)| slice) {
                output.apply(op, slice);
            }
        }
        Ok(())
    }

    /// the "field exists" bitset: union of every value's slice
    pub fn slice_all(&self, output: &mut IndexSlice) {
        for slice in self.slices.values() {
            output.apply(SetOp::Union, slice);
        }
    }
}
