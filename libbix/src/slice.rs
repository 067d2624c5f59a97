use crate::error::{BixError, BixResult};
use crate::index::{IndexKey, Partition};
use crate::io::{BufReadExt, ReadExt, SegmentIo, WriteExt};
use crate::name::BixName;
use crate::segment::{BitAddr, Segment, SegmentAddr};
use crate::serialize::{Deserialize, Serialize};
use anyhow::Context;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::io::{BufRead, Write};


/// one discrete value of a field
pub type Value = u64;

/// identifies one slice: the three-level routing key plus the discrete value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceKey {
    pub partition: Partition,
    pub bucket: BixName,
    pub field: BixName,
    pub value: Value,
}

impl SliceKey {
    pub fn new(partition: Partition, bucket: BixName, field: BixName, value: Value) -> Self {
        Self { partition, bucket, field, value }
    }

    pub fn index_key(self) -> IndexKey {
        IndexKey::new(self.partition, self.bucket, self.field)
    }
}

impl Default for SliceKey {
    fn default() -> Self {
        Self::new(0, BixName::EMPTY, BixName::EMPTY, 0)
    }
}

impl Display for SliceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}={}", self.partition, self.bucket, self.field, self.value)
    }
}

/// one materialized segment of a slice
#[derive(Debug, Clone, PartialEq)]
pub struct IndexNode {
    pub offset: SegmentAddr,
    pub segment: Segment,
}

impl IndexNode {
    pub fn zeroed(offset: SegmentAddr) -> Self {
        Self { offset, segment: Segment::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Intersection,
    SymmetricDifference,
}

type Nodes = SmallVec<[IndexNode; 1]>;

/// sparse bitset for one (partition, bucket, field, value) tuple
///
/// nodes are strictly increasing by offset with no duplicates; an offset with
/// no node reads as an all-zero segment
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSlice {
    key: SliceKey,
    nodes: Nodes,
}

impl Default for IndexSlice {
    fn default() -> Self {
        Self::new(SliceKey::default())
    }
}

impl IndexSlice {
    pub fn new(key: SliceKey) -> Self {
        Self { key, nodes: SmallVec::new() }
    }

    pub fn with_nodes(key: SliceKey, nodes: impl IntoIterator<Item = IndexNode>) -> Self {
        let nodes = nodes.into_iter().collect::<Nodes>();
        debug_assert!(nodes.windows(2).all(|pair| pair[0].offset < pair[1].offset));
        Self { key, nodes }
    }

    pub fn key(&self) -> SliceKey {
        self.key
    }

    pub fn value(&self) -> Value {
        self.key.value
    }

    pub fn nodes(&self) -> &[IndexNode] {
        &self.nodes
    }

    pub fn offsets(&self) -> impl Iterator<Item = SegmentAddr> + '_ {
        self.nodes.iter().map(|node| node.offset)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count_ones(&self) -> u64 {
        self.nodes.iter().map(|node| node.segment.count_ones() as u64).sum()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// drops all-zero nodes; purely an optimization, a sparse zero segment
    /// reads the same as a missing one
    pub fn compact(&mut self) {
        self.nodes.retain(|node| !node.segment.is_zero());
    }

    /// index of the first node at `offset` or greater, scanning from `from`
    // a linear scan is fine here, typical slices are short and the merges
    // advance monotonically
    fn insertion_point(&self, from: usize, offset: SegmentAddr) -> usize {
        self.nodes[from..]
            .iter()
            .position(|node| node.offset >= offset)
            .map(|i| from + i)
            .unwrap_or_else(|| self.nodes.len())
    }

    pub fn get_bit(&self, bit: u64) -> bool {
        let addr = BitAddr::decompose(bit);
        match self.nodes.get(self.insertion_point(0, addr.segment)) {
            Some(node) if node.offset == addr.segment => node.segment.get(addr.word, addr.bit),
            _ => false,
        }
    }

    /// set or clear one bit, reading the backing segment through `io` on
    /// first touch and writing it back after the update
    ///
    /// a failed read leaves the slice untouched; a failed write surfaces the
    /// error but the in-memory bit stays updated
    pub fn set_bit(&mut self, io: &mut dyn SegmentIo, bit: u64, state: bool) -> BixResult<()> {
        trace!("IndexSlice::set_bit(key: {}, bit: {}, state: {})", self.key, bit, state);
        let addr = BitAddr::decompose(bit);
        let i = self.insertion_point(0, addr.segment);

        let missing = match self.nodes.get(i) {
            Some(node) => node.offset != addr.segment,
            None => true,
        };
        if missing {
            let mut segment = Segment::default();
            io.read_segment(self.key, addr.segment, &mut segment)
                .context(BixError::SegmentReadFailed(self.key, addr.segment))?;
            self.nodes.insert(i, IndexNode { offset: addr.segment, segment });
        }

        let node = &mut self.nodes[i];
        node.segment.set(addr.word, addr.bit, state);
        io.write_segment(self.key, addr.segment, &node.segment)
            .context(BixError::SegmentWriteFailed(self.key, addr.segment))?;
        Ok(())
    }

    /// elementwise complement of the materialized segments only; addresses in
    /// missing segments still read false afterwards (a bounded complement
    /// would need an upper bound, which the core does not take)
    pub fn invert(&mut self) {
        for node in self.nodes.iter_mut() {
            node.segment.invert();
        }
    }

    /// aliased merge form: `self` is both the second operand and the output
    pub fn apply(&mut self, op: SetOp, other: &IndexSlice) {
        match op {
            SetOp::Union => self.merge_with(other, |acc, seg| *acc |= seg),
            SetOp::SymmetricDifference => self.merge_with(other, |acc, seg| *acc ^= seg),
            SetOp::Intersection => self.intersect_with(other),
        }
    }

    /// non-aliased three-operand form: `output` is cleared and receives `a op b`
    pub fn execute(
        op: SetOp,
        a: &IndexSlice,
        b: &IndexSlice,
        output: &mut IndexSlice,
    ) -> BixResult<()> {
        output.nodes.clear();
        output.nodes.extend(b.nodes.iter().cloned());
        output.apply(op, a);
        Ok(())
    }

    /// two-pointer merge of `other` into `self`: nodes present on both sides
    /// are combined with `combine`, nodes only in `other` are copied over,
    /// nodes only in `self` are left alone
    // zero results of `combine` are kept; see [Self::compact]
    fn merge_with(&mut self, other: &IndexSlice, mut combine: impl FnMut(&mut Segment, &Segment)) {
        let mut i = 0;
        for node in other.nodes.iter() {
            i = self.insertion_point(i, node.offset);
            match self.nodes.get_mut(i) {
                Some(existing) if existing.offset == node.offset => {
                    combine(&mut existing.segment, &node.segment)
                }
                _ => self.nodes.insert(i, node.clone()),
            }
            i += 1;
        }
    }

    /// two-pointer in-place intersection: offsets missing on either side are
    /// dropped, equal offsets are combined, the stale tail is truncated
    fn intersect_with(&mut self, other: &IndexSlice) {
        let mut keep = 0;
        let (mut i, mut j) = (0, 0);
        while i < self.nodes.len() && j < other.nodes.len() {
            match self.nodes[i].offset.cmp(&other.nodes[j].offset) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    let segment = &self.nodes[i].segment & &other.nodes[j].segment;
                    self.nodes[keep] = IndexNode { offset: self.nodes[i].offset, segment };
                    keep += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        self.nodes.truncate(keep);
    }
}

// the persistent form is just the node sequence; the key is storage's concern
impl Serialize for IndexSlice {
    fn serialize(&self, writer: &mut dyn Write) -> BixResult<()> {
        for node in self.nodes.iter() {
            writer.write_u64(node.offset)?;
            node.segment.serialize(writer)?;
        }
        Ok(())
    }
}

impl Deserialize for IndexSlice {
    fn deserialize(reader: &mut impl BufRead) -> BixResult<Self>
    where
        Self: Sized,
    {
        let mut slice = Self::default();
        while !reader.is_at_eof()? {
            let offset = reader.read_u64()?;
            let segment = Segment::deserialize(reader)?;
            if let Some(last) = slice.nodes.last() {
                ensure!(
                    last.offset < offset,
                    "slice nodes out of order: `{}` after `{}`",
                    offset,
                    last.offset
                );
            }
            slice.nodes.push(IndexNode { offset, segment });
        }
        Ok(slice)
    }
}
