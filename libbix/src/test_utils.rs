use crate::error::{BixError, BixResult};
use crate::index::{BixIndex, IndexKey};
use crate::io::SegmentIo;
use crate::name::BixName;
use crate::query::{QueryRegex, RegexExpander, ValueRange};
use crate::segment::{Segment, SegmentAddr, SEGMENT_BYTES};
use crate::slice::{IndexNode, IndexSlice, SliceKey, Value};
use rustc_hash::FxHashMap;
use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// call counters for [MemIo], shared out so tests can observe io traffic
/// after the io has been boxed into a context
#[derive(Clone, Default)]
pub struct IoStats {
    pub index_reads: Rc<Cell<usize>>,
    pub segment_reads: Rc<Cell<usize>>,
    pub segment_writes: Rc<Cell<usize>>,
}

/// in-memory segment store; the storage engine the tests run against
#[derive(Default)]
pub struct MemIo {
    segments: FxHashMap<(SliceKey, SegmentAddr), Segment>,
    stats: IoStats,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MemIo {
    pub fn stats(&self) -> IoStats {
        self.stats.clone()
    }

    fn slice_for(&self, key: SliceKey) -> IndexSlice {
        let mut nodes = self
            .segments
            .iter()
            .filter(|((k, _), _)| *k == key)
            .map(|((_, offset), segment)| IndexNode { offset: *offset, segment: *segment })
            .collect::<Vec<_>>();
        nodes.sort_by_key(|node| node.offset);
        IndexSlice::with_nodes(key, nodes)
    }
}

impl SegmentIo for MemIo {
    fn read_index(&mut self, key: IndexKey) -> BixResult<BixIndex> {
        self.stats.index_reads.set(self.stats.index_reads.get() + 1);
        if self.fail_reads {
            bail!("read_index failed (simulated)");
        }

        let values = self
            .segments
            .keys()
            .filter(|(k, _)| k.index_key() == key)
            .map(|(k, _)| k.value)
            .collect::<BTreeSet<Value>>();

        let mut index = BixIndex::new(key);
        for value in values {
            index.insert_slice(self.slice_for(key.slice_key(value)));
        }
        Ok(index)
    }

    fn read_index_slice(&mut self, key: SliceKey) -> BixResult<IndexSlice> {
        if self.fail_reads {
            bail!("read_index_slice failed (simulated)");
        }
        let slice = self.slice_for(key);
        if slice.is_empty() {
            return Err(anyhow!(BixError::SliceNotFound(key)));
        }
        Ok(slice)
    }

    fn read_segment(
        &mut self,
        key: SliceKey,
        offset: SegmentAddr,
        output: &mut Segment,
    ) -> BixResult<()> {
        self.stats.segment_reads.set(self.stats.segment_reads.get() + 1);
        if self.fail_reads {
            bail!("read_segment failed (simulated)");
        }
        match self.segments.get(&(key, offset)) {
            Some(segment) => *output = *segment,
            // a clean miss reads as all zeroes
            None => output.zero(),
        }
        Ok(())
    }

    fn write_segment(
        &mut self,
        key: SliceKey,
        offset: SegmentAddr,
        segment: &Segment,
    ) -> BixResult<()> {
        self.stats.segment_writes.set(self.stats.segment_writes.get() + 1);
        if self.fail_writes {
            bail!("write_segment failed (simulated)");
        }
        self.segments.insert((key, offset), *segment);
        Ok(())
    }

    fn estimate_size(&mut self, key: SliceKey) -> BixResult<u64> {
        Ok(self.segments.keys().filter(|(k, _)| *k == key).count() as u64 * SEGMENT_BYTES as u64)
    }
}

/// expander for tests: every regex expands to the same preset ranges
pub struct StubExpander {
    pub ranges: Vec<ValueRange>,
}

impl RegexExpander for StubExpander {
    fn to_ranges(&self, _regex: &QueryRegex, output: &mut Vec<ValueRange>) -> BixResult<()> {
        output.extend(self.ranges.iter().copied());
        Ok(())
    }
}

/// expander that refuses everything, for queries that must not contain regexes
pub struct NoRegexes;

impl RegexExpander for NoRegexes {
    fn to_ranges(&self, regex: &QueryRegex, _output: &mut Vec<ValueRange>) -> BixResult<()> {
        bail!("unexpected regex `{}` in query", regex)
    }
}

pub fn test_index_key(field: &str) -> IndexKey {
    IndexKey::new(0, BixName::intern("default"), BixName::intern(field))
}

pub fn test_slice_key(field: &str, value: Value) -> SliceKey {
    test_index_key(field).slice_key(value)
}
