use crate::error::BixResult;
use crate::index::{BixIndex, IndexKey};
use crate::segment::{Segment, SegmentAddr};
use crate::slice::{IndexSlice, SliceKey};
use std::io::{self, prelude::*};

// all wire integers are little-endian
pub(crate) trait ReadExt: Read {
    fn read_u64(&mut self) -> io::Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
}

impl<R: Read + ?Sized> ReadExt for R {
}

pub(crate) trait WriteExt: Write {
    fn write_u64(&mut self, u: u64) -> io::Result<()> {
        self.write_all(&u.to_le_bytes())
    }
}

impl<W: Write + ?Sized> WriteExt for W {
}

pub(crate) trait BufReadExt: BufRead {
    fn is_at_eof(&mut self) -> io::Result<bool> {
        Ok(self.fill_buf()?.is_empty())
    }
}

impl<R: BufRead + ?Sized> BufReadExt for R {
}

/// the storage capability the core reads and writes segments through
///
/// implementations are synchronous; reads issued after a `write_segment` for
/// the same key and offset must observe that write
pub trait SegmentIo {
    /// materialize the whole index for `key` (all values that have slices)
    fn read_index(&mut self, key: IndexKey) -> BixResult<BixIndex>;

    fn read_index_slice(&mut self, key: SliceKey) -> BixResult<IndexSlice>;

    /// read one segment into `output`
    /// a clean miss zeroes `output` and succeeds; only real storage failures error
    fn read_segment(
        &mut self,
        key: SliceKey,
        offset: SegmentAddr,
        output: &mut Segment,
    ) -> BixResult<()>;

    fn write_segment(
        &mut self,
        key: SliceKey,
        offset: SegmentAddr,
        segment: &Segment,
    ) -> BixResult<()>;

    /// rough number of bytes backing `key`, for diagnostics only
    fn estimate_size(&mut self, key: SliceKey) -> BixResult<u64>;
}
