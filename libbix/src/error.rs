use crate::index::IndexKey;
use crate::query::ValueRange;
use crate::segment::SegmentAddr;
use crate::slice::SliceKey;
use std::fmt::{self, Display, Formatter};

pub type BixResult<T> = Result<T, BixGenericError>;
pub type BixGenericError = anyhow::Error;

// anyhow is fine for plumbing errors around, but the planner and the tests
// need a "rust" representation they can match against, hence the enum below
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub enum BixError {
    /// the set algebra or the planner was handed something structurally invalid
    IndexOperation(String),
    /// storage failed while reading one segment of a slice
    SegmentReadFailed(SliceKey, SegmentAddr),
    /// storage failed while writing one segment of a slice
    SegmentWriteFailed(SliceKey, SegmentAddr),
    IndexNotFound(IndexKey),
    SliceNotFound(SliceKey),
    /// a range with `lo > hi` where the caller demanded a non-empty one
    InvalidRange(ValueRange),
}

pub trait BixErrorExt {
    fn try_into_bix_error(self) -> BixResult<BixError>;
    fn try_into_index_not_found_err(self) -> BixResult<IndexKey>;
}

impl BixErrorExt for BixGenericError {
    /// tries to convert the generic error into the enum and just returns the
    /// previous error on failure
    fn try_into_bix_error(self) -> BixResult<BixError> {
        self.downcast::<BixError>()
    }

    fn try_into_index_not_found_err(self) -> BixResult<IndexKey> {
        match self.try_into_bix_error()? {
            BixError::IndexNotFound(key) => Ok(key),
            err => Err(anyhow!(err)),
        }
    }
}

pub trait BixResultExt {
    fn is_not_found_err(&self) -> bool;
    fn is_fatal(&self) -> bool;
}

macro_rules! error_ext_is_method {
    ($method:ident) => {
        fn $method(&self) -> bool {
            match self {
                Ok(..) => false,
                Err(err) => err.$method(),
            }
        }
    };
}

impl<T> BixResultExt for BixResult<T> {
    error_ext_is_method!(is_not_found_err);

    error_ext_is_method!(is_fatal);
}

impl BixResultExt for BixGenericError {
    fn is_not_found_err(&self) -> bool {
        match self.downcast_ref::<BixError>() {
            Some(err) => {
                matches!(err, BixError::IndexNotFound(..) | BixError::SliceNotFound(..))
            }
            None => false,
        }
    }

    fn is_fatal(&self) -> bool {
        match self.downcast_ref::<BixError>() {
            Some(err) => {
                !matches!(err, BixError::IndexNotFound(..) | BixError::SliceNotFound(..))
            }
            None => true,
        }
    }
}

impl Display for BixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BixError::IndexOperation(msg) => write!(f, "invalid index operation: {}", msg),
            BixError::SegmentReadFailed(key, offset) => {
                write!(f, "failed to read segment `{}` of slice `{}`", offset, key)
            }
            BixError::SegmentWriteFailed(key, offset) => {
                write!(f, "failed to write segment `{}` of slice `{}`", offset, key)
            }
            BixError::IndexNotFound(key) => write!(f, "index `{}` not found", key),
            BixError::SliceNotFound(key) => write!(f, "slice `{}` not found", key),
            BixError::InvalidRange(range) => {
                write!(f, "range `{}` is empty (lo > hi)", range)
            }
        }
    }
}
