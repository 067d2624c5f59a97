use crate::interner::with_name_interner;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// interned utf8 name for buckets and fields
// interning is not free, and is done so the routing keys that carry these
// names are `Copy` and hash cheaply no matter how many slices hold them
#[derive(Clone, Copy, Eq)]
pub struct BixName {
    name: &'static str,
}

impl BixName {
    pub const EMPTY: Self = Self { name: "" };

    pub(crate) const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn intern(name: impl AsRef<str>) -> Self {
        with_name_interner(|interner| interner.intern(name.as_ref()))
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        self.name
    }

    pub fn is_empty(self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for BixName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for BixName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialOrd for BixName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BixName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Deref for BixName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.name
    }
}

impl From<&str> for BixName {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl Display for BixName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Debug for BixName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.name)
    }
}
