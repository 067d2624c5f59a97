use crate::name::BixName;
use bumpalo::Bump as Arena;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

lazy_static::lazy_static! {
    static ref INTERNER: Mutex<Interner> = Mutex::new(Interner::default());
}

pub(crate) fn with_name_interner<R>(f: impl FnOnce(&mut Interner) -> R) -> R {
    f(&mut INTERNER.lock())
}

#[derive(Default)]
pub(crate) struct Interner {
    arena: Arena,
    set: FxHashSet<&'static str>,
}

impl Interner {
    pub fn intern(&mut self, s: &str) -> BixName {
        if let Some(&interned) = self.set.get(s) {
            return BixName::new(interned);
        }

        // the arena lives as long as the process, so handing out 'static strs is fine
        let ptr: &str =
            unsafe { std::str::from_utf8_unchecked(self.arena.alloc_slice_copy(s.as_bytes())) };
        let interned = unsafe { &*(ptr as *const str) };
        self.set.insert(interned);
        BixName::new(interned)
    }
}
