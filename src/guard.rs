//! Debug-only busy flag for `Dict` entry points.
//!
//! `Dict` calls into user code (`K: Hash`, `K: Eq`) while a chain may be
//! half-relinked. A key whose `Eq` reaches back into the same dictionary
//! would observe that state, so every public operation marks the
//! dictionary busy for its duration. Debug builds panic on nested entry;
//! release builds keep nothing but a zero-sized marker.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

pub(crate) struct BusyFlag {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded structure: keep the owner !Sync.
    _unsync: PhantomData<core::cell::Cell<()>>,
}

impl BusyFlag {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _unsync: PhantomData,
        }
    }

    /// Mark the owner busy for the lifetime of the returned guard.
    ///
    /// `op` names the entry point so a nested call reports both sides.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> BusyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("Dict::{op} re-entered while Dict::{outer} was running user Hash/Eq code");
            }
            self.active.set(Some(op));
            return BusyGuard { flag: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return BusyGuard { _flag: PhantomData };
        }
    }
}

impl Default for BusyFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for BusyFlag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut s = f.debug_struct("BusyFlag");
        #[cfg(debug_assertions)]
        s.field("active", &self.active.get());
        s.finish()
    }
}

pub(crate) struct BusyGuard<'a> {
    #[cfg(debug_assertions)]
    flag: &'a BusyFlag,
    #[cfg(not(debug_assertions))]
    _flag: PhantomData<&'a BusyFlag>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.flag.active.get().is_some());
            self.flag.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BusyFlag;

    #[test]
    fn sequential_entries_are_allowed() {
        let flag = BusyFlag::new();
        {
            let _g = flag.enter("insert");
        }
        let _g = flag.enter("find");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_with_both_names() {
        let flag = BusyFlag::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = flag.enter("insert");
            let _inner = flag.enter("contains");
        }));
        let payload = res.expect_err("nested entry must panic in debug builds");
        let msg = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("Dict::contains"), "{msg}");
        assert!(msg.contains("Dict::insert"), "{msg}");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_free_in_release() {
        let flag = BusyFlag::new();
        let _a = flag.enter("insert");
        let _b = flag.enter("contains");
    }
}
