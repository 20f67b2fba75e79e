//! Cursors over the live entries of a `Dict`.
//!
//! Both cursors visit the primary table, then the rehash source (if a
//! cycle is active), bucket by bucket and link by link. The successor of
//! the entry being handed out is resolved before it is returned, so the
//! safe cursor can unlink what it just yielded without losing its place.

use crate::dict::{Link, Tables};
use crate::error::Error;
use core::iter::FusedIterator;

#[derive(Clone, Copy, Debug, Default)]
struct Cursor {
    table: usize,
    bucket: usize,
}

/// Returns `successor` if the chain continues, else the head of the next
/// non-empty bucket at or after `pos`.
fn seek<K, V>(core: &Tables<K, V>, pos: &mut Cursor, successor: Link) -> Link {
    if successor.is_some() {
        return successor;
    }
    while let Some(buckets) = core.buckets(pos.table) {
        while pos.bucket < buckets.len() {
            let head = buckets[pos.bucket];
            pos.bucket += 1;
            if head.is_some() {
                return head;
            }
        }
        pos.table += 1;
        pos.bucket = 0;
    }
    None
}

/// Shared-borrow iterator over `(&K, &V)`.
///
/// The borrow freezes the dictionary, so no rehash step or mutation can
/// happen while it exists.
pub struct Iter<'a, K, V> {
    core: &'a Tables<K, V>,
    pos: Cursor,
    next: Link,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(core: &'a Tables<K, V>) -> Self {
        let mut pos = Cursor::default();
        let next = seek(core, &mut pos, None);
        Iter {
            core,
            pos,
            next,
            remaining: core.entries.len(),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Like `next`, but exhaustion is an error.
    pub fn try_next(&mut self) -> Result<(&'a K, &'a V), Error> {
        self.next().ok_or(Error::IteratorExhausted)
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let core = self.core;
        let e = &core.entries[id];
        self.next = seek(core, &mut self.pos, e.next);
        self.remaining -= 1;
        Some((&e.key, &e.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            core: self.core,
            pos: self.pos,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

/// Exclusive cursor that can update values and unlink visited entries.
///
/// Holds the dictionary mutably, so no rehash step runs until it is
/// dropped. Only the entry last yielded may be removed; there is no insert.
/// Not an `Iterator`: each yielded `&mut V` borrows the cursor.
pub struct SafeIter<'a, K, V> {
    core: &'a mut Tables<K, V>,
    pos: Cursor,
    next: Link,
    current: Link,
}

impl<'a, K, V> SafeIter<'a, K, V> {
    pub(crate) fn new(core: &'a mut Tables<K, V>) -> Self {
        let mut pos = Cursor::default();
        let next = seek(core, &mut pos, None);
        SafeIter {
            core,
            pos,
            next,
            current: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn next_entry(&mut self) -> Option<(&K, &mut V)> {
        let id = self.next?;
        let successor = self.core.entries[id].next;
        self.next = seek(self.core, &mut self.pos, successor);
        self.current = Some(id);
        let e = &mut self.core.entries[id];
        Some((&e.key, &mut e.value))
    }

    /// Like `next_entry`, but exhaustion is an error.
    pub fn try_next(&mut self) -> Result<(&K, &mut V), Error> {
        self.next_entry().ok_or(Error::IteratorExhausted)
    }

    /// Unlinks the entry last yielded and returns it. `None` if nothing was
    /// yielded yet or it was already removed.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let id = self.current.take()?;
        self.core.unlink(id).map(|e| (e.key, e.value))
    }
}

#[cfg(test)]
mod tests {
    use crate::dict::Dict;
    use crate::error::Error;
    use crate::hash::IdentityState;
    use std::collections::BTreeSet;

    fn mid_rehash() -> Dict<u64, u64, IdentityState> {
        let mut d = Dict::with_capacity_and_hasher(64, IdentityState);
        for k in 0..65 {
            d.insert(k, k);
        }
        assert!(d.is_rehashing());
        d
    }

    #[test]
    fn empty_dict_has_nothing_to_yield() {
        let d: Dict<u64, u64, _> = Dict::with_hasher(IdentityState);
        let mut it = d.iter();
        assert!(!it.has_next());
        assert_eq!(it.len(), 0);
        assert_eq!(it.try_next(), Err(Error::IteratorExhausted));
    }

    /// Invariant: exhaustion is reported, and stays reported.
    #[test]
    fn try_next_past_end_fails() {
        let mut d: Dict<u64, &str, _> = Dict::with_hasher(IdentityState);
        d.insert(1, "a");
        let mut it = d.iter();
        assert!(it.has_next());
        assert_eq!(it.try_next(), Ok((&1, &"a")));
        assert!(!it.has_next());
        assert_eq!(it.try_next(), Err(Error::IteratorExhausted));
        assert_eq!(it.next(), None);
    }

    /// Invariant: each live entry is yielded exactly once across both tables,
    /// and the reported length counts down to zero.
    #[test]
    fn iter_spans_both_tables_mid_rehash() {
        let d = mid_rehash();
        let mut it = d.iter();
        assert_eq!(it.len(), 65);
        let mut seen = BTreeSet::new();
        while let Some((k, _)) = it.next() {
            assert!(seen.insert(*k), "key {k} yielded twice");
            assert_eq!(it.len(), 65 - seen.len());
        }
        assert_eq!(seen, (0..65).collect());
    }

    #[test]
    fn safe_iter_updates_values_in_place() {
        let mut d = mid_rehash();
        {
            let mut it = d.safe_iter();
            while let Some((k, v)) = it.next_entry() {
                *v = *k * 2;
            }
            assert!(it.try_next().is_err());
        }
        for k in 0..65 {
            assert_eq!(d.find(&k), Some(&(k * 2)));
        }
        d.check_invariants();
    }

    /// Invariant: unlinking the yielded entry does not disturb the walk,
    /// including inside shared chains, and never advances the rehash.
    #[test]
    fn safe_iter_removes_visited_entries() {
        let mut d = mid_rehash();
        let all_keys = d.keys();
        let mut visited = 0;
        {
            let mut it = d.safe_iter();
            while let Some((k, _)) = it.next_entry() {
                visited += 1;
                if *k % 3 == 0 {
                    let (rk, rv) = it.remove_current().expect("just yielded");
                    assert_eq!(rk, rv);
                    assert!(it.remove_current().is_none());
                }
            }
        }
        assert_eq!(visited, 65);
        assert!(d.is_rehashing());
        assert_eq!(d.len(), 65 - 22);
        d.check_invariants();
        for k in all_keys {
            assert_eq!(d.contains(&k), k % 3 != 0);
        }
    }

    #[test]
    fn safe_iter_walks_colliding_chain() {
        let mut d: Dict<u64, u64, _> = Dict::with_capacity_and_hasher(4, IdentityState);
        for k in [1, 5, 9] {
            d.insert(k, k);
        }
        let mut it = d.safe_iter();
        let mut order = Vec::new();
        while let Some((k, _)) = it.next_entry() {
            order.push(*k);
            if *k == 5 {
                it.remove_current();
            }
        }
        drop(it);
        assert_eq!(order, vec![9, 5, 1]);
        assert_eq!(d.keys(), vec![9, 1]);
        d.check_invariants();
    }
}
