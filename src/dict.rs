//! Dict: chained hash table with incremental two-table rehashing.
//!
//! Entries live in a generational arena; buckets and `next` links hold
//! arena keys, so each entry has exactly one owner slot (a bucket head or
//! its predecessor's `next`). Growth never moves more than a bounded batch
//! of buckets per call: a rehash cycle swaps in a table of twice the size
//! and the old one drains into it a few buckets at a time, paid for by
//! `insert`, `find_mut` and `remove`.

use crate::guard::BusyFlag;
use crate::hash::DefaultHashBuilder;
use crate::iter::{Iter, SafeIter};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use slotmap::{DefaultKey, SlotMap};

pub(crate) type Link = Option<DefaultKey>;

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    // Indexing always uses the stored hash; `K: Hash` runs once, at insert.
    pub(crate) hash: u64,
    pub(crate) next: Link,
}

/// Bucket array whose length is a power of two.
#[derive(Clone, Debug)]
pub(crate) struct Table {
    pub(crate) buckets: Box<[Link]>,
}

impl Table {
    fn with_size(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Table {
            buckets: vec![None; size].into_boxed_slice(),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn slot(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }
}

#[derive(Clone, Debug)]
struct Rehash {
    source: Table,
    // Buckets of `source` below this index are already migrated (empty).
    cursor: usize,
}

/// Sizing knobs for a [`Dict`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DictConfig {
    min_size: usize,
    resize_ratio: f64,
    rehash_batch_divisor: usize,
}

impl DictConfig {
    /// Minimum size 4, growth at load factor 1.0, a tenth of the old
    /// table migrated per step.
    pub const fn new() -> Self {
        Self {
            min_size: 4,
            resize_ratio: 1.0,
            rehash_batch_divisor: 10,
        }
    }

    /// Smallest table size; rounded up to a power of two.
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size.max(1).next_power_of_two();
        self
    }

    /// Load factor at which an insert starts a rehash cycle.
    pub fn with_resize_ratio(mut self, ratio: f64) -> Self {
        assert!(
            ratio.is_finite() && ratio > 0.0,
            "resize ratio must be finite and positive, got {ratio}"
        );
        self.resize_ratio = ratio;
        self
    }

    /// Each rehash step migrates `max(1, old_size / divisor)` buckets.
    pub fn with_rehash_batch_divisor(mut self, divisor: usize) -> Self {
        assert!(divisor >= 1, "rehash batch divisor must be at least 1");
        self.rehash_batch_divisor = divisor;
        self
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn resize_ratio(&self) -> f64 {
        self.resize_ratio
    }

    pub fn rehash_batch_divisor(&self) -> usize {
        self.rehash_batch_divisor
    }
}

impl Default for DictConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Hasher-free structural state: arena, primary table, rehash source.
#[derive(Clone, Debug)]
pub(crate) struct Tables<K, V> {
    pub(crate) entries: SlotMap<DefaultKey, Entry<K, V>>,
    table: Table,
    rehash: Option<Rehash>,
    config: DictConfig,
}

impl<K, V> Tables<K, V> {
    fn new(size: usize, config: DictConfig) -> Self {
        Tables {
            entries: SlotMap::with_key(),
            table: Table::with_size(size),
            rehash: None,
            config,
        }
    }

    /// Bucket heads of the primary (`0`) or rehash source (`1`) table.
    pub(crate) fn buckets(&self, which: usize) -> Option<&[Link]> {
        match which {
            0 => Some(&*self.table.buckets),
            1 => self.rehash.as_ref().map(|r| &*r.source.buckets),
            _ => None,
        }
    }

    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if let Some(id) = self.chain_find(&self.table, hash, q) {
            return Some(id);
        }
        self.rehash
            .as_ref()
            .and_then(|r| self.chain_find(&r.source, hash, q))
    }

    fn chain_find<Q>(&self, table: &Table, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = table.buckets[table.slot(hash)];
        while let Some(id) = cur {
            let e = &self.entries[id];
            if e.hash == hash && e.key.borrow() == q {
                return Some(id);
            }
            cur = e.next;
        }
        None
    }

    fn push_front(&mut self, key: K, value: V, hash: u64) {
        let slot = self.table.slot(hash);
        let next = self.table.buckets[slot];
        let id = self.entries.insert(Entry {
            key,
            value,
            hash,
            next,
        });
        self.table.buckets[slot] = Some(id);
    }

    /// Detaches `id` from whichever table holds it and frees its slot.
    pub(crate) fn unlink(&mut self, id: DefaultKey) -> Option<Entry<K, V>> {
        let hash = self.entries.get(id)?.hash;
        let found = Self::unlink_from(&mut self.entries, &mut self.table, hash, id)
            || self
                .rehash
                .as_mut()
                .is_some_and(|r| Self::unlink_from(&mut self.entries, &mut r.source, hash, id));
        debug_assert!(found, "live entry missing from both tables");
        self.entries.remove(id)
    }

    fn unlink_from(
        entries: &mut SlotMap<DefaultKey, Entry<K, V>>,
        table: &mut Table,
        hash: u64,
        id: DefaultKey,
    ) -> bool {
        let slot = table.slot(hash);
        let mut prev: Link = None;
        let mut cur = table.buckets[slot];
        while let Some(c) = cur {
            let next = entries[c].next;
            if c == id {
                match prev {
                    None => table.buckets[slot] = next,
                    Some(p) => entries[p].next = next,
                }
                return true;
            }
            prev = cur;
            cur = next;
        }
        false
    }

    fn expand_if_needed(&mut self) {
        if self.rehash.is_some() {
            return;
        }
        let size = self.table.len();
        if self.entries.len() as f64 >= size as f64 * self.config.resize_ratio {
            self.start_rehash(size * 2);
        }
    }

    // Declined while a cycle is active: only one source table may exist.
    fn start_rehash(&mut self, new_size: usize) {
        if self.rehash.is_some() || new_size == self.table.len() {
            return;
        }
        let source = std::mem::replace(&mut self.table, Table::with_size(new_size));
        log::debug!(
            "dict rehash start: {} -> {} buckets, {} entries",
            source.len(),
            new_size,
            self.entries.len()
        );
        self.rehash = Some(Rehash { source, cursor: 0 });
    }

    /// Migrates one batch of source buckets; ends the cycle when drained.
    fn rehash_step(&mut self) {
        let Some(rehash) = self.rehash.as_mut() else {
            return;
        };
        let source_len = rehash.source.len();
        let batch = (source_len / self.config.rehash_batch_divisor).max(1);
        let end = (rehash.cursor + batch).min(source_len);
        for idx in rehash.cursor..end {
            let mut cur = rehash.source.buckets[idx].take();
            while let Some(id) = cur {
                let e = &mut self.entries[id];
                cur = e.next;
                let slot = self.table.slot(e.hash);
                e.next = self.table.buckets[slot];
                self.table.buckets[slot] = Some(id);
            }
        }
        rehash.cursor = end;
        if end == source_len {
            log::debug!(
                "dict rehash done: {} buckets, {} entries",
                self.table.len(),
                self.entries.len()
            );
            self.rehash = None;
        }
    }

    fn reset(&mut self) {
        if let Some(r) = &self.rehash {
            log::debug!(
                "dict clear cancels rehash at bucket {}/{}",
                r.cursor,
                r.source.len()
            );
        }
        self.entries.clear();
        self.rehash = None;
        self.table = Table::with_size(self.config.min_size);
    }

    /// Panics if any structural invariant is violated.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let size = self.table.len();
        assert!(size.is_power_of_two());
        assert!(size >= self.config.min_size);

        let mut chained = 0;
        for (which, table) in [Some(&self.table), self.rehash.as_ref().map(|r| &r.source)]
            .into_iter()
            .enumerate()
        {
            let Some(table) = table else { continue };
            for (slot, head) in table.buckets.iter().enumerate() {
                let mut cur = *head;
                while let Some(id) = cur {
                    let e = &self.entries[id];
                    assert_eq!(table.slot(e.hash), slot, "entry in wrong bucket of table {which}");
                    chained += 1;
                    cur = e.next;
                }
            }
        }
        assert_eq!(chained, self.entries.len(), "count != sum of chain lengths");

        if let Some(r) = &self.rehash {
            assert!(r.cursor < r.source.len());
            assert!(r.source.buckets[..r.cursor].iter().all(Option::is_none));
        }
    }
}

/// Hash dictionary with incremental rehashing.
///
/// `S` supplies the hash function; key equality comes from `K: Eq`.
/// Not safe for concurrent use: the type is `!Sync`, and any sharing across
/// threads needs outside synchronization.
pub struct Dict<K, V, S = DefaultHashBuilder> {
    hasher: S,
    core: Tables<K, V>,
    busy: BusyFlag,
}

impl<K, V> Dict<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Table sized for at least `capacity` buckets (rounded up to a power of two).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for Dict<K, V, DefaultHashBuilder>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Dict<K, V, S> {
    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.core.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.core.entries.is_empty()
    }

    /// Bucket count of the primary table.
    #[inline]
    pub fn table_size(&self) -> usize {
        self.core.table.len()
    }

    /// Live entries per primary-table bucket.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.table_size() as f64
    }

    pub fn config(&self) -> DictConfig {
        self.core.config
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Entries of the primary table, then of the rehash source, each in
    /// bucket order then chain order. The order changes across rehashes.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.core)
    }

    /// Mutating cursor in the same order as [`iter`](Self::iter).
    ///
    /// Rehashing is paused while it is alive; the entry last yielded can be
    /// removed with [`SafeIter::remove_current`].
    pub fn safe_iter(&mut self) -> SafeIter<'_, K, V> {
        SafeIter::new(&mut self.core)
    }

    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Drops every entry, cancels any rehash and shrinks to the minimum size.
    pub fn clear(&mut self) {
        let _g = self.busy.enter("clear");
        self.core.reset();
    }

    #[cfg(test)]
    pub(crate) fn is_rehashing(&self) -> bool {
        self.core.rehash.is_some()
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.core.check_invariants();
    }
}

impl<K, V, S> Dict<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(DictConfig::default(), hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::build(capacity, DictConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: DictConfig, hasher: S) -> Self {
        Self::build(0, config, hasher)
    }

    fn build(capacity: usize, config: DictConfig, hasher: S) -> Self {
        let size = capacity.max(config.min_size).next_power_of_two();
        Dict {
            hasher,
            core: Tables::new(size, config),
            busy: BusyFlag::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Inserts or replaces. Returns `true` if a new entry was created and
    /// `false` if an existing key had its value replaced.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let _g = self.busy.enter("insert");
        self.core.expand_if_needed();
        self.core.rehash_step();

        let hash = self.make_hash(&key);
        if let Some(id) = self.core.locate(hash, &key) {
            self.core.entries[id].value = value;
            return false;
        }
        // New keys always go to the primary table, even mid-rehash.
        self.core.push_front(key, value, hash);
        true
    }

    /// Read-only lookup. Takes no rehash step.
    pub fn find<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.busy.enter("find");
        let hash = self.make_hash(q);
        let id = self.core.locate(hash, q)?;
        Some(&self.core.entries[id].value)
    }

    /// Mutable lookup; performs one rehash step first.
    pub fn find_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.busy.enter("find_mut");
        self.core.rehash_step();
        let hash = self.make_hash(q);
        let id = self.core.locate(hash, q)?;
        Some(&mut self.core.entries[id].value)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Removes `q`, reporting whether an entry existed.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).is_some()
    }

    /// Removes `q` and hands back the owned pair; performs one rehash step
    /// first. The pair is dropped by the caller, after the table is consistent.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.busy.enter("remove");
        self.core.rehash_step();
        let hash = self.make_hash(q);
        let id = self.core.locate(hash, q)?;
        self.core.unlink(id).map(|e| (e.key, e.value))
    }
}

impl<K, V, S> Clone for Dict<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Dict {
            hasher: self.hasher.clone(),
            core: self.core.clone(),
            busy: BusyFlag::new(),
        }
    }
}

impl<K, V, S> fmt::Debug for Dict<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for Dict<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for Dict<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut d = Dict::with_hasher(S::default());
        d.extend(iter);
        d
    }
}

impl<'a, K, V, S> IntoIterator for &'a Dict<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
