//! ProbeHashMap: insertion-ordered map over a linear-probing index.

use crate::error::{KeyNotFound, PolicyError};
use crate::policy::LoadPolicy;
use crate::probe_index::{Probe, ProbeIndex};
use crate::record_list::{self, RecordList};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use slotmap::DefaultKey;
use std::collections::hash_map::RandomState;

/// Stable reference to one record of a `ProbeHashMap`.
///
/// A handle stays valid across inserts, removals of other records and index
/// rebuilds. Once its own record is removed it never resolves again, even if
/// the storage slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, K, V, S>(&self, map: &'a ProbeHashMap<K, V, S>) -> Option<&'a K> {
        map.records.get(self.0).map(|r| &r.key)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ProbeHashMap<K, V, S>) -> Option<&'a V> {
        map.records.get(self.0).map(|r| &r.value)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut ProbeHashMap<K, V, S>) -> Option<&'a mut V> {
        map.records.get_mut(self.0).map(|r| &mut r.value)
    }
}

/// Result of [`ProbeHashMap::insert`]. Inserting a present key is a no-op
/// that reports the existing record.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Insert {
    Inserted(Handle),
    Existing(Handle),
}

impl Insert {
    pub fn handle(self) -> Handle {
        match self {
            Insert::Inserted(h) | Insert::Existing(h) => h,
        }
    }

    pub fn is_inserted(self) -> bool {
        matches!(self, Insert::Inserted(_))
    }
}

/// Hash map preserving insertion order, with an open-addressed index.
///
/// Records are kept in insertion order in a slot arena. A separate index of
/// `capacity` slots, probed linearly from `hash % capacity`, maps keys to
/// records. Deleted index slots become tombstones that later inserts reuse;
/// tombstones disappear whenever the index is rebuilt on grow or shrink (see
/// [`LoadPolicy`]).
///
/// Inserting a key that is already present leaves the stored value alone.
pub struct ProbeHashMap<K, V, S = RandomState> {
    hasher: S,
    policy: LoadPolicy,
    index: ProbeIndex,
    records: RecordList<K, V>,
}

/// Matches an index slot against a probed key. The cached hash is compared
/// before running `Eq`.
fn key_matches<'a, K, V, Q>(
    records: &'a RecordList<K, V>,
    hash: u64,
    q: &'a Q,
) -> impl Fn(DefaultKey) -> bool + 'a
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    move |r| {
        records
            .get(r)
            .map(|e| e.hash == hash && e.key.borrow() == q)
            .unwrap_or(false)
    }
}

impl<K, V> ProbeHashMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn try_with_policy(policy: LoadPolicy) -> Result<Self, PolicyError> {
        Self::try_with_policy_and_hasher(policy, Default::default())
    }
}

impl<K, V, S: Default> Default for ProbeHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ProbeHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        let policy = LoadPolicy::DEFAULT;
        Self {
            hasher,
            index: ProbeIndex::with_capacity(policy.start_capacity),
            policy,
            records: RecordList::new(),
        }
    }

    pub fn try_with_policy_and_hasher(policy: LoadPolicy, hasher: S) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            hasher,
            index: ProbeIndex::with_capacity(policy.start_capacity),
            policy,
            records: RecordList::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of slots in the index.
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drops every record and resets the index to the start capacity.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index = ProbeIndex::with_capacity(self.policy.start_capacity);
    }

    /// Removes the record a handle refers to. Stale handles yield `None`.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let hash = self.records.get(handle.0)?.hash;
        let (pos, record) = self.index.find(hash, |r| r == handle.0)?;
        self.remove_slot(pos, record)
    }

    /// Keeps only the records for which `keep` returns true, visiting them in
    /// insertion order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cur = self.records.front();
        while let Some(k) = cur {
            cur = self.records.next_of(k);
            let reject = self
                .records
                .get_mut(k)
                .map(|e| !keep(&e.key, &mut e.value))
                .unwrap_or(false);
            if reject {
                self.remove_handle(Handle(k));
            }
        }
    }

    /// Oldest record, the start of a handle traversal.
    pub fn first_handle(&self) -> Option<Handle> {
        self.records.front().map(Handle)
    }

    /// Record inserted right after `handle`'s record that is still live.
    /// Returns `None` at the end and for stale handles, so read the
    /// successor before removing the current record.
    pub fn next_handle(&self, handle: Handle) -> Option<Handle> {
        self.records.next_of(handle.0).map(Handle)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.records.iter(),
        }
    }

    /// Allocates the traversal order up front; see `RecordList::iter_mut`.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.records.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    // Shared tail of every removal path.
    fn remove_slot(&mut self, pos: usize, record: DefaultKey) -> Option<(K, V)> {
        self.index.vacate(pos);
        let entry = self.records.remove(record)?;
        self.shrink_if_underloaded();
        Some((entry.key, entry.value))
    }

    fn grow_if_overloaded(&mut self) {
        if self.policy.over_loaded(self.len(), self.capacity()) {
            self.rehash(self.policy.grown(self.capacity()), "grow");
        }
    }

    fn shrink_if_underloaded(&mut self) {
        if self.is_empty() || !self.policy.under_loaded(self.len(), self.capacity()) {
            return;
        }
        let target = self.policy.shrunk(self.capacity());
        if target < self.capacity() {
            self.rehash(target, "shrink");
        }
    }

    /// Replaces the index with a fresh one of `capacity` slots. Records are
    /// untouched, so handles and iteration order survive.
    fn rehash(&mut self, capacity: usize, reason: &'static str) {
        tracing::debug!(
            from = self.capacity(),
            to = capacity,
            len = self.len(),
            reason,
            tombstones = self.index.tombstones(),
            "rebuilding probe index"
        );
        self.index = ProbeIndex::rebuilt(capacity, self.records.iter().map(|(k, e)| (k, e.hash)));
    }

    #[cfg(test)]
    pub(crate) fn index(&self) -> &ProbeIndex {
        &self.index
    }

    /// Checks every structural invariant; panics on the first violation.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        K: Eq + fmt::Debug,
    {
        use crate::probe_index::Slot;

        let cap = self.index.capacity();
        assert!(cap >= self.policy.start_capacity, "capacity below floor");
        assert!(
            !self.policy.over_loaded(self.len(), cap),
            "load bound violated: len {} capacity {}",
            self.len(),
            cap
        );

        let slots = self.index.slots();
        let mut referenced = slotmap::SecondaryMap::new();
        let mut occupied = 0;
        let mut tombstones = 0;
        for (pos, slot) in slots.iter().enumerate() {
            match *slot {
                Slot::Occupied(r) => {
                    occupied += 1;
                    let e = self.records.get(r).expect("occupied slot must reference a live record");
                    assert!(referenced.insert(r, pos).is_none(), "record referenced twice");
                    let mut p = self.index.home(e.hash);
                    while p != pos {
                        assert_ne!(slots[p], Slot::Empty, "{:?} unreachable from its home", e.key);
                        p = (p + 1) % cap;
                    }
                }
                Slot::Tombstone => tombstones += 1,
                Slot::Empty => {}
            }
        }
        assert_eq!(occupied, self.len());
        assert_eq!(tombstones, self.index.tombstones());

        let keys: Vec<&K> = self.keys().collect();
        assert_eq!(keys.len(), self.len());
        for (i, a) in keys.iter().enumerate() {
            assert!(keys[i + 1..].iter().all(|b| b != a), "duplicate key {:?}", a);
        }
    }
}

impl<K, V, S> ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Builds a map from pairs in order; the first occurrence of a key wins.
    pub fn from_iter_with_hasher<I>(iter: I, hasher: S) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_hasher(hasher);
        map.extend(iter);
        map
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn lookup<Q>(&self, q: &Q) -> Option<(usize, DefaultKey)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.index.find(hash, key_matches(&self.records, hash, q))
    }

    /// Handle of the record for `q`, or `None` when absent.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.lookup(q).map(|(_, r)| Handle(r))
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.lookup(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, r) = self.lookup(q)?;
        self.records.get(r).map(|e| (&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, r) = self.lookup(q)?;
        self.records.get_mut(r).map(|e| &mut e.value)
    }

    /// Non-inserting accessor that reports absence as an error.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(q).ok_or(KeyNotFound)
    }

    /// Inserts `key` if absent. A present key keeps its value and `value`
    /// is dropped. May grow the index.
    pub fn insert(&mut self, key: K, value: V) -> Insert {
        self.insert_with(key, || value)
    }

    /// Like `insert`, but `make` only runs when the key is absent.
    pub fn insert_with<F>(&mut self, key: K, make: F) -> Insert
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        loop {
            let probe = self
                .index
                .find_or_vacant(hash, key_matches(&self.records, hash, &key));
            match probe {
                Probe::Found { record, .. } => return Insert::Existing(Handle(record)),
                Probe::Vacant(pos) => {
                    let record = self.records.push_back(key, make(), hash);
                    self.index.occupy(pos, record);
                    self.grow_if_overloaded();
                    return Insert::Inserted(Handle(record));
                }
                // Unreachable under a validated policy; grow and probe again.
                Probe::Full => self.rehash(self.policy.grown(self.capacity()), "full"),
            }
        }
    }

    /// Value for `key`, inserting `make()` first when absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let handle = self.insert_with(key, make).handle();
        self.records.value_mut(handle.0)
    }

    /// Assignment-style indexing: value for `key`, inserting `V::default()`
    /// first when absent.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Removes `q` and returns its value. Absent keys are a no-op. May shrink
    /// the index while the map stays non-empty.
    #[doc(alias = "erase")]
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (pos, record) = self.lookup(q)?;
        self.remove_slot(pos, record)
    }
}

impl<K, V, S> Clone for ProbeHashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    /// Deep copy in insertion order with the same hasher and policy. The
    /// copy's index is sized as if every record had been inserted afresh, and
    /// its handles are unrelated to the original's.
    fn clone(&self) -> Self {
        let records = self.records.clone();
        let mut capacity = self.policy.start_capacity;
        while self.policy.over_loaded(records.len(), capacity) {
            capacity = self.policy.grown(capacity);
        }
        let index = ProbeIndex::rebuilt(capacity, records.iter().map(|(k, e)| (k, e.hash)));
        Self {
            hasher: self.hasher.clone(),
            policy: self.policy,
            index,
            records,
        }
    }
}

impl<K, V, S> fmt::Debug for ProbeHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Order-insensitive: equal when both maps hold the same keys with equal
/// values.
impl<K, V, S> PartialEq for ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for ProbeHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// Panics when the key is absent; use `at` or `get` to handle that case.
    fn index(&self, key: &Q) -> &V {
        match self.at(key) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for ProbeHashMap<K, V, S>
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

impl<K, V, S> FromIterator<(K, V)> for ProbeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_with_hasher(iter, S::default())
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ProbeHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Iterator over `(&K, &V)` in insertion order.
pub struct Iter<'a, K, V> {
    inner: record_list::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, e)| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in insertion order.
pub struct IterMut<'a, K, V> {
    inner: record_list::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, e)| (&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// Owning iterator; yields `(K, V)` in insertion order.
pub struct IntoIter<K, V> {
    records: RecordList<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.records.pop_front().map(|e| (e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.records.len(), Some(self.records.len()))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for ProbeHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            records: self.records,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ProbeHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ProbeHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
