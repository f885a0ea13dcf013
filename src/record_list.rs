//! RecordList: insertion-ordered record storage with stable handles.
//!
//! Records live in a `SlotMap` arena; vacated slots go to the arena's free
//! list and are reused with a bumped generation, so other records never move
//! and stale keys never alias a new record. Insertion order is kept by
//! `prev`/`next` links threaded through the records.

use slotmap::{DefaultKey, SecondaryMap, SlotMap};

#[derive(Debug)]
pub(crate) struct Record<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) struct RecordList<K, V> {
    nodes: SlotMap<DefaultKey, Record<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<K, V> RecordList<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends a record at the tail and returns its arena key.
    pub(crate) fn push_back(&mut self, key: K, value: V, hash: u64) -> DefaultKey {
        let prev = self.tail;
        let k = self.nodes.insert(Record {
            key,
            value,
            hash,
            prev,
            next: None,
        });
        match prev {
            Some(p) => self.nodes[p].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        k
    }

    /// Unlinks and frees one record. Returns `None` for stale keys.
    pub(crate) fn remove(&mut self, k: DefaultKey) -> Option<Record<K, V>> {
        let rec = self.nodes.remove(k)?;
        match rec.prev {
            Some(p) => self.nodes[p].next = rec.next,
            None => self.head = rec.next,
        }
        match rec.next {
            Some(n) => self.nodes[n].prev = rec.prev,
            None => self.tail = rec.prev,
        }
        Some(rec)
    }

    /// Removes the oldest record.
    pub(crate) fn pop_front(&mut self) -> Option<Record<K, V>> {
        let h = self.head?;
        self.remove(h)
    }

    pub(crate) fn get(&self, k: DefaultKey) -> Option<&Record<K, V>> {
        self.nodes.get(k)
    }

    pub(crate) fn get_mut(&mut self, k: DefaultKey) -> Option<&mut Record<K, V>> {
        self.nodes.get_mut(k)
    }

    /// Value of a record the caller just inserted or looked up.
    /// Panics on a stale key.
    pub(crate) fn value_mut(&mut self, k: DefaultKey) -> &mut V {
        &mut self.nodes[k].value
    }

    pub(crate) fn front(&self) -> Option<DefaultKey> {
        self.head
    }

    /// Successor of a live record in insertion order.
    pub(crate) fn next_of(&self, k: DefaultKey) -> Option<DefaultKey> {
        self.nodes.get(k).and_then(|r| r.next)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            cur: self.head,
            remaining: self.nodes.len(),
        }
    }

    /// Mutable traversal in insertion order.
    ///
    /// The arena only hands out disjoint `&mut` borrows in slot order, so the
    /// link order is captured first and the borrows are parked in a
    /// `SecondaryMap` until their turn comes. Costs one O(n) pass up front.
    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order: Vec<DefaultKey> = self.iter().map(|(k, _)| k).collect();
        let mut parked = SecondaryMap::with_capacity(self.nodes.capacity());
        for (k, rec) in self.nodes.iter_mut() {
            parked.insert(k, rec);
        }
        IterMut {
            order: order.into_iter(),
            parked,
        }
    }
}

impl<K: Clone, V: Clone> Clone for RecordList<K, V> {
    /// Copies records in order into a fresh arena; keys of the copy are
    /// unrelated to the keys of `self`.
    fn clone(&self) -> Self {
        let mut out = RecordList::new();
        for (_, rec) in self.iter() {
            out.push_back(rec.key.clone(), rec.value.clone(), rec.hash);
        }
        out
    }
}

pub(crate) struct Iter<'a, K, V> {
    nodes: &'a SlotMap<DefaultKey, Record<K, V>>,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (DefaultKey, &'a Record<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let rec = self.nodes.get(k)?;
        self.cur = rec.next;
        self.remaining -= 1;
        Some((k, rec))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

pub(crate) struct IterMut<'a, K, V> {
    order: std::vec::IntoIter<DefaultKey>,
    parked: SecondaryMap<DefaultKey, &'a mut Record<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (DefaultKey, &'a mut Record<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.order.next()?;
        self.parked.remove(k).map(|rec| (k, rec))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}
