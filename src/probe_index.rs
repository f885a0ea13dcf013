//! ProbeIndex: open-addressed, linearly probed table of record keys.
//!
//! The index never owns records; an occupied slot holds the arena key of a
//! record in `RecordList`. Key comparison is delegated to the caller through
//! an `eq` closure, in the same way `hashbrown::HashTable` takes one.

use slotmap::DefaultKey;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Never used since the last rebuild. Terminates every probe.
    Empty,
    Occupied(DefaultKey),
    /// Previously occupied. Skipped by probes, reusable by inserts.
    Tombstone,
}

/// Outcome of an insert-probe.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    Found { pos: usize, record: DefaultKey },
    /// Key is absent; `pos` is the first reusable slot on its probe path.
    Vacant(usize),
    /// Every slot is occupied by some other key.
    Full,
}

#[derive(Debug)]
pub(crate) struct ProbeIndex {
    slots: Box<[Slot]>,
    tombstones: usize,
}

/// Positions `start, start + 1, …` wrapping at `capacity`, `capacity` steps.
#[inline]
fn probe_seq(capacity: usize, hash: u64) -> impl Iterator<Item = usize> {
    let start = (hash % capacity as u64) as usize;
    (0..capacity).map(move |i| {
        let p = start + i;
        if p >= capacity {
            p - capacity
        } else {
            p
        }
    })
}

impl ProbeIndex {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "index capacity must be non-zero");
        Self {
            slots: vec![Slot::Empty; capacity.max(1)].into_boxed_slice(),
            tombstones: 0,
        }
    }

    /// Builds a fresh index and places every `(record, hash)` pair on its
    /// probe path. Keys are known to be distinct, so no equality checks run.
    pub(crate) fn rebuilt<I>(capacity: usize, records: I) -> Self
    where
        I: IntoIterator<Item = (DefaultKey, u64)>,
    {
        let mut index = Self::with_capacity(capacity);
        for (record, hash) in records {
            let placed = index.place(record, hash);
            debug_assert!(placed, "rebuild overflowed index of capacity {capacity}");
        }
        index
    }

    fn place(&mut self, record: DefaultKey, hash: u64) -> bool {
        for pos in probe_seq(self.capacity(), hash) {
            if self.slots[pos] == Slot::Empty {
                self.slots[pos] = Slot::Occupied(record);
                return true;
            }
        }
        false
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn tombstones(&self) -> usize {
        self.tombstones
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Slot where the probe for `hash` starts.
    #[cfg(test)]
    pub(crate) fn home(&self, hash: u64) -> usize {
        (hash % self.capacity() as u64) as usize
    }

    /// Lookup probe: stops at the first matching occupied slot or at the
    /// first empty slot, skipping tombstones.
    pub(crate) fn find<F>(&self, hash: u64, mut eq: F) -> Option<(usize, DefaultKey)>
    where
        F: FnMut(DefaultKey) -> bool,
    {
        for pos in probe_seq(self.capacity(), hash) {
            match self.slots[pos] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied(record) => {
                    if eq(record) {
                        return Some((pos, record));
                    }
                }
            }
        }
        None
    }

    /// Insert probe. A tombstone is only claimed once the scan has proven
    /// the key absent, i.e. after reaching an empty slot or wrapping fully.
    pub(crate) fn find_or_vacant<F>(&self, hash: u64, mut eq: F) -> Probe
    where
        F: FnMut(DefaultKey) -> bool,
    {
        let mut reusable = None;
        for pos in probe_seq(self.capacity(), hash) {
            match self.slots[pos] {
                Slot::Empty => return Probe::Vacant(reusable.unwrap_or(pos)),
                Slot::Tombstone => {
                    reusable.get_or_insert(pos);
                }
                Slot::Occupied(record) => {
                    if eq(record) {
                        return Probe::Found { pos, record };
                    }
                }
            }
        }
        reusable.map_or(Probe::Full, Probe::Vacant)
    }

    /// Marks a slot returned by `find_or_vacant` as holding `record`.
    pub(crate) fn occupy(&mut self, pos: usize, record: DefaultKey) {
        match self.slots[pos] {
            Slot::Tombstone => self.tombstones -= 1,
            Slot::Empty => {}
            Slot::Occupied(_) => debug_assert!(false, "slot {pos} already occupied"),
        }
        self.slots[pos] = Slot::Occupied(record);
    }

    /// Turns an occupied slot into a tombstone.
    pub(crate) fn vacate(&mut self, pos: usize) {
        debug_assert!(matches!(self.slots[pos], Slot::Occupied(_)));
        self.slots[pos] = Slot::Tombstone;
        self.tombstones += 1;
    }
}
