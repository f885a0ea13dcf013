//! probe-hashmap: an insertion-ordered hash map built from a linear-probing
//! index layered over a stable record arena.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) average insert, lookup, erase and assignment-indexing, with
//!   iteration in insertion order and handles that survive index rebuilds.
//! - Layers:
//!   - RecordList<K, V>: the canonical data. A `SlotMap` arena threaded
//!     into a doubly linked list; O(1) append and O(1) unlink by key.
//!     Vacated slots are reused with a bumped generation.
//!   - ProbeIndex: `capacity` slots of `Empty | Occupied(record) |
//!     Tombstone`, probed linearly from `hash % capacity`.
//!   - ProbeHashMap<K, V, S>: public surface. Routes every mutation through
//!     the index and applies the per-instance `LoadPolicy` afterwards.
//!
//! Probing
//! - Lookups stop at the first match or the first `Empty` slot and skip
//!   tombstones. A scan is bounded by `capacity` steps, so an index with no
//!   `Empty` slot left still terminates.
//! - Inserts remember the first tombstone on the path but keep scanning until
//!   the key is proven absent, then claim that tombstone (or the `Empty` slot
//!   that ended the scan). Present keys are never overwritten.
//! - Erase turns the slot into a tombstone.
//!
//! Resizing
//! - After an insert: grow to `capacity * growth_factor + 1` once
//!   `len * max_load_inverse > capacity`.
//! - After an erase that leaves the map non-empty: shrink to
//!   `capacity / shrink_factor`, floored at `start_capacity`, once
//!   `len * min_load_inverse < capacity`.
//! - A rebuild walks the record list in order and re-places every record by
//!   its cached hash. Only rebuilds clear tombstones. Records never move, so
//!   handles and iteration order are unaffected.
//!
//! Hasher invariants
//! - Each record stores the `u64` hash computed at insert; rebuilds and
//!   `clone` use it and never call `K: Hash` again. Probes compare the cached
//!   hash before calling `K: Eq`.
//!
//! Notes and non-goals
//! - Single-threaded data structure; share it behind a lock if needed.
//! - Keys are immutable post-insert; there is no `key_mut`.
//! - `insert` never replaces the value of a present key; use `get_mut` or
//!   `get_or_default` for assignment.

mod error;
mod policy;
mod probe_hash_map;
mod probe_hash_map_proptest;
mod probe_index;
mod record_list;

// Public surface
pub use error::{KeyNotFound, PolicyError};
pub use policy::LoadPolicy;
pub use probe_hash_map::{
    Handle, Insert, IntoIter, Iter, IterMut, Keys, ProbeHashMap, Values, ValuesMut,
};
