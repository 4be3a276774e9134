use std::{
    borrow::Borrow,
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{BuildHasher, BuildHasherDefault, Hash},
    mem, slice,
};

use log::{debug, trace};

use crate::error::TableError;

/// Capacity used by [`RobinHoodTable::new`]
pub const DEFAULT_CAPACITY: usize = 16;

/// Fraction of the capacity that may hold live entries before the table doubles
pub const DEFAULT_LOAD_FACTOR: f64 = 0.5;

/// Hasher builder used when none is supplied. Deterministic across runs.
pub type DefaultState = BuildHasherDefault<DefaultHasher>;

/// A live key-value pair
#[derive(Debug, Clone)]
struct Bucket<K, V> {
    /// The key in the key-value pair
    key: K,
    /// The value associated with the key
    value: V,
    /// Hash of the key, cached so growth never calls back into `K: Hash`
    hash: u64,
    /// Probe steps between this slot and the home slot of the key
    displacement: usize,
}

/// What a removed entry leaves behind.
///
/// The key is kept so that re-inserting it can reuse the slot, the
/// displacement so that lookups can still stop early on it.
#[derive(Debug, Clone)]
struct Grave<K> {
    /// The key that used to live here
    key: K,
    /// Displacement the key had when it was removed
    displacement: usize,
}

/// A single position of the backing array
#[derive(Debug, Clone)]
enum Slot<K, V> {
    /// Never used since the array was allocated
    Empty,
    /// Holds a live entry
    Occupied(Bucket<K, V>),
    /// Logically deleted, still part of the probe chain
    Tombstone(Grave<K>),
}

/// Outcome of a single probe walk in [`RobinHoodTable::place`]
enum Placement<K, V> {
    /// A new live entry now exists
    Inserted,
    /// The key was live already, its previous value is returned
    Updated(V),
    /// Every slot was visited without finding a home for the entry
    Exhausted(Bucket<K, V>),
}

/// Snapshot of how well the table is balanced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeStats {
    /// Number of slots in the backing array
    pub capacity: usize,
    /// Number of live entries
    pub len: usize,
    /// Number of tombstones awaiting the next growth
    pub tombstones: usize,
    /// Largest displacement of any live entry
    pub max_displacement: usize,
    /// Mean displacement over live entries, `0.0` when empty
    pub mean_displacement: f64,
}

/// An open-addressing hash table balanced with Robin Hood displacement.
///
/// Collisions are resolved with linear probing. On insertion an entry that is
/// further from its home slot than the resident of a slot takes that slot,
/// and the resident together with the rest of its cluster moves one step
/// forward. This keeps displacements even and lets lookups stop as soon as
/// they meet an entry closer to home than the probe itself.
///
/// Removal leaves a tombstone. Tombstones are reclaimed by later insertions
/// and dropped for good when the table is rebuilt: on growth, or at the same
/// capacity when an insertion finds no free slot while fewer than half of
/// the threshold's entries are live.
///
/// Keys must not change their hash or equality while stored in the table.
///
/// Note: This implementation is not thread-safe.
#[derive(Clone)]
pub struct RobinHoodTable<K, V, S = DefaultState> {
    /// The backing array, its length is always a power of two
    slots: Vec<Slot<K, V>>,
    /// Current number of live entries
    len: usize,
    /// Current number of tombstones
    tombstones: usize,
    /// Fraction of capacity that triggers growth
    load_factor: f64,
    /// Live entry count at which the table grows
    threshold: usize,
    /// Builds the hasher used for every key
    hash_builder: S,
}

/// Live entry count at which a table of `capacity` slots grows.
///
/// Never zero, otherwise a table could grow forever on its first insertion.
#[allow(
    clippy::arithmetic_side_effects,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn threshold_for(capacity: usize, load_factor: f64) -> usize {
    let scaled = (capacity as f64 * load_factor).round();
    (scaled as usize).max(1)
}

/// Allocates `capacity` empty slots
fn empty_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || Slot::Empty);
    slots
}

impl<K, V> RobinHoodTable<K, V, DefaultState> {
    /// Creates an empty table with [`DEFAULT_CAPACITY`] slots and the default load factor
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with at least `capacity` slots.
    ///
    /// The capacity is rounded up to the next power of two, `0` becomes `1`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultState::default())
    }

    /// Creates an empty table with at least `capacity` slots that grows once
    /// `load_factor` of them hold live entries.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidLoadFactor`] unless `0 < load_factor <= 1`.
    pub fn with_load_factor(capacity: usize, load_factor: f64) -> Result<Self, TableError> {
        Self::with_load_factor_and_hasher(capacity, load_factor, DefaultState::default())
    }
}

impl<K, V, S> RobinHoodTable<K, V, S> {
    /// Creates an empty table with the default load factor that hashes keys with `hash_builder`
    #[must_use]
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::build(capacity, DEFAULT_LOAD_FACTOR, hash_builder)
    }

    /// Creates an empty table with a custom load factor and hasher.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidLoadFactor`] unless `0 < load_factor <= 1`.
    pub fn with_load_factor_and_hasher(
        capacity: usize,
        load_factor: f64,
        hash_builder: S,
    ) -> Result<Self, TableError> {
        // NaN fails both comparisons
        if load_factor > 0.0 && load_factor <= 1.0 {
            Ok(Self::build(capacity, load_factor, hash_builder))
        } else {
            Err(TableError::InvalidLoadFactor(load_factor))
        }
    }

    /// Allocates the backing array for an already validated load factor
    fn build(capacity: usize, load_factor: f64, hash_builder: S) -> Self {
        let capacity = capacity.max(1).next_power_of_two();

        Self {
            slots: empty_slots(capacity),
            len: 0,
            tombstones: 0,
            load_factor,
            threshold: threshold_for(capacity, load_factor),
            hash_builder,
        }
    }

    /// Returns the number of live entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table holds no live entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots in the backing array
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the configured load factor
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns the live entry count at which the table grows
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns the number of tombstones left by removals since the last growth
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Removes every entry and tombstone, keeping the capacity
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.len = 0;
        self.tombstones = 0;
    }

    /// Returns an iterator over live entries in slot order
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { slots: self.slots.iter(), remaining: self.len }
    }

    /// Measures the displacement of every live entry
    #[must_use]
    #[allow(clippy::arithmetic_side_effects, clippy::cast_precision_loss)]
    pub fn stats(&self) -> ProbeStats {
        let (max_displacement, total) = self
            .slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Occupied(bucket) => Some(bucket.displacement),
                Slot::Empty | Slot::Tombstone(_) => None,
            })
            .fold((0_usize, 0_usize), |(max, sum), d| (max.max(d), sum.saturating_add(d)));

        let mean_displacement =
            if self.len == 0 { 0.0 } else { total as f64 / self.len as f64 };

        ProbeStats {
            capacity: self.slots.len(),
            len: self.len,
            tombstones: self.tombstones,
            max_displacement,
            mean_displacement,
        }
    }

    /// Mask turning any index into a valid slot index
    fn mask(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// Home slot of a hash
    #[allow(clippy::cast_possible_truncation)]
    fn home(&self, hash: u64) -> usize {
        (hash as usize) & self.mask()
    }

    /// The slot after `index`, wrapping around the end of the array
    fn next(&self, index: usize) -> usize {
        index.wrapping_add(1) & self.mask()
    }
}

impl<K, V, S> RobinHoodTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts a key-value pair.
    ///
    /// Returns the previous value if the key was live, in which case the
    /// entry keeps its slot. May grow the table before returning.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        let mut pending = Bucket { key, value, hash, displacement: 0 };

        loop {
            match self.place(pending) {
                Placement::Updated(old_value) => return Some(old_value),
                Placement::Inserted => {
                    self.len = self.len.saturating_add(1);
                    if self.len >= self.threshold {
                        self.grow();
                    }
                    return None;
                }
                Placement::Exhausted(bucket) => {
                    trace!(
                        "probe exhausted {} slots ({} tombstones), compacting before retry",
                        self.slots.len(),
                        self.tombstones
                    );
                    // Mostly tombstones: sweep them out without growing
                    if self.len.saturating_mul(2) < self.threshold {
                        self.rebuild(self.slots.len());
                    } else {
                        self.grow();
                    }
                    pending = bucket;
                }
            }
        }
    }

    /// Walks the probe sequence of `incoming` and puts it somewhere.
    ///
    /// Does not touch `len`; the caller decides what an insertion means.
    fn place(&mut self, mut incoming: Bucket<K, V>) -> Placement<K, V> {
        let mut index = self.home(incoming.hash);
        incoming.displacement = 0;

        for _ in 0..self.slots.len() {
            let Some(slot) = self.slots.get_mut(index) else {
                break;
            };
            match slot {
                Slot::Empty => {
                    *slot = Slot::Occupied(incoming);
                    return Placement::Inserted;
                }
                Slot::Occupied(resident) if resident.key == incoming.key => {
                    return Placement::Updated(mem::replace(&mut resident.value, incoming.value));
                }
                // A tombstone closer to home than the probe is reclaimed: nothing
                // further down the chain can have passed it at a larger deviation.
                Slot::Tombstone(grave)
                    if grave.key == incoming.key || grave.displacement < incoming.displacement =>
                {
                    *slot = Slot::Occupied(incoming);
                    self.tombstones = self.tombstones.saturating_sub(1);
                    return Placement::Inserted;
                }
                Slot::Occupied(resident) if resident.displacement < incoming.displacement => {
                    let evicted = mem::replace(resident, incoming);
                    self.shift_cluster(index, evicted);
                    return Placement::Inserted;
                }
                Slot::Occupied(_) | Slot::Tombstone(_) => {}
            }
            index = self.next(index);
            incoming.displacement = incoming.displacement.saturating_add(1);
        }

        Placement::Exhausted(incoming)
    }

    /// Moves `carried`, just evicted from `index`, one step forward. Every live
    /// entry it lands on is carried on in turn until an empty slot or a
    /// tombstone absorbs the last one.
    ///
    /// Terminates because live entries never fill the whole array.
    fn shift_cluster(&mut self, mut index: usize, mut carried: Bucket<K, V>) {
        loop {
            index = self.next(index);
            carried.displacement = carried.displacement.saturating_add(1);
            let Some(slot) = self.slots.get_mut(index) else {
                return;
            };
            match slot {
                Slot::Occupied(resident) => carried = mem::replace(resident, carried),
                Slot::Tombstone(_) => {
                    *slot = Slot::Occupied(carried);
                    self.tombstones = self.tombstones.saturating_sub(1);
                    return;
                }
                Slot::Empty => {
                    *slot = Slot::Occupied(carried);
                    return;
                }
            }
        }
    }

    /// Finds the slot index of a live key
    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        let mut index = self.home(hash);

        for deviation in 0..self.slots.len() {
            match self.slots.get(index)? {
                Slot::Empty => return None,
                Slot::Occupied(bucket) => {
                    // An entry closer to home than the probe: the key would have taken its slot
                    if bucket.displacement < deviation {
                        return None;
                    }
                    if bucket.hash == hash && bucket.key.borrow() == key {
                        return Some(index);
                    }
                }
                Slot::Tombstone(grave) => {
                    if grave.displacement < deviation {
                        return None;
                    }
                }
            }
            index = self.next(index);
        }

        None
    }

    /// Retrieves the value for a given key
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key)?;
        match self.slots.get(index)? {
            Slot::Occupied(bucket) => Some(&bucket.value),
            Slot::Empty | Slot::Tombstone(_) => None,
        }
    }

    /// Retrieves a mutable reference to the value for a given key
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key)?;
        match self.slots.get_mut(index)? {
            Slot::Occupied(bucket) => Some(&mut bucket.value),
            Slot::Empty | Slot::Tombstone(_) => None,
        }
    }

    /// Removes a key, returning its value if it was live.
    ///
    /// The slot becomes a tombstone; no other entry moves.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find(key)?;
        let slot = self.slots.get_mut(index)?;

        match mem::replace(slot, Slot::Empty) {
            Slot::Occupied(bucket) => {
                *slot = Slot::Tombstone(Grave { key: bucket.key, displacement: bucket.displacement });
                self.len = self.len.saturating_sub(1);
                self.tombstones = self.tombstones.saturating_add(1);
                Some(bucket.value)
            }
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Doubles the capacity, as many times as needed to get the live count
    /// back under the threshold.
    fn grow(&mut self) {
        let mut capacity = self.slots.len().saturating_mul(2);
        while threshold_for(capacity, self.load_factor) <= self.len {
            capacity = capacity.saturating_mul(2);
        }
        self.rebuild(capacity);
    }

    /// Replaces the backing array with `capacity` empty slots and re-places
    /// every live entry in slot order from its cached hash. Tombstones are
    /// dropped.
    fn rebuild(&mut self, capacity: usize) {
        let old_capacity = self.slots.len();
        let old_slots = mem::replace(&mut self.slots, empty_slots(capacity));
        let dropped = mem::take(&mut self.tombstones);
        self.threshold = threshold_for(capacity, self.load_factor);

        for slot in old_slots {
            if let Slot::Occupied(bucket) = slot {
                // Keys are unique and the new array has no tombstones
                let placed = self.place(bucket);
                debug_assert!(matches!(placed, Placement::Inserted));
            }
        }

        debug!(
            "rebuilt table from {old_capacity} to {capacity} slots ({} live, {dropped} tombstones dropped)",
            self.len
        );
    }
}

impl<K, V, S: Default> Default for RobinHoodTable<K, V, S> {
    fn default() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for RobinHoodTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for RobinHoodTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a RobinHoodTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the live entries of a [`RobinHoodTable`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Slots not yet visited
    slots: slice::Iter<'a, Slot<K, V>>,
    /// Live entries not yet yielded
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.slots.by_ref().find_map(|slot| match slot {
            Slot::Occupied(bucket) => Some((&bucket.key, &bucket.value)),
            Slot::Empty | Slot::Tombstone(_) => None,
        })?;
        self.remaining = self.remaining.saturating_sub(1);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
