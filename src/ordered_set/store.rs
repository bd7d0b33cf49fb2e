//! Key-only hash store for `i32` keys with an enumeration cursor.
//!
//! Keys live in dense slot arrays and every bucket holds the head of a chain
//! threaded through `links`. A new key takes the next unused slot, so walking the
//! slots in order yields keys in arrival order. A removed slot goes onto a free
//! list and is handed to the next insert, which puts that key out of arrival
//! order; callers that need a stable order rebuild after removing.

const NIL: usize = usize::MAX;
const MIN_BUCKETS: usize = 8;

#[derive(Debug, Clone)]
pub struct IntKeyStore {
    /// Chain heads, one per bucket.
    buckets: Vec<usize>,
    /// Next slot in the same chain for occupied slots, next free slot otherwise.
    links: Vec<usize>,
    keys: Vec<i32>,
    occupied: Vec<bool>,
    free_head: usize,
    len: usize,
}

impl IntKeyStore {
    pub fn new() -> IntKeyStore {
        Self::with_capacity(MIN_BUCKETS)
    }

    pub fn with_capacity(capacity: usize) -> IntKeyStore {
        let num_buckets = capacity.max(MIN_BUCKETS).next_power_of_two();
        IntKeyStore {
            buckets: vec![NIL; num_buckets],
            links: Vec::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
            occupied: Vec::with_capacity(capacity),
            free_head: NIL,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, key: i32) -> bool {
        self.lookup(key).is_some()
    }

    /// Slot holding `key`.
    pub fn lookup(&self, key: i32) -> Option<usize> {
        let mut slot = self.buckets[self.bucket_of(key)];
        while slot != NIL {
            if self.keys[slot] == key {
                return Some(slot);
            }
            slot = self.links[slot];
        }
        None
    }

    /// Insert `key` if absent. Returns true if it was added.
    pub fn insert(&mut self, key: i32) -> bool {
        if self.contains(key) {
            return false;
        }
        if self.free_head == NIL && self.len >= self.buckets.len() {
            self.grow();
        }

        let slot = if self.free_head != NIL {
            let slot = self.free_head;
            self.free_head = self.links[slot];
            self.keys[slot] = key;
            self.occupied[slot] = true;
            slot
        } else {
            self.keys.push(key);
            self.occupied.push(true);
            self.links.push(NIL);
            self.keys.len() - 1
        };

        self.link(slot);
        self.len += 1;
        true
    }

    /// Remove `key` if present. Returns true if it was removed.
    pub fn remove(&mut self, key: i32) -> bool {
        let bucket = self.bucket_of(key);
        let mut prev = NIL;
        let mut slot = self.buckets[bucket];
        while slot != NIL {
            if self.keys[slot] == key {
                let next = self.links[slot];
                if prev == NIL {
                    self.buckets[bucket] = next;
                } else {
                    self.links[prev] = next;
                }
                self.occupied[slot] = false;
                self.links[slot] = self.free_head;
                self.free_head = slot;
                self.len -= 1;
                return true;
            }
            prev = slot;
            slot = self.links[slot];
        }
        false
    }

    /// Remove every key. Bucket and slot capacity is kept.
    pub fn clear(&mut self) {
        self.buckets.fill(NIL);
        self.links.clear();
        self.keys.clear();
        self.occupied.clear();
        self.free_head = NIL;
        self.len = 0;
    }

    /// Enumeration cursor: the first occupied slot after `slot`, or the first
    /// occupied slot at all when `slot` is `None`.
    pub fn next_lookup(&self, slot: Option<usize>) -> Option<usize> {
        let start = slot.map_or(0, |s| s + 1);
        (start..self.keys.len()).find(|&s| self.occupied[s])
    }

    pub fn key_at(&self, slot: usize) -> Option<i32> {
        match self.occupied.get(slot) {
            Some(true) => Some(self.keys[slot]),
            _ => None,
        }
    }

    /// True when occupied slots are exactly `0..len`.
    pub fn is_compact(&self) -> bool {
        self.keys.len() == self.len
    }

    /// Keys in slot order.
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            store: self,
            cursor: None,
            done: false,
        }
    }

    fn bucket_of(&self, key: i32) -> usize {
        // Fibonacci hashing; bucket count is a power of two.
        let hash = (key as u32).wrapping_mul(0x9E37_79B9);
        let shift = 32 - self.buckets.len().trailing_zeros();
        (hash >> shift) as usize
    }

    fn link(&mut self, slot: usize) {
        let bucket = self.bucket_of(self.keys[slot]);
        self.links[slot] = self.buckets[bucket];
        self.buckets[bucket] = slot;
    }

    fn grow(&mut self) {
        let num_buckets = self.buckets.len() * 2;
        self.buckets = vec![NIL; num_buckets];
        for slot in 0..self.keys.len() {
            if self.occupied[slot] {
                self.link(slot);
            }
        }
    }
}

impl Default for IntKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the keys of an [`IntKeyStore`], driven by [`IntKeyStore::next_lookup`].
pub struct Keys<'a> {
    store: &'a IntKeyStore,
    cursor: Option<usize>,
    done: bool,
}

impl Iterator for Keys<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.done {
            return None;
        }
        match self.store.next_lookup(self.cursor) {
            Some(slot) => {
                self.cursor = Some(slot);
                self.store.key_at(slot)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
