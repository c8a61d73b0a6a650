//! The runtime's dictionary storage: a bucket array of chain heads over a
//! dense entry array linked through `next`.

pub mod primes;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::hasher::{Key, KeyKind};
use crate::record::Record;

pub const NO_ENTRY: i32 = -1;

const HASH_MASK: i32 = 0x7FFF_FFFF;

#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    pub hash_code: i32,
    pub next: i32,
    pub key: Key,
    pub value: V,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table<V = Record> {
    buckets: Vec<i32>,
    entries: Vec<Entry<V>>,
    count: i32,
    free_count: i32,
    free_list: i32,
}

pub fn bucket_index(hash_code: i32, capacity: usize) -> usize {
    (hash_code & HASH_MASK) as usize % capacity
}

impl<V> Table<V> {
    /// Builds the table the runtime would hold after inserting `pairs` in order
    /// into a dictionary pre-sized for them.
    ///
    /// Sentinel keys are dropped. New entries go to the front of their bucket's
    /// chain, so each chain lists its entries newest first.
    pub fn build<I>(pairs: I, key_kind: KeyKind) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (Key, V)>,
    {
        let pairs: Vec<(Key, V)> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::EmptyDictionary,
                "cannot build a dictionary with no entries",
            ));
        }

        let mut live = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            if key.kind() != key_kind {
                return Err(CoreError::new(
                    CoreErrorCode::TypeMismatch,
                    format!(
                        "key {key} is {:?} but the dictionary stores {key_kind:?} keys",
                        key.kind()
                    ),
                ));
            }
            if key.is_sentinel() {
                warn!(key = %key, "skipping unused-slot key");
                continue;
            }
            live.push((key, value));
        }
        if live.is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::EmptyDictionary,
                "every key marks an unused slot; nothing left to build",
            ));
        }

        let capacity = primes::capacity_for(live.len());
        let mut buckets = vec![NO_ENTRY; capacity];
        let mut entries: Vec<Entry<V>> = Vec::with_capacity(live.len());

        for (key, value) in live {
            let hash_code = key.hash_code();
            let bucket = bucket_index(hash_code, capacity);
            let index = i32::try_from(entries.len()).map_err(|_| {
                CoreError::new(
                    CoreErrorCode::ShapeMismatch,
                    "too many entries for a 32-bit entry index",
                )
            })?;

            if let Some(existing) = find_in_chain(&entries, buckets[bucket], hash_code, &key) {
                return Err(CoreError::new(
                    CoreErrorCode::DuplicateKey,
                    format!("duplicate key {key} (entries {existing} and {index})"),
                ));
            }

            entries.push(Entry {
                hash_code,
                next: buckets[bucket],
                key,
                value,
            });
            buckets[bucket] = index;
        }

        let count = entries.len() as i32;
        debug!(count, capacity, "rebuilt dictionary table");

        Ok(Self {
            buckets,
            entries,
            count,
            free_count: 0,
            free_list: NO_ENTRY,
        })
    }

    /// Wraps storage read back from a serialized field without checking it.
    pub fn from_parts(
        buckets: Vec<i32>,
        entries: Vec<Entry<V>>,
        count: i32,
        free_count: i32,
        free_list: i32,
    ) -> Self {
        Self {
            buckets,
            entries,
            count,
            free_count,
            free_list,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn buckets(&self) -> &[i32] {
        &self.buckets
    }

    pub fn entries(&self) -> &[Entry<V>] {
        &self.entries
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn free_count(&self) -> i32 {
        self.free_count
    }

    pub fn free_list(&self) -> i32 {
        self.free_list
    }

    /// Entry indices reachable from `head` through `next`. Stops after visiting
    /// as many entries as the table holds, so a corrupt cycle cannot hang it.
    pub fn chain(&self, head: i32) -> Chain<'_, V> {
        Chain {
            table: self,
            cursor: head,
            remaining: self.entries.len(),
        }
    }

    pub fn lookup(&self, key: &Key) -> Option<&Entry<V>> {
        if self.buckets.is_empty() {
            return None;
        }
        let hash_code = key.hash_code();
        let head = self.buckets[bucket_index(hash_code, self.capacity())];
        find_in_chain(&self.entries, head, hash_code, key).map(|i| &self.entries[i])
    }

    /// Entries holding real data, in entry order. Slots on the free list and
    /// slots whose key is a sentinel are skipped.
    pub fn live_entries(&self) -> impl Iterator<Item = &Entry<V>> + '_ {
        let free: HashSet<usize> = self.chain(self.free_list).collect();
        self.entries
            .iter()
            .enumerate()
            .filter(move |(i, e)| !free.contains(i) && !e.key.is_sentinel())
            .map(|(_, e)| e)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.buckets.is_empty() {
            return Err(invariant("table has no buckets"));
        }

        let len = self.entries.len() as i64;
        if i64::from(self.count) != len - i64::from(self.free_count) {
            return Err(invariant(format!(
                "count {} does not match {} entries minus {} free",
                self.count, len, self.free_count
            )));
        }

        let in_range = |i: i32| i == NO_ENTRY || (i >= 0 && i64::from(i) < len);
        for (i, e) in self.entries.iter().enumerate() {
            if !in_range(e.next) {
                return Err(invariant(format!(
                    "entry {i} has next {} outside 0..{len}",
                    e.next
                )));
            }
        }

        let free: Vec<usize> = self.chain(self.free_list).collect();
        if free.len() as i64 != i64::from(self.free_count) {
            return Err(invariant(format!(
                "free list holds {} entries but freeCount is {}",
                free.len(),
                self.free_count
            )));
        }

        let mut seen = vec![false; self.entries.len()];
        for &i in &free {
            seen[i] = true;
        }

        for (bucket, &head) in self.buckets.iter().enumerate() {
            if !in_range(head) {
                return Err(invariant(format!(
                    "bucket {bucket} points at {head} outside 0..{len}"
                )));
            }
            let mut keys: HashSet<&Key> = HashSet::new();
            let mut cursor = head;
            while cursor != NO_ENTRY {
                let index = cursor as usize;
                if seen[index] {
                    return Err(invariant(format!(
                        "entry {index} is reachable twice (cycle or shared chain)"
                    )));
                }
                seen[index] = true;

                let e = &self.entries[index];
                if e.hash_code != e.key.hash_code() {
                    return Err(invariant(format!(
                        "entry {index} stores hash {} but key {} hashes to {}",
                        e.hash_code,
                        e.key,
                        e.key.hash_code()
                    )));
                }
                if bucket_index(e.hash_code, self.capacity()) != bucket {
                    return Err(invariant(format!(
                        "entry {index} (key {}) is chained from bucket {bucket}",
                        e.key
                    )));
                }
                if !keys.insert(&e.key) {
                    return Err(CoreError::new(
                        CoreErrorCode::DuplicateKey,
                        format!("key {} appears twice in bucket {bucket}", e.key),
                    ));
                }
                cursor = e.next;
            }
        }

        if let Some(orphan) = seen.iter().position(|s| !s) {
            return Err(invariant(format!(
                "entry {orphan} (key {}) is not reachable from any bucket",
                self.entries[orphan].key
            )));
        }

        Ok(())
    }
}

pub struct Chain<'a, V> {
    table: &'a Table<V>,
    cursor: i32,
    remaining: usize,
}

impl<V> Iterator for Chain<'_, V> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 || self.cursor < 0 {
            return None;
        }
        let index = self.cursor as usize;
        let entry = self.table.entries.get(index)?;
        self.remaining -= 1;
        self.cursor = entry.next;
        Some(index)
    }
}

fn find_in_chain<V>(entries: &[Entry<V>], head: i32, hash_code: i32, key: &Key) -> Option<usize> {
    let mut cursor = head;
    let mut remaining = entries.len();
    while cursor >= 0 && remaining > 0 {
        let e = entries.get(cursor as usize)?;
        if e.hash_code == hash_code && e.key == *key {
            return Some(cursor as usize);
        }
        cursor = e.next;
        remaining -= 1;
    }
    None
}

fn invariant(message: impl Into<String>) -> CoreError {
    CoreError::new(CoreErrorCode::ShapeMismatch, message)
}
