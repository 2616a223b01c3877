// Copyright 2026 DagFlow Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Key/value storage over a [`crate::memory::BlockPool`], indexed by an
//! open-addressed hash table with separate chaining.

use crate::config::StoreConfig;
use crate::error::Result;
use crate::memory::{BlockAddress, BlockPool};

use super::hash::stable_hash;

const LOAD_FACTOR_LIMIT: f64 = 0.75;

/// One stored key/value record, chained to the next record hashing to the
/// same bucket.
#[derive(Clone, Copy)]
pub struct Slot {
    hash: u64,
    key_addr: BlockAddress,
    key_len: u32,
    value_addr: BlockAddress,
    value_len: u32,
    next: Option<u32>,
}

/// A hash-indexed key/value store backed by one [`BlockPool`].
pub struct BinaryStorage {
    pool: BlockPool,
    slots: Vec<Slot>,
    buckets: Vec<Option<u32>>,
}

impl BinaryStorage {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            pool: BlockPool::new(config),
            slots: Vec::new(),
            buckets: vec![None; 16],
        }
    }

    pub fn record_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn byte_usage(&self) -> u64 {
        self.pool.byte_usage()
    }

    /// Inserts `key`/`value`. With `combine` absent, always appends a new
    /// record — duplicate keys are allowed to coexist, preserving insertion
    /// order for the no-accumulator path. With
    /// `combine` present, an existing record for `key` has its value replaced
    /// by `combine(existing_value, value)`; absent an existing record, a
    /// fresh one is appended as usual.
    pub fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
        combine: Option<&dyn Fn(&[u8], &[u8]) -> Vec<u8>>,
    ) -> Result<()> {
        let hash = stable_hash(key);

        if let Some(combine) = combine {
            if let Some(slot_id) = self.find_slot(hash, key) {
                let slot = self.slots[slot_id as usize];
                let existing = self.pool.read(slot.value_addr, slot.value_len).to_vec();
                let combined = combine(&existing, value);
                if combined.len() as u32 == slot.value_len {
                    self.pool.write_in_place(slot.value_addr, &combined);
                } else {
                    let value_addr = self.pool.write(&combined)?;
                    let slot = &mut self.slots[slot_id as usize];
                    slot.value_addr = value_addr;
                    slot.value_len = combined.len() as u32;
                }
                return Ok(());
            }
        }

        let key_addr = self.pool.write(key)?;
        let value_addr = self.pool.write(value)?;
        let bucket = (hash as usize) % self.buckets.len();
        let new_id = self.slots.len() as u32;
        self.slots.push(Slot {
            hash,
            key_addr,
            key_len: key.len() as u32,
            value_addr,
            value_len: value.len() as u32,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = Some(new_id);

        if self.load_factor() > LOAD_FACTOR_LIMIT {
            self.grow();
        }
        Ok(())
    }

    /// Returns the first record for `key`, per the hash chain's current head.
    pub fn lookup(&self, key: &[u8]) -> Option<StoredEntry<'_>> {
        let hash = stable_hash(key);
        let slot_id = self.find_slot(hash, key)?;
        Some(self.entry(slot_id))
    }

    pub fn scan(&self) -> impl Iterator<Item = StoredEntry<'_>> {
        (0..self.slots.len() as u32).map(move |id| self.entry(id))
    }

    /// Address of the `nth` slot in insertion order, used by the sorter to
    /// build its array of addresses without copying record payloads.
    pub fn slot_address(&self, nth: usize) -> SlotRef {
        SlotRef(nth as u32)
    }

    pub fn entry_at(&self, slot_ref: SlotRef) -> StoredEntry<'_> {
        self.entry(slot_ref.0)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn entry(&self, slot_id: u32) -> StoredEntry<'_> {
        let slot = &self.slots[slot_id as usize];
        StoredEntry {
            key: self.pool.read(slot.key_addr, slot.key_len),
            value: self.pool.read(slot.value_addr, slot.value_len),
        }
    }

    fn find_slot(&self, hash: u64, key: &[u8]) -> Option<u32> {
        let bucket = (hash as usize) % self.buckets.len();
        let mut cursor = self.buckets[bucket];
        while let Some(id) = cursor {
            let slot = &self.slots[id as usize];
            if slot.hash == hash && self.pool.read(slot.key_addr, slot.key_len) == key {
                return Some(id);
            }
            cursor = slot.next;
        }
        None
    }

    fn load_factor(&self) -> f64 {
        self.slots.len() as f64 / self.buckets.len() as f64
    }

    fn grow(&mut self) {
        let new_len = self.buckets.len() * 2;
        let mut heads: Vec<Option<u32>> = vec![None; new_len];
        for (id, slot) in self.slots.iter_mut().enumerate() {
            let bucket = (slot.hash as usize) % new_len;
            slot.next = heads[bucket];
            heads[bucket] = Some(id as u32);
        }
        self.buckets = heads;
    }
}

/// An address into [`BinaryStorage`]'s slot array, stable across resizes
/// (resizing only touches hash-chain pointers, never slot identity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef(u32);

/// A borrowed view into one stored record.
pub struct StoredEntry<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}
