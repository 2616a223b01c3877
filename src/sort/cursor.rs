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

//! Forward-only k-way merge cursor over sorted partitions and spill runs
//!.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::storage::{BinaryStorage, SlotRef};

use super::comparator::Comparator;
use super::spill::SpillCursor;

/// A single sorted run, whether still resident in a partition's
/// [`BinaryStorage`] or spilled to a [`super::spill::SpillRun`]. The merge
/// treats in-memory partitions and spilled runs uniformly through this one
/// interface.
pub trait RunCursor<'a> {
    fn peek(&self) -> Option<(&'a [u8], &'a [u8])>;
    fn advance(&mut self);
}

/// Walks a partition's sorted array of [`SlotRef`]s.
pub struct PartitionCursor<'a> {
    storage: &'a BinaryStorage,
    order: &'a [SlotRef],
    pos: usize,
}

impl<'a> PartitionCursor<'a> {
    pub fn new(storage: &'a BinaryStorage, order: &'a [SlotRef]) -> Self {
        Self {
            storage,
            order,
            pos: 0,
        }
    }
}

impl<'a> RunCursor<'a> for PartitionCursor<'a> {
    fn peek(&self) -> Option<(&'a [u8], &'a [u8])> {
        let slot_ref = *self.order.get(self.pos)?;
        let entry = self.storage.entry_at(slot_ref);
        Some((entry.key, entry.value))
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

impl<'a> RunCursor<'a> for SpillCursor<'a> {
    fn peek(&self) -> Option<(&'a [u8], &'a [u8])> {
        SpillCursor::peek(self)
    }

    fn advance(&mut self) {
        SpillCursor::advance(self)
    }
}

/// One entry in the merge heap: the current front of one run, tagged with
/// the run's chronological order for a stable tie-break.
struct HeapItem {
    key: Vec<u8>,
    run_order: u32,
    cursor_idx: usize,
    comparator: Comparator,
    ascending: bool,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        let raw = (self.comparator)(&self.key, &other.key);
        let raw = if self.ascending { raw } else { raw.reverse() };
        // `BinaryHeap` is a max-heap; invert so the smallest key (per the
        // configured order) is popped first, and ties favor the
        // earlier-created run.
        raw.reverse().then_with(|| other.run_order.cmp(&self.run_order))
    }
}

/// A forward-only, non-restartable cursor over the fully merged, sorted
/// output of a [`super::SortedAggregator`]: restartable only by rebuilding.
pub struct PairCursor<'a> {
    cursors: Vec<Box<dyn RunCursor<'a> + 'a>>,
    heap: BinaryHeap<HeapItem>,
    comparator: Comparator,
    ascending: bool,
}

impl<'a> PairCursor<'a> {
    pub fn new(
        mut cursors: Vec<Box<dyn RunCursor<'a> + 'a>>,
        run_orders: Vec<u32>,
        comparator: Comparator,
        ascending: bool,
    ) -> Self {
        let mut heap = BinaryHeap::with_capacity(cursors.len());
        for (idx, cursor) in cursors.iter_mut().enumerate() {
            if let Some((key, _)) = cursor.peek() {
                heap.push(HeapItem {
                    key: key.to_vec(),
                    run_order: run_orders[idx],
                    cursor_idx: idx,
                    comparator: comparator.clone(),
                    ascending,
                });
            }
        }
        Self {
            cursors,
            heap,
            comparator,
            ascending,
        }
    }

    /// Advances the merge by one record, returning the next `(key, value)`
    /// pair in merged order, or `None` once every run is exhausted.
    pub fn next(&mut self) -> Option<(&'a [u8], &'a [u8])> {
        let top = self.heap.pop()?;
        let cursor = &mut self.cursors[top.cursor_idx];
        let (key, value) = cursor.peek().expect("heap entry must match a live record");
        cursor.advance();

        if let Some((next_key, _)) = cursor.peek() {
            self.heap.push(HeapItem {
                key: next_key.to_vec(),
                run_order: top.run_order,
                cursor_idx: top.cursor_idx,
                comparator: self.comparator.clone(),
                ascending: self.ascending,
            });
        }

        Some((key, value))
    }
}

impl<'a> Iterator for PairCursor<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        PairCursor::next(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::sort::byte_comparator;

    #[test]
    fn merges_two_partitions_in_order() {
        let mut a = BinaryStorage::new(&StoreConfig::default());
        let mut b = BinaryStorage::new(&StoreConfig::default());
        a.put(b"a", b"1", None).unwrap();
        a.put(b"c", b"3", None).unwrap();
        b.put(b"b", b"2", None).unwrap();
        b.put(b"d", b"4", None).unwrap();

        let order_a: Vec<SlotRef> = (0..a.slot_count()).map(|i| a.slot_address(i)).collect();
        let order_b: Vec<SlotRef> = (0..b.slot_count()).map(|i| b.slot_address(i)).collect();

        let cursors: Vec<Box<dyn RunCursor<'_> + '_>> = vec![
            Box::new(PartitionCursor::new(&a, &order_a)),
            Box::new(PartitionCursor::new(&b, &order_b)),
        ];
        let mut merged = PairCursor::new(cursors, vec![0, 0], byte_comparator(), true);

        let mut out = Vec::new();
        while let Some((k, _)) = merged.next() {
            out.push(k.to_vec());
        }
        assert_eq!(out, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
    }
}
