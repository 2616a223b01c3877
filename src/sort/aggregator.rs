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

//! [`SortedAggregator`]: insert, partitioned sort, optional spill, k-way
//! merge cursor.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{SortOrder, StoreConfig};
use crate::error::Error;
use crate::storage::{stable_hash, BinaryStorage, SlotRef};

use super::comparator::Comparator;
use super::cursor::{PairCursor, PartitionCursor, RunCursor};
use super::spill::SpillRun;

enum Phase {
    Inserting,
    Sorting { next_partition: usize },
    Sorted,
}

struct SortedRun {
    order: Vec<SlotRef>,
}

struct Partition {
    storage: BinaryStorage,
    spill_runs: Vec<SpillRun>,
    sorted: Option<SortedRun>,
}

impl Partition {
    fn new(config: &StoreConfig) -> Self {
        Self {
            storage: BinaryStorage::new(config),
            spill_runs: Vec::new(),
            sorted: None,
        }
    }
}

/// A memory-bounded, optionally spilling external sorter with per-key
/// accumulation.
///
/// Non-associative accumulators are permitted: the k-way merge applies
/// `combine` strictly in insertion order, so correctness for a
/// non-associative combiner is the caller's contract, not something this
/// type verifies.
pub struct SortedAggregator {
    config: StoreConfig,
    comparator: Comparator,
    accumulator: Option<Arc<dyn Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync>>,
    partitions: Vec<Partition>,
    phase: Phase,
}

impl SortedAggregator {
    pub fn new(
        config: StoreConfig,
        comparator: Comparator,
        accumulator: Option<Arc<dyn Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync>>,
    ) -> Self {
        let partitions = (0..config.partition_count)
            .map(|_| Partition::new(&config))
            .collect();
        Self {
            config,
            comparator,
            accumulator,
            partitions,
            phase: Phase::Inserting,
        }
    }

    fn partition_for(&self, key: &[u8]) -> usize {
        (stable_hash(key) as usize) % self.partitions.len()
    }

    fn put(&mut self, partition: usize, key: &[u8], value: &[u8]) -> crate::error::Result<()> {
        match &self.accumulator {
            Some(f) => self.partitions[partition].storage.put(key, value, Some(&**f)),
            None => self.partitions[partition].storage.put(key, value, None),
        }
    }

    /// Inserts one key/value pair. Returns `false` iff a new record needed
    /// allocation, none was available, and spilling is disabled or didn't
    /// free enough room.
    pub fn accept(&mut self, key: &[u8], value: &[u8]) -> bool {
        if !matches!(self.phase, Phase::Inserting) {
            return false;
        }
        let partition = self.partition_for(key);
        match self.put(partition, key, value) {
            Ok(()) => true,
            Err(Error::MemoryExhausted(reason)) if self.config.spilling_enabled => {
                warn!(partition, %reason, "spilling partition to make room");
                if self.spill_partition(partition).is_err() {
                    return false;
                }
                self.put(partition, key, value).is_ok()
            }
            Err(_) => false,
        }
    }

    fn spill_partition(&mut self, idx: usize) -> crate::error::Result<()> {
        let comparator = self.comparator.clone();
        let ascending = self.config.sort_order == SortOrder::Asc;
        let chunk_size = self.config.spilling_chunk_size;

        let p = &mut self.partitions[idx];
        let mut pairs: Vec<(Vec<u8>, Vec<u8>)> = p
            .storage
            .scan()
            .map(|e| (e.key.to_vec(), e.value.to_vec()))
            .collect();
        pairs.sort_by(|(a, _), (b, _)| {
            let raw = comparator(a, b);
            if ascending {
                raw
            } else {
                raw.reverse()
            }
        });
        let borrowed: Vec<(&[u8], &[u8])> = pairs.iter().map(|(k, v)| (k.as_slice(), v.as_slice())).collect();
        let run = SpillRun::build(borrowed.into_iter(), chunk_size, self.config.use_big_endian);
        p.spill_runs.push(run);
        p.storage = BinaryStorage::new(&self.config);
        Ok(())
    }

    /// Freezes further inserts. Idempotent once sorting has started.
    pub fn prepare_to_sort(&mut self) {
        if let Phase::Inserting = self.phase {
            self.phase = Phase::Sorting { next_partition: 0 };
        }
    }

    /// Performs one bounded chunk of sort work (one partition's worth) and
    /// returns `true` once the entire dataset is sorted and ready to cursor.
    /// Callers loop until this returns `true`.
    pub fn sort(&mut self) -> bool {
        self.prepare_to_sort();
        let next_partition = match &mut self.phase {
            Phase::Sorting { next_partition } => *next_partition,
            Phase::Sorted => return true,
            Phase::Inserting => unreachable!("prepare_to_sort always leaves Inserting"),
        };

        if next_partition >= self.partitions.len() {
            self.phase = Phase::Sorted;
            return true;
        }

        self.sort_partition(next_partition);
        if let Phase::Sorting { next_partition } = &mut self.phase {
            *next_partition += 1;
        }
        false
    }

    fn sort_partition(&mut self, idx: usize) {
        let comparator = self.comparator.clone();
        let ascending = self.config.sort_order == SortOrder::Asc;
        let p = &mut self.partitions[idx];

        let mut order: Vec<SlotRef> = (0..p.storage.slot_count())
            .map(|i| p.storage.slot_address(i))
            .collect();
        order.sort_by(|a, b| {
            let ea = p.storage.entry_at(*a);
            let eb = p.storage.entry_at(*b);
            let raw = comparator(ea.key, eb.key);
            if ascending {
                raw
            } else {
                raw.reverse()
            }
        });

        debug!(partition = idx, records = order.len(), "partition sorted");
        p.sorted = Some(SortedRun { order });
    }

    /// A forward-only cursor over the fully merged, sorted dataset. Only
    /// valid once [`Self::sort`] has returned `true`.
    pub fn cursor(&self) -> PairCursor<'_> {
        let ascending = self.config.sort_order == SortOrder::Asc;
        let mut cursors: Vec<Box<dyn RunCursor<'_> + '_>> = Vec::new();
        let mut run_orders = Vec::new();

        for p in &self.partitions {
            for spill in &p.spill_runs {
                cursors.push(Box::new(spill.cursor()));
                // Spill runs were all created before the partition's final
                // sorted run, in the order they were spilled; reuse that
                // count as their relative run order.
                run_orders.push(run_orders.len() as u32);
            }
            if let Some(sorted) = &p.sorted {
                cursors.push(Box::new(PartitionCursor::new(&p.storage, &sorted.order)));
                run_orders.push(run_orders.len() as u32);
            }
        }

        PairCursor::new(cursors, run_orders, self.comparator.clone(), ascending)
    }
}
