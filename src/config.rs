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

//! Configuration surfaces for the binary storage pool and the executor.

/// Which arena a [`crate::memory::BlockPool`] draws blocks from when chaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainingRule {
    Heap,
    Native,
    HeapThenNative,
}

/// Sort direction for the [`crate::sort`] module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Configuration for one [`crate::storage::BinaryStorage`] / [`crate::sort::SortedAggregator`]
/// instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub heap_block_bytes: usize,
    pub native_block_bytes: usize,
    /// Total bytes a [`crate::memory::BlockPool`] may allocate across both
    /// arenas before failing with `MemoryExhausted`.
    pub pool_budget_bytes: usize,
    pub partition_count: usize,
    pub spilling_buffer_size: usize,
    pub spilling_chunk_size: usize,
    pub chaining_rule: ChainingRule,
    pub sort_order: SortOrder,
    /// Length-prefix byte order for spilled runs (see [`crate::sort::SpillRun`]).
    pub use_big_endian: bool,
    pub spilling_enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            heap_block_bytes: 128 * 1024,
            native_block_bytes: 128 * 1024,
            pool_budget_bytes: 64 * 1024 * 1024,
            partition_count: 2,
            spilling_buffer_size: 4 * 1024 * 1024,
            spilling_chunk_size: 64 * 1024,
            chaining_rule: ChainingRule::Heap,
            sort_order: SortOrder::Asc,
            use_big_endian: false,
            spilling_enabled: false,
        }
    }
}

impl StoreConfig {
    pub fn with_partition_count(mut self, partition_count: usize) -> Self {
        assert!(
            partition_count.is_power_of_two(),
            "partitionCount must be a power of two"
        );
        self.partition_count = partition_count;
        self
    }

    pub fn with_block_bytes(mut self, bytes: usize) -> Self {
        self.heap_block_bytes = bytes;
        self.native_block_bytes = bytes;
        self
    }

    pub fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    pub fn with_spilling(mut self, enabled: bool) -> Self {
        self.spilling_enabled = enabled;
        self
    }

    pub fn with_chaining_rule(mut self, rule: ChainingRule) -> Self {
        self.chaining_rule = rule;
        self
    }

    pub fn with_pool_budget_bytes(mut self, bytes: usize) -> Self {
        self.pool_budget_bytes = bytes;
        self
    }
}

/// Configuration for the cooperative [`crate::executor::Executor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of worker threads polling the runnable deque.
    pub worker_count: usize,
    /// How many times a tasklet that made no progress is re-polled before parking.
    pub spin_iterations: u32,
    /// How long an idle worker parks before checking the runnable deque again.
    pub park_timeout_micros: u64,
    /// Capacity of each per-edge SPSC queue.
    pub queue_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            spin_iterations: 64,
            park_timeout_micros: 500,
            queue_capacity: 1024,
        }
    }
}
