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

//! Arena of [`MemoryBlock`]s handed out on demand, honoring the configured
//! [`ChainingRule`] and total pool budget.

use crate::config::{ChainingRule, StoreConfig};
use crate::error::{Error, Result};

use super::block::{BlockAddress, MemoryBlock};

/// Allocates and addresses [`MemoryBlock`]s for one store partition.
///
/// `ChainingRule::Heap`/`Native` pick the block size a new block is allocated
/// with; both are backed by the same `Vec<u8>`-based [`MemoryBlock`] here
/// since this crate denies `unsafe` and has no true off-heap allocator.
/// `HeapThenNative` allocates heap-sized blocks until half the pool budget is
/// spent, then switches to native-sized blocks for the remainder — a stand-in
/// for the original two-arena chaining behavior (see DESIGN.md).
pub struct BlockPool {
    blocks: Vec<MemoryBlock>,
    heap_block_bytes: u32,
    native_block_bytes: u32,
    chaining_rule: ChainingRule,
    budget_bytes: u64,
    used_bytes: u64,
}

impl BlockPool {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            blocks: Vec::new(),
            heap_block_bytes: config.heap_block_bytes as u32,
            native_block_bytes: config.native_block_bytes as u32,
            chaining_rule: config.chaining_rule,
            budget_bytes: config.pool_budget_bytes as u64,
            used_bytes: 0,
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, id: u32) -> &MemoryBlock {
        &self.blocks[id as usize]
    }

    pub fn block_mut(&mut self, id: u32) -> &mut MemoryBlock {
        &mut self.blocks[id as usize]
    }

    /// Writes `data` into the current block, allocating a fresh one if it
    /// doesn't fit. Fails with [`Error::MemoryExhausted`] once the pool
    /// budget is spent or the record is larger than one block.
    pub fn write(&mut self, data: &[u8]) -> Result<BlockAddress> {
        if data.len() as u32 > self.block_size_for_next() {
            return Err(Error::MemoryExhausted(format!(
                "record of {} bytes exceeds the configured block size",
                data.len()
            )));
        }

        if let Some(id) = self.current_block_id() {
            if let Some(offset) = self.blocks[id as usize].write(data) {
                return Ok(BlockAddress {
                    block_id: id,
                    offset,
                });
            }
        }

        let id = self.allocate_block()?;
        let offset = self.blocks[id as usize]
            .write(data)
            .expect("freshly allocated block sized to fit the next record");
        Ok(BlockAddress {
            block_id: id,
            offset,
        })
    }

    pub fn read(&self, addr: BlockAddress, len: u32) -> &[u8] {
        self.blocks[addr.block_id as usize].read(addr.offset, len)
    }

    /// Overwrites an existing `data.len()`-byte region at `addr` in place.
    /// Only valid when `data.len()` equals the length that region was
    /// originally written with — a caller changing a record's length must go
    /// through `write` instead so it gets its own bump-allocated region.
    pub fn write_in_place(&mut self, addr: BlockAddress, data: &[u8]) {
        self.block_mut(addr.block_id).write_at(addr.offset, data);
    }

    fn current_block_id(&self) -> Option<u32> {
        if self.blocks.is_empty() {
            None
        } else {
            Some(self.blocks.len() as u32 - 1)
        }
    }

    fn block_size_for_next(&self) -> u32 {
        match self.chaining_rule {
            ChainingRule::Heap => self.heap_block_bytes,
            ChainingRule::Native => self.native_block_bytes,
            ChainingRule::HeapThenNative => {
                if self.used_bytes < self.budget_bytes / 2 {
                    self.heap_block_bytes
                } else {
                    self.native_block_bytes
                }
            }
        }
    }

    fn allocate_block(&mut self) -> Result<u32> {
        let size = self.block_size_for_next();
        if self.used_bytes + size as u64 > self.budget_bytes {
            return Err(Error::MemoryExhausted(format!(
                "pool budget of {} bytes exhausted",
                self.budget_bytes
            )));
        }
        self.used_bytes += size as u64;
        self.blocks.push(MemoryBlock::new(size));
        Ok(self.blocks.len() as u32 - 1)
    }

    pub fn byte_usage(&self) -> u64 {
        self.used_bytes
    }
}
