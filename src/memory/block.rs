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

//! A single fixed-size, bump-allocated buffer.

/// Addresses a byte range inside a [`BlockPool`](super::BlockPool): the block
/// that owns it plus a byte offset into that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockAddress {
    pub block_id: u32,
    pub offset: u32,
}

/// A bump-pointer arena of fixed capacity. Allocation only ever grows
/// `cursor`; there is no free-list — allocate, never individually free,
/// reclaim the whole block at once.
pub struct MemoryBlock {
    buf: Vec<u8>,
    cursor: u32,
}

impl MemoryBlock {
    pub fn new(capacity_bytes: u32) -> Self {
        Self {
            buf: vec![0u8; capacity_bytes as usize],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.buf.len() as u32
    }

    pub fn used(&self) -> u32 {
        self.cursor
    }

    pub fn remaining(&self) -> u32 {
        self.capacity() - self.cursor
    }

    /// Bump-allocates `len` bytes and copies `data` into them. Returns the
    /// offset of the written region, or `None` if the block has insufficient
    /// remaining capacity (the caller must obtain a fresh block).
    pub fn write(&mut self, data: &[u8]) -> Option<u32> {
        let len = data.len() as u32;
        if len > self.remaining() {
            return None;
        }
        let offset = self.cursor;
        let start = offset as usize;
        let end = start + data.len();
        self.buf[start..end].copy_from_slice(data);
        self.cursor += len;
        Some(offset)
    }

    pub fn read(&self, offset: u32, len: u32) -> &[u8] {
        let start = offset as usize;
        let end = start + len as usize;
        &self.buf[start..end]
    }

    /// Overwrites an already-written region at `offset` in place, without
    /// moving `cursor`. Caller must only use this to rewrite a region this
    /// block previously handed back from `write`, at the same length.
    pub fn write_at(&mut self, offset: u32, data: &[u8]) {
        let start = offset as usize;
        let end = start + data.len();
        self.buf[start..end].copy_from_slice(data);
    }

    /// Resets the cursor so the block's space can be reused by a new run
    ///.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
