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

//! Off-heap-style memory blocks and the pool that allocates them.
//!
//! "Off-heap" here means "outside the allocator patterns of ordinary Rust
//! values, addressed by handle rather than by reference" — the crate still
//! forbids `unsafe`, so blocks are plain heap-allocated `Vec<u8>` buffers
//! addressed by `(block_id, offset)` rather than raw pointers.

mod block;
mod pool;

pub use block::{BlockAddress, MemoryBlock};
pub use pool::BlockPool;
