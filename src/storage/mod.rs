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

//! Binary storage: key/value pairs (plus an optional accumulator byte range)
//! backed by a [`crate::memory::BlockPool`] and addressed through an
//! open-addressed hash index.

mod hash;
mod storage;

pub use hash::stable_hash;
pub use storage::{BinaryStorage, Slot, SlotRef, StoredEntry};
