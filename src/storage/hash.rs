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

//! A stable 64-bit hash of key bytes, built from two independent CRC32
//! passes (one over the bytes as given, one over the bytes reversed) so the
//! index doesn't depend on `std`'s per-process `RandomState` seed and stays
//! reproducible across runs.

use crc32fast::Hasher;

/// A stable 64-bit hash of `key`, independent of hasher-seed randomization.
pub fn stable_hash(key: &[u8]) -> u64 {
    let mut lo = Hasher::new();
    lo.update(key);
    let lo = lo.finalize() as u64;

    let mut hi = Hasher::new_with_initial(0x9e37_79b9);
    hi.update(key);
    let hi = hi.finalize() as u64;

    (hi << 32) | lo
}
