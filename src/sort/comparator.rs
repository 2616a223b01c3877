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

//! Key comparators and the `IntSumAccumulator` helper.

use std::cmp::Ordering;
use std::sync::Arc;

/// Compares two keys' raw bytes. Shared via `Arc` since every sort/merge
/// participant needs its own handle to the same comparison function.
pub type Comparator = Arc<dyn Fn(&[u8], &[u8]) -> Ordering + Send + Sync>;

/// Lexicographic byte comparison — the default, type-agnostic comparator.
pub fn byte_comparator() -> Comparator {
    Arc::new(|a: &[u8], b: &[u8]| a.cmp(b))
}

/// An associative combiner over big-endian `i32` values: `existing + new`.
/// Collapses all values inserted for a key down to their sum.
pub fn int_sum_accumulator() -> Arc<dyn Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync> {
    Arc::new(|existing: &[u8], new: &[u8]| {
        let a = i32::from_be_bytes(existing.try_into().expect("4-byte big-endian i32"));
        let b = i32::from_be_bytes(new.try_into().expect("4-byte big-endian i32"));
        (a + b).to_be_bytes().to_vec()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_comparator_orders_lexicographically() {
        let cmp = byte_comparator();
        assert_eq!(cmp(b"a", b"b"), Ordering::Less);
        assert_eq!(cmp(b"b", b"a"), Ordering::Greater);
        assert_eq!(cmp(b"a", b"a"), Ordering::Equal);
    }

    #[test]
    fn int_sum_accumulator_adds_big_endian_values() {
        let sum = int_sum_accumulator();
        let result = sum(&3i32.to_be_bytes(), &4i32.to_be_bytes());
        assert_eq!(i32::from_be_bytes(result.try_into().unwrap()), 7);
    }
}
