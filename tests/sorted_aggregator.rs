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

//! End-to-end coverage of the sorted aggregator's testable properties and
//! concrete scenarios. Scenario sizes are scaled down from what a production
//! workload might see (millions of records) to keep the suite fast; each
//! still exercises the exact same logical property at scale.

use dagflow::{byte_comparator, int_sum_accumulator, SortOrder, SortedAggregator, StoreConfig};
use pretty_assertions::assert_eq;

/// Decimal string keys "1".."2000" inserted in reverse; expect ascending
/// lexicographic order and exactly N items.
#[test]
fn s1_reverse_inserted_string_keys_come_out_ascending() {
    const N: u32 = 2000;
    let mut agg = SortedAggregator::new(StoreConfig::default(), byte_comparator(), None);
    for i in (1..=N).rev() {
        assert!(agg.accept(i.to_string().as_bytes(), b"v"));
    }
    while !agg.sort() {}

    let keys: Vec<String> = agg
        .cursor()
        .map(|(k, _)| String::from_utf8(k.to_vec()).unwrap())
        .collect();
    assert_eq!(keys.len(), N as usize);
    for pair in keys.windows(2) {
        assert!(pair[0].as_str() <= pair[1].as_str(), "{:?} not <= {:?}", pair[0], pair[1]);
    }
}

/// `K` keys x `V` distinct values per key, no accumulator: the cursor yields
/// `K * V` pairs, and every key's `V` entries are contiguous with insertion
/// order preserved within each key.
#[test]
fn s2_duplicate_keys_stay_contiguous_and_in_insertion_order() {
    const K: u32 = 500;
    const V: u32 = 10;
    let mut agg = SortedAggregator::new(StoreConfig::default(), byte_comparator(), None);
    for key in 0..K {
        for v in 0..V {
            let k = format!("{key:05}");
            let val = v.to_be_bytes();
            assert!(agg.accept(k.as_bytes(), &val));
        }
    }
    while !agg.sort() {}

    let pairs: Vec<(String, u32)> = agg
        .cursor()
        .map(|(k, v)| (String::from_utf8(k.to_vec()).unwrap(), u32::from_be_bytes(v.try_into().unwrap())))
        .collect();
    assert_eq!(pairs.len(), (K * V) as usize);

    let mut i = 0;
    while i < pairs.len() {
        let key = pairs[i].0.clone();
        let group = &pairs[i..i + V as usize];
        assert!(group.iter().all(|(k, _)| *k == key), "group for {key} not contiguous");
        let values: Vec<u32> = group.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, (0..V).collect::<Vec<_>>(), "insertion order not preserved for key {key}");
        i += V as usize;
    }
}

/// `K` keys x `V` insertions of value 1 with `IntSumAccumulator`: the cursor
/// yields exactly `K` pairs, each valued `V`.
#[test]
fn s3_int_sum_accumulator_collapses_every_key_to_its_count() {
    const K: u32 = 500;
    const V: i32 = 10;
    let mut agg = SortedAggregator::new(StoreConfig::default(), byte_comparator(), Some(int_sum_accumulator()));
    for key in 0..K {
        for _ in 0..V {
            let k = format!("{key:05}");
            assert!(agg.accept(k.as_bytes(), &1i32.to_be_bytes()));
        }
    }
    while !agg.sort() {}

    let pairs: Vec<(String, i32)> = agg
        .cursor()
        .map(|(k, v)| (String::from_utf8(k.to_vec()).unwrap(), i32::from_be_bytes(v.try_into().unwrap())))
        .collect();
    assert_eq!(pairs.len(), K as usize);
    for (_, value) in &pairs {
        assert_eq!(*value, V);
    }
}

/// Descending sort order: adjacent emitted keys satisfy `cmp(prev, next) >=
/// 0`.
#[test]
fn descending_order_is_monotonic() {
    let config = StoreConfig::default().with_sort_order(SortOrder::Desc);
    let mut agg = SortedAggregator::new(config, byte_comparator(), None);
    for i in 0..300u32 {
        assert!(agg.accept(format!("{i:05}").as_bytes(), b"v"));
    }
    while !agg.sort() {}

    let keys: Vec<String> = agg
        .cursor()
        .map(|(k, _)| String::from_utf8(k.to_vec()).unwrap())
        .collect();
    for pair in keys.windows(2) {
        assert!(pair[0].as_str() >= pair[1].as_str());
    }
}
