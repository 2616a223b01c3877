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

//! [`SessionWindowOperator`]: assigns events to per-key session windows and
//! emits them once a watermark proves they can no longer grow.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::ops::Bound;
use std::sync::Arc;

use super::interval::Interval;

/// Per-key accumulator state for one open session: constructible, extendable
/// one event at a time, and combinable with another instance when two
/// sessions bridge.
pub trait Accumulator: Send + 'static {
    type Event;

    fn new() -> Self;
    fn accumulate(&mut self, event: &Self::Event);

    /// Combines `self` (the earlier session) with `other` (the later one)
    /// into the accumulator for their merged interval. Applied strictly in
    /// insertion order; a non-associative combiner is the caller's contract,
    /// not something this operator verifies.
    fn combine(self, other: Self) -> Self;
}

/// A finished, emitted window: the key, its folded accumulator, and the
/// closed `[start, beyond_end)` interval it covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session<K, A> {
    pub key: K,
    pub result: A,
    pub start: i64,
    pub beyond_end: i64,
}

/// Online event-time session windowing: groups events per key into intervals
/// no two of which touch, merging on bridge and emitting only once a
/// watermark proves an interval is closed.
pub struct SessionWindowOperator<K, A>
where
    K: Eq + Hash + Clone,
    A: Accumulator,
{
    gap: i64,
    ts_fn: Arc<dyn Fn(&A::Event) -> i64 + Send + Sync>,
    key_fn: Arc<dyn Fn(&A::Event) -> K + Send + Sync>,
    key_to_interval_map: HashMap<K, BTreeMap<Interval, A>>,
    deadline_index: BTreeMap<i64, HashSet<K>>,
    last_watermark: i64,
}

impl<K, A> SessionWindowOperator<K, A>
where
    K: Eq + Hash + Clone,
    A: Accumulator,
{
    pub fn new(
        gap: i64,
        ts_fn: Arc<dyn Fn(&A::Event) -> i64 + Send + Sync>,
        key_fn: Arc<dyn Fn(&A::Event) -> K + Send + Sync>,
    ) -> Self {
        Self {
            gap,
            ts_fn,
            key_fn,
            key_to_interval_map: HashMap::new(),
            deadline_index: BTreeMap::new(),
            last_watermark: i64::MIN,
        }
    }

    /// Folds one event into its key's session state.
    /// Late events (`ts <= lastWatermark`) are silently dropped.
    pub fn on_item(&mut self, event: &A::Event) {
        let ts = (self.ts_fn)(event);
        if ts <= self.last_watermark {
            tracing::warn!(ts, last_watermark = self.last_watermark, "dropping late event");
            return;
        }
        let key = (self.key_fn)(event);
        let probe = Interval::new(ts, ts + self.gap);

        let touching = match self.key_to_interval_map.get(&key) {
            Some(map) => Self::touching_intervals(map, probe),
            None => Vec::new(),
        };

        match touching[..] {
            [] => {
                let mut acc = A::new();
                acc.accumulate(event);
                self.open_interval(&key, probe, acc);
            }
            [l] if l.encompasses(&probe) => {
                self.key_to_interval_map
                    .get_mut(&key)
                    .and_then(|m| m.get_mut(&l))
                    .expect("touching interval must exist")
                    .accumulate(event);
            }
            [l] => {
                let mut acc = self
                    .key_to_interval_map
                    .get_mut(&key)
                    .and_then(|m| m.remove(&l))
                    .expect("touching interval must exist");
                self.forget_deadline(&key, l.beyond_end);
                acc.accumulate(event);
                self.open_interval(&key, l.union(&probe), acc);
            }
            [l, u] => {
                let map = self
                    .key_to_interval_map
                    .get_mut(&key)
                    .expect("touching intervals must exist");
                let acc_l = map.remove(&l).expect("lower interval must exist");
                let acc_u = map.remove(&u).expect("upper interval must exist");
                self.forget_deadline(&key, l.beyond_end);
                self.forget_deadline(&key, u.beyond_end);

                tracing::debug!(
                    lower_start = l.start,
                    upper_beyond_end = u.beyond_end,
                    "merging two touching sessions"
                );
                let mut combined = acc_l.combine(acc_u);
                combined.accumulate(event);
                self.open_interval(&key, Interval::new(l.start, u.beyond_end), combined);
            }
            _ => unreachable!("an interval of length >= gap admits at most two touching neighbors"),
        }
    }

    /// Advances the watermark, emitting every session that can no longer
    /// grow.
    pub fn on_watermark(&mut self, w: i64) -> Vec<Session<K, A>> {
        tracing::debug!(watermark = w, "advancing watermark");
        self.last_watermark = w;
        let mut emitted = Vec::new();

        let matured_deadlines: Vec<i64> = self.deadline_index.range(..=w).map(|(&d, _)| d).collect();
        for deadline in matured_deadlines {
            let Some(keys) = self.deadline_index.remove(&deadline) else {
                continue;
            };
            for key in keys {
                let Some(map) = self.key_to_interval_map.get_mut(&key) else {
                    continue;
                };
                let matured: Vec<Interval> = map.keys().copied().filter(|iv| iv.beyond_end <= w).collect();
                for iv in matured {
                    let acc = map.remove(&iv).expect("matured interval must exist");
                    emitted.push(Session {
                        key: key.clone(),
                        result: acc,
                        start: iv.start,
                        beyond_end: iv.beyond_end,
                    });
                }
                if map.is_empty() {
                    self.key_to_interval_map.remove(&key);
                }
            }
        }
        emitted
    }

    /// Finds the intervals in `map` touching `probe`. Since intervals for one
    /// key are pairwise non-touching, only the predecessor (greatest start ≤
    /// `probe.start`) and successor (least start > `probe.start`) can touch
    /// it — any interval further away is separated from its neighbor by a
    /// non-touching gap, so it is separated from `probe` too — at most two
    /// existing intervals can ever touch one incoming event.
    fn touching_intervals(map: &BTreeMap<Interval, A>, probe: Interval) -> Vec<Interval> {
        let sentinel = Interval::new(probe.start, i64::MAX);
        let mut found = Vec::with_capacity(2);

        if let Some((&iv, _)) = map.range(..=sentinel).next_back() {
            found.push(iv);
        }
        if let Some((&iv, _)) = map.range((Bound::Excluded(sentinel), Bound::Unbounded)).next() {
            if found.first() != Some(&iv) {
                found.push(iv);
            }
        }
        found.retain(|iv| iv.touches(&probe));
        found
    }

    fn open_interval(&mut self, key: &K, interval: Interval, acc: A) {
        self.key_to_interval_map.entry(key.clone()).or_default().insert(interval, acc);
        self.deadline_index.entry(interval.beyond_end).or_default().insert(key.clone());
    }

    fn forget_deadline(&mut self, key: &K, beyond_end: i64) {
        if let Some(keys) = self.deadline_index.get_mut(&beyond_end) {
            keys.remove(key);
            if keys.is_empty() {
                self.deadline_index.remove(&beyond_end);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct SumAcc(i64);

    impl Accumulator for SumAcc {
        type Event = (i64, i64);

        fn new() -> Self {
            SumAcc(0)
        }

        fn accumulate(&mut self, event: &Self::Event) {
            self.0 += event.1;
        }

        fn combine(self, other: Self) -> Self {
            SumAcc(self.0 + other.0)
        }
    }

    fn operator(gap: i64) -> SessionWindowOperator<&'static str, SumAcc> {
        SessionWindowOperator::new(gap, Arc::new(|e: &(i64, i64)| e.0), Arc::new(|_: &(i64, i64)| "A"))
    }

    #[test]
    fn two_bursts_emit_independently_once_each_matures() {
        let mut op = operator(10);
        for ts in [1, 5, 20, 25] {
            op.on_item(&(ts, 1));
        }

        let at_30 = op.on_watermark(30);
        assert_eq!(at_30.len(), 1);
        assert_eq!((at_30[0].start, at_30[0].beyond_end, at_30[0].result.0), (1, 15, 2));

        let at_35 = op.on_watermark(35);
        assert_eq!(at_35.len(), 1);
        assert_eq!((at_35[0].start, at_35[0].beyond_end, at_35[0].result.0), (20, 35, 2));
    }

    /// An event whose probe interval touches two already-open sessions
    /// bridges them into one.
    #[test]
    fn bridging_event_merges_two_touching_sessions() {
        let mut op = operator(10);
        op.on_item(&(1, 1));
        op.on_item(&(20, 1));
        op.on_item(&(10, 1)); // touches both [1,11) and [20,30)

        let emitted = op.on_watermark(30);
        assert_eq!(emitted.len(), 1);
        assert_eq!((emitted[0].start, emitted[0].beyond_end), (1, 30));
        assert_eq!(emitted[0].result.0, 3);
    }

    #[test]
    fn one_match_within_the_existing_interval_just_accumulates() {
        let mut op = operator(10);
        op.on_item(&(1, 1));
        op.on_item(&(3, 2)); // inside [1,11), no change to interval bounds

        let emitted = op.on_watermark(11);
        assert_eq!(emitted.len(), 1);
        assert_eq!((emitted[0].start, emitted[0].beyond_end), (1, 11));
        assert_eq!(emitted[0].result.0, 3);
    }

    #[test]
    fn late_events_are_dropped() {
        let mut op = operator(10);
        op.on_item(&(1, 1));
        let first = op.on_watermark(20);
        assert_eq!(first.len(), 1);

        op.on_item(&(5, 100)); // ts <= lastWatermark(20)
        let second = op.on_watermark(100);
        assert!(second.is_empty());
    }

    #[test]
    fn nothing_emitted_before_its_deadline() {
        let mut op = operator(10);
        op.on_item(&(1, 1));
        assert!(op.on_watermark(5).is_empty());
        assert_eq!(op.on_watermark(11).len(), 1);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct KeyedSumAcc(i64);

    impl Accumulator for KeyedSumAcc {
        type Event = (i64, i64, i64); // (key, ts, value)

        fn new() -> Self {
            KeyedSumAcc(0)
        }

        fn accumulate(&mut self, event: &Self::Event) {
            self.0 += event.2;
        }

        fn combine(self, other: Self) -> Self {
            KeyedSumAcc(self.0 + other.0)
        }
    }

    #[test]
    fn independent_keys_never_interact() {
        let mut op: SessionWindowOperator<i64, KeyedSumAcc> =
            SessionWindowOperator::new(10, Arc::new(|e: &(i64, i64, i64)| e.1), Arc::new(|e: &(i64, i64, i64)| e.0));
        op.on_item(&(1, 1, 1));
        op.on_item(&(2, 1, 1));
        let emitted = op.on_watermark(11);
        assert_eq!(emitted.len(), 2);
        let mut keys: Vec<i64> = emitted.iter().map(|s| s.key).collect();
        keys.sort();
        assert_eq!(keys, vec![1, 2]);
    }
}
