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

//! A half-open `[start, beyond_end)` interval with the non-transitive
//! "touching" relation used to detect overlap or adjacency. Field order
//! matters: the derived `Ord` compares `start` first,
//! which is what lets [`super::operator::SessionWindowOperator`] treat a
//! per-key `BTreeMap<Interval, _>` as a real ordered map — intervals for one
//! key are pairwise non-touching, so `start` alone totally orders them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: i64,
    pub beyond_end: i64,
}

impl Interval {
    pub fn new(start: i64, beyond_end: i64) -> Self {
        Self { start, beyond_end }
    }

    /// `a.beyondEnd ≥ b.start ∧ b.beyondEnd ≥ a.start` — never transitive;
    /// `a` touching `b` and `b` touching `c` does not imply `a` touches `c`.
    pub fn touches(&self, other: &Interval) -> bool {
        self.beyond_end >= other.start && other.beyond_end >= self.start
    }

    /// Whether `self` fully contains `other`.
    pub fn encompasses(&self, other: &Interval) -> bool {
        self.start <= other.start && self.beyond_end >= other.beyond_end
    }

    /// The smallest interval containing both. Only meaningful for touching
    /// intervals; callers are expected to have checked `touches` first.
    pub fn union(&self, other: &Interval) -> Interval {
        Interval::new(self.start.min(other.start), self.beyond_end.max(other.beyond_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_intervals_touch() {
        assert!(Interval::new(1, 11).touches(&Interval::new(5, 15)));
    }

    #[test]
    fn adjacent_intervals_touch() {
        assert!(Interval::new(1, 10).touches(&Interval::new(10, 20)));
    }

    #[test]
    fn disjoint_intervals_do_not_touch() {
        assert!(!Interval::new(1, 10).touches(&Interval::new(11, 20)));
    }

    #[test]
    fn touching_is_not_transitive() {
        let a = Interval::new(1, 10);
        let b = Interval::new(5, 20);
        let c = Interval::new(15, 30);
        assert!(a.touches(&b));
        assert!(b.touches(&c));
        assert!(!a.touches(&c));
    }

    #[test]
    fn encompasses_requires_full_containment() {
        assert!(Interval::new(1, 20).encompasses(&Interval::new(5, 15)));
        assert!(!Interval::new(1, 10).encompasses(&Interval::new(5, 15)));
    }

    #[test]
    fn union_spans_both_intervals() {
        let merged = Interval::new(1, 11).union(&Interval::new(8, 20));
        assert_eq!(merged, Interval::new(1, 20));
    }
}
