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

//! Per-vertex-instance outbound buckets.

use crate::dag::ForwardingPattern;
use crate::item::Item;
use crate::queue::EdgeQueueProducer;

/// One outgoing edge's bucket: routes items to the downstream instances
/// according to the edge's [`ForwardingPattern`].
pub struct OutboxBucket<T> {
    forwarding: ForwardingPattern<T>,
    producers: Vec<EdgeQueueProducer<T>>,
    next_unicast: usize,
}

impl<T: Clone> OutboxBucket<T> {
    pub fn new(forwarding: ForwardingPattern<T>, producers: Vec<EdgeQueueProducer<T>>) -> Self {
        assert!(!producers.is_empty(), "an outbox bucket needs >=1 target");
        Self {
            forwarding,
            producers,
            next_unicast: 0,
        }
    }

    /// Places `item` according to the forwarding pattern. Control messages
    /// (watermarks, end-of-stream) are always broadcast to every downstream
    /// instance regardless of the data forwarding pattern, since every
    /// instance must observe the same watermark sequence.
    ///
    /// Returns `false` (and leaves the item undelivered to whichever targets
    /// rejected it) if any required target bucket is full; the caller is
    /// expected to retry on a later tasklet call.
    pub fn add(&mut self, item: Item<T>) -> bool {
        let delivered = match &item {
            Item::Watermark(_) | Item::EndOfStream => self.broadcast(item),
            Item::Value(v) => match &self.forwarding {
                ForwardingPattern::Unicast => self.unicast(item),
                ForwardingPattern::Broadcast => self.broadcast(item),
                ForwardingPattern::AllToOne => {
                    self.producers[0].try_push(item).is_ok()
                }
                ForwardingPattern::Partitioned {
                    key_fn,
                    partition_fn,
                } => {
                    let key = key_fn(v);
                    let idx = partition_fn(key, self.producers.len());
                    self.producers[idx].try_push(item).is_ok()
                }
            },
        };
        if !delivered {
            tracing::warn!(forwarding = ?self.forwarding, "backpressure: downstream edge queue full");
        }
        delivered
    }

    fn unicast(&mut self, item: Item<T>) -> bool {
        let idx = self.next_unicast;
        let delivered = self.producers[idx].try_push(item).is_ok();
        if delivered {
            self.next_unicast = (self.next_unicast + 1) % self.producers.len();
        }
        delivered
    }

    fn broadcast(&mut self, item: Item<T>) -> bool {
        let mut all_ok = true;
        for p in &self.producers {
            if p.try_push(item.clone()).is_err() {
                all_ok = false;
            }
        }
        all_ok
    }

    /// Whether the next item on this bucket would be rejected right now.
    pub fn has_reached_limit(&self) -> bool {
        match &self.forwarding {
            ForwardingPattern::Unicast => self.producers[self.next_unicast].has_reached_limit(),
            ForwardingPattern::AllToOne => self.producers[0].has_reached_limit(),
            ForwardingPattern::Broadcast | ForwardingPattern::Partitioned { .. } => {
                self.producers.iter().any(|p| p.has_reached_limit())
            }
        }
    }
}

/// Owned by exactly one tasklet: one bucket per outgoing edge.
pub struct Outbox<T> {
    buckets: Vec<OutboxBucket<T>>,
}

impl<T: Clone> Outbox<T> {
    pub fn new(buckets: Vec<OutboxBucket<T>>) -> Self {
        Self { buckets }
    }

    /// `ordinal = -1` fans the item out to every bucket.
    pub fn add(&mut self, ordinal: i32, item: Item<T>) -> bool {
        if ordinal < 0 {
            let mut all_ok = true;
            for bucket in &mut self.buckets {
                if !bucket.add(item.clone()) {
                    all_ok = false;
                }
            }
            all_ok
        } else {
            self.buckets[ordinal as usize].add(item)
        }
    }

    pub fn has_reached_limit(&self, ordinal: u32) -> bool {
        self.buckets[ordinal as usize].has_reached_limit()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::edge_queue;

    #[test]
    fn unicast_round_robins_across_targets() {
        let (p0, c0) = edge_queue::<i32>(4);
        let (p1, c1) = edge_queue::<i32>(4);
        let mut bucket = OutboxBucket::new(ForwardingPattern::Unicast, vec![p0, p1]);
        for i in 0..4 {
            assert!(bucket.add(Item::Value(i)));
        }
        assert_eq!(c0.try_pop().unwrap().into_value(), Some(0));
        assert_eq!(c1.try_pop().unwrap().into_value(), Some(1));
        assert_eq!(c0.try_pop().unwrap().into_value(), Some(2));
        assert_eq!(c1.try_pop().unwrap().into_value(), Some(3));
    }

    #[test]
    fn broadcast_reaches_every_target_including_watermarks() {
        let (p0, c0) = edge_queue::<i32>(4);
        let (p1, c1) = edge_queue::<i32>(4);
        let mut bucket = OutboxBucket::new(ForwardingPattern::Broadcast, vec![p0, p1]);
        assert!(bucket.add(Item::Value(7)));
        assert!(bucket.add(Item::Watermark(crate::item::Watermark::new(5))));
        assert_eq!(c0.try_pop().unwrap().into_value(), Some(7));
        assert_eq!(c1.try_pop().unwrap().into_value(), Some(7));
        assert!(c0.try_pop().unwrap().is_watermark());
        assert!(c1.try_pop().unwrap().is_watermark());
    }

    #[test]
    fn watermarks_broadcast_even_under_partitioning() {
        let (p0, c0) = edge_queue::<i32>(4);
        let (p1, c1) = edge_queue::<i32>(4);
        let forwarding = ForwardingPattern::Partitioned {
            key_fn: std::sync::Arc::new(|v: &i32| *v as u64),
            partition_fn: std::sync::Arc::new(|k, n| (k as usize) % n),
        };
        let mut bucket = OutboxBucket::new(forwarding, vec![p0, p1]);
        assert!(bucket.add(Item::Value(4))); // goes to partition 0
        assert!(bucket.add(Item::Watermark(crate::item::Watermark::new(1))));
        assert_eq!(c0.try_pop().unwrap().into_value(), Some(4));
        assert!(c0.try_pop().unwrap().is_watermark());
        assert!(c1.try_pop().unwrap().is_watermark());
    }
}
