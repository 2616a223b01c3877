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

//! The conveyor underlying one edge: a bounded single-producer/single-consumer
//! queue. Multiple queues aggregate into one [`crate::inbox::Inbox`], giving
//! SPMC behavior out of N SPSC queues.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::item::Item;

/// One SPSC conveyor between a producer tasklet's outbox bucket and a
/// consumer tasklet's inbox. Head/tail bookkeeping lives inside
/// `crossbeam_channel`'s lock-free bounded queue; we cache-line pad our own
/// occupancy counter so producer and consumer don't false-share it.
pub struct EdgeQueueProducer<T> {
    tx: Sender<Item<T>>,
    occupancy: Arc<CachePadded<AtomicUsize>>,
    capacity: usize,
}

pub struct EdgeQueueConsumer<T> {
    rx: Receiver<Item<T>>,
    occupancy: Arc<CachePadded<AtomicUsize>>,
}

/// Create one bounded SPSC conveyor of the given capacity.
pub fn edge_queue<T>(capacity: usize) -> (EdgeQueueProducer<T>, EdgeQueueConsumer<T>) {
    assert!(capacity > 0, "edge queue capacity must be positive");
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let occupancy = Arc::new(CachePadded::new(AtomicUsize::new(0)));
    (
        EdgeQueueProducer {
            tx,
            occupancy: occupancy.clone(),
            capacity,
        },
        EdgeQueueConsumer { rx, occupancy },
    )
}

impl<T> EdgeQueueProducer<T> {
    /// Attempt to enqueue an item. Returns the item back on failure (queue
    /// full) so the caller can retry on a later tasklet call instead of
    /// blocking.
    pub fn try_push(&self, item: Item<T>) -> Result<(), Item<T>> {
        match self.tx.try_send(item) {
            Ok(()) => {
                self.occupancy.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(TrySendError::Full(item)) => Err(item),
            Err(TrySendError::Disconnected(item)) => Err(item),
        }
    }

    /// Advisory backpressure signal: the bucket has reached its high-water
    /// mark and a cooperative producer should yield.
    pub fn has_reached_limit(&self) -> bool {
        self.occupancy.load(Ordering::Acquire) >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Clone for EdgeQueueProducer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            occupancy: self.occupancy.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T> EdgeQueueConsumer<T> {
    /// Pull one item if present without blocking.
    pub fn try_pop(&self) -> Option<Item<T>> {
        match self.rx.try_recv() {
            Ok(item) => {
                self.occupancy.fetch_sub(1, Ordering::AcqRel);
                Some(item)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_capacity_and_reports_backpressure() {
        let (tx, rx) = edge_queue::<i32>(2);
        assert!(!tx.has_reached_limit());
        tx.try_push(Item::Value(1)).unwrap();
        tx.try_push(Item::Value(2)).unwrap();
        assert!(tx.has_reached_limit());
        assert!(tx.try_push(Item::Value(3)).is_err());

        assert_eq!(rx.try_pop().unwrap().into_value(), Some(1));
        assert!(!tx.has_reached_limit());
    }

    #[test]
    fn preserves_fifo_order() {
        let (tx, rx) = edge_queue::<i32>(8);
        for i in 0..5 {
            tx.try_push(Item::Value(i)).unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.try_pop().unwrap().into_value(), Some(i));
        }
        assert!(rx.try_pop().is_none());
    }
}
