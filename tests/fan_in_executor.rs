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

//! End-to-end coverage of watermark-coherent fan-in: two producers feeding
//! one sink through a full [`Executor::run`] call, exercising the watermark
//! coherence protocol across a real thread-pool execution rather than just
//! at the `Inbox` unit level.

use std::sync::Arc;

use dagflow::{
    edge_queue, Error, ExecutorConfig, Inbox, Item, Outbox, OutboxBucket, ProcessorContext,
    Tasklet, Watermark,
};
use dagflow::{Executor, ForwardingPattern, Processor};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Value(i32),
    Watermark(i64),
}

/// A source whose entire output was pre-loaded into its outbox before the
/// tasklet was built; `complete` just reports done. Mirrors the pattern
/// `executor.rs`'s own `runs_a_two_vertex_pipeline_to_completion` test uses.
struct PreloadedSource;
impl Processor<i32> for PreloadedSource {
    fn try_process(&mut self, _ordinal: u32, _item: i32) -> bool {
        true
    }
}

struct CollectingSink {
    out: Arc<Mutex<Vec<Event>>>,
}
impl Processor<i32> for CollectingSink {
    fn try_process(&mut self, _ordinal: u32, item: i32) -> bool {
        self.out.lock().push(Event::Value(item));
        true
    }
    fn try_process_watermark(&mut self, _ordinal: u32, wm: Watermark) -> bool {
        self.out.lock().push(Event::Watermark(wm.seq));
        true
    }
}

fn preloaded_producer(values: &[i32], watermarks: &[i64]) -> (dagflow::EdgeQueueConsumer<i32>, Tasklet<i32>) {
    let (p, c) = edge_queue::<i32>(16);
    let mut outbox = Outbox::new(vec![OutboxBucket::new(ForwardingPattern::Unicast, vec![p])]);
    for (v, w) in values.iter().zip(watermarks.iter()) {
        assert!(outbox.add(-1, Item::Value(*v)));
        assert!(outbox.add(-1, Item::Watermark(Watermark::new(*w))));
    }
    outbox.add(-1, Item::EndOfStream);

    let tasklet = Tasklet::new(
        Box::new(PreloadedSource),
        vec![],
        outbox,
        ProcessorContext {
            global_parallelism: 2,
            local_parallelism: 2,
            instance_index: 0,
        },
    );
    (c, tasklet)
}

#[test]
fn two_producers_interleave_coherently_through_a_real_executor() {
    let (c1, source1) = preloaded_producer(&[1, 2], &[5, 10]);
    let (c2, source2) = preloaded_producer(&[1, 2], &[5, 10]);

    let out = Arc::new(Mutex::new(Vec::new()));
    let sink_inbox = Inbox::new(vec![c1, c2]);
    let sink = Tasklet::new(
        Box::new(CollectingSink { out: out.clone() }),
        vec![(0, sink_inbox)],
        Outbox::new(vec![]),
        ProcessorContext {
            global_parallelism: 1,
            local_parallelism: 1,
            instance_index: 0,
        },
    );

    let exec = Executor::new(ExecutorConfig::default(), vec![source1, source2, sink]);
    exec.run().unwrap();

    let events = out.lock().clone();
    let wm_positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter_map(|(i, e)| matches!(e, Event::Watermark(_)).then_some(i))
        .collect();
    assert_eq!(
        events.iter().filter(|e| **e == Event::Watermark(5)).count(),
        1,
        "watermark 5 must be emitted exactly once after both producers agree"
    );
    assert_eq!(events.iter().filter(|e| **e == Event::Watermark(10)).count(), 1);
    assert_eq!(wm_positions.len(), 2);

    let before_first_wm = &events[..wm_positions[0]];
    let between_wms = &events[wm_positions[0] + 1..wm_positions[1]];
    assert_eq!(before_first_wm, &[Event::Value(1), Event::Value(1)] as &[Event]);
    assert_eq!(between_wms, &[Event::Value(2), Event::Value(2)] as &[Event]);
}

#[test]
fn disagreeing_watermarks_abort_the_job() {
    let (c1, source1) = preloaded_producer(&[1], &[5]);
    let (c2, source2) = preloaded_producer(&[1], &[7]); // misorder: disagrees with producer 1

    let out = Arc::new(Mutex::new(Vec::new()));
    let sink_inbox = Inbox::new(vec![c1, c2]);
    let sink = Tasklet::new(
        Box::new(CollectingSink { out: out.clone() }),
        vec![(0, sink_inbox)],
        Outbox::new(vec![]),
        ProcessorContext {
            global_parallelism: 1,
            local_parallelism: 1,
            instance_index: 0,
        },
    );

    let exec = Executor::new(ExecutorConfig::default(), vec![source1, source2, sink]);
    let result = exec.run();
    assert!(matches!(result, Err(Error::WatermarkMisorder(_))));
}
