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

//! The Processor SPI and the cooperative scheduling unit that drives one
//! processor instance.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::Result;
use crate::inbox::Inbox;
use crate::item::{Item, Watermark};
use crate::outbox::Outbox;

/// Instance-placement metadata handed to [`Processor::init`].
#[derive(Debug, Clone, Copy)]
pub struct ProcessorContext {
    pub global_parallelism: u32,
    pub local_parallelism: u32,
    pub instance_index: u32,
}

/// User-supplied computation consuming items/watermarks from inbound edges
/// and producing to outbound edges. A `false` return from any `try_*` method
/// means "re-present the same item later"; `complete()` returning `false`
/// means "more work remains".
pub trait Processor<T>: Send {
    fn init(&mut self, _outbox: &mut Outbox<T>, _ctx: ProcessorContext) {}

    fn try_process(&mut self, ordinal: u32, item: T) -> bool;

    fn try_process_watermark(&mut self, _ordinal: u32, _wm: Watermark) -> bool {
        true
    }

    /// Called once all inbound edges are drained and done. Sources (with no
    /// inbound edges) see this called on every tasklet call and use it as
    /// their production loop.
    fn complete(&mut self) -> bool {
        true
    }

    /// Whether this processor never blocks inside a `try_*`/`complete` call.
    /// Non-cooperative processors run on a dedicated thread.
    fn is_cooperative(&self) -> bool {
        true
    }

    fn close(&mut self) {}
}

pub type ProcessorFactory<T> = Arc<dyn Fn() -> Box<dyn Processor<T>> + Send + Sync>;

/// Outcome of one [`Tasklet::call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskletProgress {
    MadeProgress,
    NoProgress,
    Done,
}

struct InboundEdge<T> {
    ordinal: u32,
    inbox: Inbox<T>,
    done: bool,
}

/// Wraps one [`Processor`] instance with its inboxes/outbox and drives its
/// lifecycle
/// 1. Drain inboxes in priority order, respecting watermark coherence.
/// 2. Feed each drained item to `try_process`/`try_process_watermark`.
/// 3. Outbox buckets write straight through to their downstream queues, so
///    there is no separate buffered flush step (see DESIGN.md).
/// 4. Once every inbox is done, call `complete()`.
pub struct Tasklet<T> {
    processor: Box<dyn Processor<T>>,
    inboxes: Vec<InboundEdge<T>>,
    outbox: Outbox<T>,
    /// Drained items awaiting `try_process`, in priority order.
    pending: VecDeque<(u32, Item<T>)>,
    /// An item that was re-presented because `try_process` returned `false`.
    stashed: Option<(u32, Item<T>)>,
    completed: bool,
    closed: bool,
    ctx: ProcessorContext,
}

impl<T: Clone> Tasklet<T> {
    /// `inboxes` must already be sorted ascending by edge priority — lower
    /// priority ordinals are drained first on fan-in.
    pub fn new(
        mut processor: Box<dyn Processor<T>>,
        inboxes: Vec<(u32, Inbox<T>)>,
        mut outbox: Outbox<T>,
        ctx: ProcessorContext,
    ) -> Self {
        processor.init(&mut outbox, ctx);
        Self {
            processor,
            inboxes: inboxes
                .into_iter()
                .map(|(ordinal, inbox)| InboundEdge {
                    ordinal,
                    inbox,
                    done: false,
                })
                .collect(),
            outbox,
            pending: VecDeque::new(),
            stashed: None,
            completed: false,
            closed: false,
            ctx,
        }
    }

    pub fn is_cooperative(&self) -> bool {
        self.processor.is_cooperative()
    }

    pub fn is_done(&self) -> bool {
        self.completed
    }

    /// Run one scheduling quantum. Never blocks for a cooperative processor.
    pub fn call(&mut self) -> Result<TaskletProgress> {
        let _span = tracing::debug_span!(
            "tasklet_call",
            instance = self.ctx.instance_index,
            parallelism = self.ctx.local_parallelism
        )
        .entered();

        if self.completed {
            return Ok(TaskletProgress::Done);
        }

        let mut made_progress = false;

        if let Some((ordinal, item)) = self.stashed.take() {
            if self.dispatch(ordinal, item.clone()) {
                made_progress = true;
            } else {
                self.stashed = Some((ordinal, item));
                return Ok(TaskletProgress::NoProgress);
            }
        }

        for edge in &mut self.inboxes {
            if edge.done {
                continue;
            }
            let ordinal = edge.ordinal;
            let mut drained = VecDeque::new();
            let state = edge.inbox.drain_to(|item| drained.push_back((ordinal, item)))?;
            if !drained.is_empty() {
                made_progress = true;
            }
            self.pending.extend(drained);
            if state == crate::inbox::ProgressState::Done {
                edge.done = true;
            }
        }

        while let Some((ordinal, item)) = self.pending.pop_front() {
            if self.dispatch(ordinal, item.clone()) {
                made_progress = true;
            } else {
                self.stashed = Some((ordinal, item));
                break;
            }
        }

        if self.stashed.is_none()
            && self.pending.is_empty()
            && self.inboxes.iter().all(|e| e.done)
        {
            if self.processor.complete() {
                self.outbox.add(-1, Item::EndOfStream);
                self.completed = true;
                self.shutdown();
                return Ok(TaskletProgress::Done);
            }
            made_progress = true;
        }

        Ok(if made_progress {
            TaskletProgress::MadeProgress
        } else {
            TaskletProgress::NoProgress
        })
    }

    /// Calls `Processor::close` exactly once, whether the tasklet reached
    /// completion normally or was torn down by a job cancellation.
    pub fn shutdown(&mut self) {
        if !self.closed {
            self.processor.close();
            self.closed = true;
        }
    }

    fn dispatch(&mut self, ordinal: u32, item: Item<T>) -> bool {
        match item {
            Item::Value(v) => self.processor.try_process(ordinal, v),
            Item::Watermark(w) => self.processor.try_process_watermark(ordinal, w),
            Item::EndOfStream => true,
        }
    }
}
