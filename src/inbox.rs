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

//! The concurrent inbox: aggregates the SPSC queues of every upstream
//! producer feeding one ordinal, and enforces the watermark coherence
//! protocol on fan-in.

use crate::error::{Error, Result};
use crate::item::{Item, Watermark};
use crate::queue::EdgeQueueConsumer;

/// Outcome of one [`Inbox::drain_to`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    MadeProgress,
    NoProgress,
    Done,
}

struct Producer<T> {
    consumer: EdgeQueueConsumer<T>,
    /// Set once this producer has reported the currently pending watermark.
    watermark_found: bool,
}

/// Aggregates `N` upstream SPSC queues into one logical consumer: SPMC
/// behavior achieved out of N SPSC queues.
pub struct Inbox<T> {
    producers: Vec<Producer<T>>,
    /// The watermark value some (but not yet all) live producers have
    /// reported. `None` when no watermark is currently in flight.
    pending: Option<Watermark>,
    last_watermark: Option<Watermark>,
}

impl<T> Inbox<T> {
    pub fn new(consumers: Vec<EdgeQueueConsumer<T>>) -> Self {
        Self {
            producers: consumers
                .into_iter()
                .map(|consumer| Producer {
                    consumer,
                    watermark_found: false,
                })
                .collect(),
            pending: None,
            last_watermark: None,
        }
    }

    pub fn last_watermark(&self) -> Option<Watermark> {
        self.last_watermark
    }

    /// Drains every eligible producer into `collector`, enforcing watermark
    /// coherence. Keeps cycling over producers within this one call so that
    /// resolving a pending watermark immediately unblocks items queued behind
    /// it: items before the prior watermark, then items up to `w`, then `w`
    /// itself, then items after `w`, all interleaved in that order.
    pub fn drain_to(&mut self, mut collector: impl FnMut(Item<T>)) -> Result<ProgressState> {
        if self.producers.is_empty() {
            return Ok(ProgressState::Done);
        }

        let mut made_progress = false;
        loop {
            let mut progressed_this_pass = false;

            for idx in 0..self.producers.len() {
                let eligible = self.pending.is_none() || !self.producers[idx].watermark_found;
                if !eligible {
                    continue;
                }

                let Some(item) = self.producers[idx].consumer.try_pop() else {
                    continue;
                };
                progressed_this_pass = true;
                made_progress = true;

                match item {
                    Item::Value(_) => collector(item),
                    Item::Watermark(w) => {
                        self.handle_watermark(idx, w, &mut collector)?;
                    }
                    Item::EndOfStream => {
                        self.producers[idx].watermark_found = true;
                        self.try_resolve_pending(&mut collector);
                        // Remove the finished producer; indices shift, so bail
                        // out of this pass and restart the index walk.
                        self.producers.remove(idx);
                        progressed_this_pass = true;
                        break;
                    }
                }
            }

            if !progressed_this_pass {
                break;
            }
        }

        if self.producers.is_empty() {
            Ok(ProgressState::Done)
        } else if made_progress {
            Ok(ProgressState::MadeProgress)
        } else {
            Ok(ProgressState::NoProgress)
        }
    }

    fn handle_watermark(
        &mut self,
        idx: usize,
        w: Watermark,
        collector: &mut impl FnMut(Item<T>),
    ) -> Result<()> {
        match self.pending {
            None => {
                self.pending = Some(w);
                self.producers[idx].watermark_found = true;
            }
            Some(pending) if pending == w => {
                self.producers[idx].watermark_found = true;
            }
            Some(pending) => {
                tracing::error!(producer = idx, ?w, ?pending, "watermark misorder on fan-in");
                return Err(Error::WatermarkMisorder(format!(
                    "producer {idx} reported watermark {w:?} while {pending:?} was still pending"
                )));
            }
        }
        self.try_resolve_pending(collector);
        Ok(())
    }

    fn try_resolve_pending(&mut self, collector: &mut impl FnMut(Item<T>)) {
        let Some(pending) = self.pending else {
            return;
        };
        if self.producers.iter().all(|p| p.watermark_found) {
            collector(Item::Watermark(pending));
            self.last_watermark = Some(pending);
            self.pending = None;
            for p in &mut self.producers {
                p.watermark_found = false;
            }
        }
    }
}
