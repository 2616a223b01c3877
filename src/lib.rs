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

//! A small, cooperative dataflow engine: a DAG of tasklets connected by
//! bounded edge queues, scheduled to quiescence by a work-stealing executor,
//! plus two bundled operators — a session-window aggregator and a
//! memory-bounded external sorter — that processors can embed directly.
//!
//! See the `dag`, `executor`, and `tasklet` modules for the scheduling core;
//! `session` and `sort` for the two bundled operators; `memory` and
//! `storage` for the off-heap-style record store the sorter is built on.

pub mod config;
pub mod dag;
pub mod error;
pub mod executor;
pub mod inbox;
pub mod item;
pub mod memory;
pub mod outbox;
pub mod queue;
pub mod session;
pub mod sort;
pub mod storage;
pub mod tasklet;

pub use config::{ChainingRule, ExecutorConfig, SortOrder, StoreConfig};
pub use dag::{Dag, DagBuilder, Edge, ForwardingPattern, Payload, Vertex};
pub use error::{DagValidationError, Error, Result};
pub use executor::{CancelHandle, Executor};
pub use inbox::{Inbox, ProgressState};
pub use item::{Item, Watermark};
pub use outbox::{Outbox, OutboxBucket};
pub use queue::{edge_queue, EdgeQueueConsumer, EdgeQueueProducer};
pub use session::{Accumulator, Interval, Session, SessionWindowOperator};
pub use sort::{byte_comparator, int_sum_accumulator, Comparator, SortedAggregator};
pub use tasklet::{Processor, ProcessorContext, ProcessorFactory, Tasklet, TaskletProgress};
pub use memory::{BlockAddress, BlockPool, MemoryBlock};
pub use storage::{stable_hash, BinaryStorage, Slot, SlotRef, StoredEntry};
