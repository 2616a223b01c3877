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

//! DAG model: vertices, edges, forwarding patterns.
//!
//! The whole DAG is generic over one payload type `T`, the same way
//! `differential_dataflow`'s `Stream<G, D>` is generic over its data type:
//! every vertex in a given [`Dag<T>`] consumes and produces the same `T`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::config::ExecutorConfig;
use crate::error::{DagValidationError, Result};
use crate::inbox::Inbox;
use crate::outbox::{Outbox, OutboxBucket};
use crate::queue::{edge_queue, EdgeQueueConsumer};
use crate::tasklet::{ProcessorContext, ProcessorFactory, Tasklet};

/// Marker bound for anything that can flow through a [`Dag`]: cheap to clone
/// (broadcast duplicates it) and shareable across worker threads.
pub trait Payload: Clone + Send + 'static {}
impl<T: Clone + Send + 'static> Payload for T {}

/// How an edge's items are routed to a downstream vertex's parallel instances.
pub enum ForwardingPattern<T> {
    /// One item to one downstream instance, round-robin.
    Unicast,
    /// Every item to every downstream instance.
    Broadcast,
    /// By key hash, via `key_fn` and `partition_fn`.
    Partitioned {
        key_fn: Arc<dyn Fn(&T) -> u64 + Send + Sync>,
        partition_fn: Arc<dyn Fn(u64, usize) -> usize + Send + Sync>,
    },
    /// Fan-in to a single downstream instance.
    AllToOne,
}

impl<T> Clone for ForwardingPattern<T> {
    fn clone(&self) -> Self {
        match self {
            ForwardingPattern::Unicast => ForwardingPattern::Unicast,
            ForwardingPattern::Broadcast => ForwardingPattern::Broadcast,
            ForwardingPattern::AllToOne => ForwardingPattern::AllToOne,
            ForwardingPattern::Partitioned {
                key_fn,
                partition_fn,
            } => ForwardingPattern::Partitioned {
                key_fn: key_fn.clone(),
                partition_fn: partition_fn.clone(),
            },
        }
    }
}

impl<T> std::fmt::Debug for ForwardingPattern<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForwardingPattern::Unicast => write!(f, "Unicast"),
            ForwardingPattern::Broadcast => write!(f, "Broadcast"),
            ForwardingPattern::Partitioned { .. } => write!(f, "Partitioned"),
            ForwardingPattern::AllToOne => write!(f, "AllToOne"),
        }
    }
}

/// Identity and processor factory for one vertex. Immutable after [`DagBuilder::freeze`].
pub struct Vertex<T> {
    pub name: String,
    pub parallelism: u32,
    pub factory: ProcessorFactory<T>,
}

impl<T> Vertex<T> {
    pub fn new(name: impl Into<String>, parallelism: u32, factory: ProcessorFactory<T>) -> Self {
        assert!(parallelism >= 1, "local parallelism must be >= 1");
        Self {
            name: name.into(),
            parallelism,
            factory,
        }
    }
}

/// A directed connection between two vertices,
pub struct Edge<T> {
    pub from: String,
    pub to: String,
    pub source_ordinal: u32,
    pub dest_ordinal: u32,
    /// Lower priority value is drained first on fan-in.
    pub priority: i32,
    pub forwarding: ForwardingPattern<T>,
    /// Whether this edge would route through a cluster transport in a full
    /// deployment. The core executor treats it identically either way; routing
    /// is an external collaborator's concern.
    pub distributed: bool,
}

impl<T> Edge<T> {
    pub fn unicast(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            source_ordinal: 0,
            dest_ordinal: 0,
            priority: 0,
            forwarding: ForwardingPattern::Unicast,
            distributed: false,
        }
    }

    pub fn with_ordinals(mut self, source_ordinal: u32, dest_ordinal: u32) -> Self {
        self.source_ordinal = source_ordinal;
        self.dest_ordinal = dest_ordinal;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_forwarding(mut self, forwarding: ForwardingPattern<T>) -> Self {
        self.forwarding = forwarding;
        self
    }
}

/// A frozen, validated DAG, ready to be handed to the [`crate::executor::Executor`].
pub struct Dag<T> {
    pub vertices: Vec<Vertex<T>>,
    pub edges: Vec<Edge<T>>,
}

impl<T: Payload> Dag<T> {
    /// Instantiates every vertex's processor `parallelism` times and wires an
    /// [`EdgeQueue`](crate::queue::edge_queue) between every upstream/downstream
    /// instance pair for each edge, giving each instance its own `Outbox` (one
    /// bucket per outgoing edge, indexed by `source_ordinal`) and `Inbox` (one
    /// per incoming `dest_ordinal`, aggregating every feeding instance, in
    /// ascending edge-priority order). The result is ready for
    /// [`crate::executor::Executor::new`].
    ///
    /// Assumes, per vertex, that outgoing edges use distinct, zero-based
    /// contiguous `source_ordinal`s — the same assumption `Outbox::add`'s
    /// ordinal-indexed bucket lookup already makes.
    pub fn wire(self, config: &ExecutorConfig) -> Vec<Tasklet<T>> {
        let name_to_idx: HashMap<&str, usize> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name.as_str(), i))
            .collect();

        // Per vertex instance: outgoing buckets keyed by source ordinal, and
        // incoming (priority, consumers) keyed by dest ordinal.
        let mut outgoing: Vec<Vec<BTreeMap<u32, OutboxBucket<T>>>> = self
            .vertices
            .iter()
            .map(|v| (0..v.parallelism).map(|_| BTreeMap::new()).collect())
            .collect();
        let mut incoming: Vec<Vec<BTreeMap<u32, (i32, Vec<EdgeQueueConsumer<T>>)>>> = self
            .vertices
            .iter()
            .map(|v| (0..v.parallelism).map(|_| BTreeMap::new()).collect())
            .collect();

        for edge in &self.edges {
            let from_idx = name_to_idx[edge.from.as_str()];
            let to_idx = name_to_idx[edge.to.as_str()];
            let from_parallelism = self.vertices[from_idx].parallelism;
            let to_parallelism = self.vertices[to_idx].parallelism;

            for s in 0..from_parallelism {
                let mut producers = Vec::with_capacity(to_parallelism as usize);
                for d in 0..to_parallelism {
                    let (producer, consumer) = edge_queue::<T>(config.queue_capacity);
                    producers.push(producer);
                    incoming[to_idx][d as usize]
                        .entry(edge.dest_ordinal)
                        .or_insert_with(|| (edge.priority, Vec::new()))
                        .1
                        .push(consumer);
                }
                let bucket = OutboxBucket::new(edge.forwarding.clone(), producers);
                outgoing[from_idx][s as usize].insert(edge.source_ordinal, bucket);
            }
        }

        let global_parallelism: Vec<u32> = self.vertices.iter().map(|v| v.parallelism).collect();
        let mut tasklets = Vec::new();

        for (v_idx, vertex) in self.vertices.into_iter().enumerate() {
            for instance_index in 0..vertex.parallelism {
                let buckets: Vec<OutboxBucket<T>> =
                    std::mem::take(&mut outgoing[v_idx][instance_index as usize])
                        .into_values()
                        .collect();
                let outbox = Outbox::new(buckets);

                let mut inboxes: Vec<(i32, u32, Inbox<T>)> =
                    std::mem::take(&mut incoming[v_idx][instance_index as usize])
                        .into_iter()
                        .map(|(ordinal, (priority, consumers))| (priority, ordinal, Inbox::new(consumers)))
                        .collect();
                inboxes.sort_by_key(|(priority, _, _)| *priority);
                let inboxes: Vec<(u32, Inbox<T>)> =
                    inboxes.into_iter().map(|(_, ordinal, inbox)| (ordinal, inbox)).collect();

                let processor = (vertex.factory)();
                let ctx = ProcessorContext {
                    global_parallelism: global_parallelism[v_idx],
                    local_parallelism: vertex.parallelism,
                    instance_index,
                };
                tasklets.push(Tasklet::new(processor, inboxes, outbox, ctx));
            }
        }

        tasklets
    }
}

/// Accumulates vertices and edges before [`DagBuilder::freeze`] validates them.
pub struct DagBuilder<T> {
    vertices: Vec<Vertex<T>>,
    edges: Vec<Edge<T>>,
}

impl<T> Default for DagBuilder<T> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<T> DagBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(mut self, vertex: Vertex<T>) -> Self {
        self.vertices.push(vertex);
        self
    }

    pub fn add_edge(mut self, edge: Edge<T>) -> Self {
        self.edges.push(edge);
        self
    }

    /// Validate and freeze the DAG: rejects duplicate vertex names, dangling
    /// edges, duplicate `(from.sourceOrdinal, to.destOrdinal)` pairs, and
    /// cycles.
    pub fn freeze(self) -> Result<Dag<T>> {
        let mut seen_names = HashSet::with_capacity(self.vertices.len());
        for v in &self.vertices {
            if !seen_names.insert(v.name.as_str()) {
                return Err(DagValidationError::DuplicateName(v.name.clone()).into());
            }
        }

        let mut seen_edge_keys = HashSet::new();
        for e in &self.edges {
            if !seen_names.contains(e.from.as_str()) {
                return Err(DagValidationError::DanglingEdge(e.from.clone()).into());
            }
            if !seen_names.contains(e.to.as_str()) {
                return Err(DagValidationError::DanglingEdge(e.to.clone()).into());
            }
            let key = (
                e.from.clone(),
                e.source_ordinal,
                e.to.clone(),
                e.dest_ordinal,
            );
            if !seen_edge_keys.insert(key) {
                return Err(DagValidationError::DuplicateEdge {
                    from: e.from.clone(),
                    source_ordinal: e.source_ordinal,
                    to: e.to.clone(),
                    dest_ordinal: e.dest_ordinal,
                }
                .into());
            }
        }

        detect_cycle(&self.vertices, &self.edges)?;

        Ok(Dag {
            vertices: self.vertices,
            edges: self.edges,
        })
    }
}

/// DFS three-color cycle detection over vertex names.
fn detect_cycle<T>(vertices: &[Vertex<T>], edges: &[Edge<T>]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for v in vertices {
        adjacency.entry(v.name.as_str()).or_default();
    }
    for e in edges {
        adjacency
            .entry(e.from.as_str())
            .or_default()
            .push(e.to.as_str());
    }

    let mut colors: HashMap<&str, Color> = vertices
        .iter()
        .map(|v| (v.name.as_str(), Color::White))
        .collect();

    fn visit<'a>(
        node: &'a str,
        adjacency: &HashMap<&'a str, Vec<&'a str>>,
        colors: &mut HashMap<&'a str, Color>,
    ) -> Result<()> {
        colors.insert(node, Color::Gray);
        if let Some(neighbors) = adjacency.get(node) {
            for &next in neighbors {
                match colors.get(next).copied().unwrap_or(Color::White) {
                    Color::White => visit(next, adjacency, colors)?,
                    Color::Gray => return Err(DagValidationError::Cycle(next.to_owned()).into()),
                    Color::Black => {}
                }
            }
        }
        colors.insert(node, Color::Black);
        Ok(())
    }

    for v in vertices {
        if colors.get(v.name.as_str()).copied() == Some(Color::White) {
            visit(v.name.as_str(), &adjacency, &mut colors)?;
        }
    }
    Ok(())
}
