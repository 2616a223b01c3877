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

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a DAG was rejected at submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DagValidationError {
    #[error("duplicate vertex name {0:?}")]
    DuplicateName(String),
    #[error("cycle detected through vertex {0:?}")]
    Cycle(String),
    #[error("edge from {0:?} references a vertex that does not exist")]
    DanglingEdge(String),
    #[error("duplicate edge ({from:?}:{source_ordinal} -> {to:?}:{dest_ordinal})")]
    DuplicateEdge {
        from: String,
        source_ordinal: u32,
        to: String,
        dest_ordinal: u32,
    },
}

/// Top-level error taxonomy,
#[derive(Error, Debug)]
pub enum Error {
    /// Store allocation failed and spilling is disabled.
    #[error("memory exhausted in store: {0}")]
    MemoryExhausted(String),

    /// A fan-in edge observed disagreeing watermarks from its upstreams.
    #[error("watermark misorder on fan-in: {0}")]
    WatermarkMisorder(String),

    /// User processor code failed.
    #[error("processor {identity:?} failed")]
    ProcessorFailure {
        identity: String,
        #[source]
        cause: anyhow::Error,
    },

    /// The job was cancelled externally.
    #[error("job cancelled")]
    Cancelled,

    /// The DAG was rejected at submission time.
    #[error("invalid dag")]
    DagInvalid(#[from] DagValidationError),
}
