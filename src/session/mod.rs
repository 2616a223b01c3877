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

//! The session-window operator: per-key event-time windows that merge when a
//! new event bridges two open intervals, emitted once a watermark proves they
//! can no longer grow.

mod interval;
mod operator;

pub use interval::Interval;
pub use operator::{Accumulator, Session, SessionWindowOperator};
