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

//! The item model that flows across edges.

/// A monotonic progress signal: "no future event has `ts < seq`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark {
    pub seq: i64,
}

impl Watermark {
    pub fn new(seq: i64) -> Self {
        Self { seq }
    }
}

/// Everything that can flow across an edge: a user payload, or one of the
/// small set of typed control messages. Regular items and watermarks share
/// the same channel and must preserve relative order.
#[derive(Debug, Clone)]
pub enum Item<T> {
    Value(T),
    Watermark(Watermark),
    EndOfStream,
}

impl<T> Item<T> {
    pub fn is_watermark(&self) -> bool {
        matches!(self, Item::Watermark(_))
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Item::EndOfStream)
    }

    pub fn as_watermark(&self) -> Option<Watermark> {
        match self {
            Item::Watermark(w) => Some(*w),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Item::Value(v) => Some(v),
            _ => None,
        }
    }
}
