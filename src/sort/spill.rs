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

//! A spilled, already-sorted run of records.
//!
//! The real system spills to disk or a secondary memory region; that
//! collaborator is out of scope here, so a `SpillRun` is modeled as
//! a sequence of in-memory chunks, each sized to `spillingChunkSize`, holding
//! length-prefixed `(key, value)` pairs in sorted order.

fn encode_len(len: u32, use_big_endian: bool) -> [u8; 4] {
    if use_big_endian {
        len.to_be_bytes()
    } else {
        len.to_le_bytes()
    }
}

fn decode_len(bytes: &[u8], use_big_endian: bool) -> u32 {
    let bytes: [u8; 4] = bytes.try_into().unwrap();
    if use_big_endian {
        u32::from_be_bytes(bytes)
    } else {
        u32::from_le_bytes(bytes)
    }
}

/// A sorted run that has been "spilled": chunked into `spillingChunkSize`
/// buffers rather than kept as one contiguous partition.
pub struct SpillRun {
    chunks: Vec<Vec<u8>>,
    use_big_endian: bool,
}

impl SpillRun {
    /// Builds a spill run from an already-sorted sequence of pairs, splitting
    /// the length-prefixed encoding into chunks no larger than `chunk_size`.
    /// `use_big_endian` selects the length-prefix encoding, per
    /// [`crate::config::StoreConfig::use_big_endian`].
    pub fn build<'a>(
        sorted_pairs: impl Iterator<Item = (&'a [u8], &'a [u8])>,
        chunk_size: usize,
        use_big_endian: bool,
    ) -> Self {
        let mut chunks = Vec::new();
        let mut current = Vec::new();
        for (key, value) in sorted_pairs {
            let mut encoded = Vec::with_capacity(8 + key.len() + value.len());
            encoded.extend_from_slice(&encode_len(key.len() as u32, use_big_endian));
            encoded.extend_from_slice(key);
            encoded.extend_from_slice(&encode_len(value.len() as u32, use_big_endian));
            encoded.extend_from_slice(value);

            if !current.is_empty() && current.len() + encoded.len() > chunk_size {
                chunks.push(std::mem::take(&mut current));
            }
            current.extend_from_slice(&encoded);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        Self { chunks, use_big_endian }
    }

    pub fn cursor(&self) -> SpillCursor<'_> {
        SpillCursor {
            chunks: &self.chunks,
            chunk_idx: 0,
            offset: 0,
            use_big_endian: self.use_big_endian,
        }
    }
}

/// Sequential decoder over a [`SpillRun`]'s chunks.
pub struct SpillCursor<'a> {
    chunks: &'a [Vec<u8>],
    chunk_idx: usize,
    offset: usize,
    use_big_endian: bool,
}

impl<'a> SpillCursor<'a> {
    pub fn peek(&self) -> Option<(&'a [u8], &'a [u8])> {
        let chunk = self.chunks.get(self.chunk_idx)?;
        if self.offset >= chunk.len() {
            return None;
        }
        let buf = &chunk[self.offset..];
        let key_len = decode_len(&buf[0..4], self.use_big_endian) as usize;
        let key = &buf[4..4 + key_len];
        let rest = &buf[4 + key_len..];
        let value_len = decode_len(&rest[0..4], self.use_big_endian) as usize;
        let value = &rest[4..4 + value_len];
        Some((key, value))
    }

    pub fn advance(&mut self) {
        let Some(chunk) = self.chunks.get(self.chunk_idx) else {
            return;
        };
        let buf = &chunk[self.offset..];
        let key_len = decode_len(&buf[0..4], self.use_big_endian) as usize;
        let rest = &buf[4 + key_len..];
        let value_len = decode_len(&rest[0..4], self.use_big_endian) as usize;
        let record_len = 4 + key_len + 4 + value_len;
        self.offset += record_len;
        if self.offset >= chunk.len() {
            self.offset = 0;
            self.chunk_idx += 1;
        }
    }
}
