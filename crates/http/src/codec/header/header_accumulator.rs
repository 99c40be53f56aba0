//! Folds header name/value fragments into complete header entries.
//!
//! The request parser reports header names and values as fragments, split
//! wherever a read boundary fell inside a token. The accumulator glues the
//! fragments back together and commits one [`HeaderEntry`] per header line:
//!
//! ```text
//! Empty --field--> InName --value--> InValue --field--> InName ...
//!                  (append)          (append)  (commit)
//! ```
//!
//! The entry still pending when the head ends is committed by [`finish`](HeaderAccumulator::finish).

use bytes::BytesMut;
use tracing::trace;

use crate::protocol::HeaderEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FoldState {
    Empty,
    InName,
    InValue,
}

#[derive(Debug)]
pub struct HeaderAccumulator {
    state: FoldState,
    name: BytesMut,
    value: BytesMut,
    entries: Vec<HeaderEntry>,
}

impl HeaderAccumulator {
    pub fn new() -> Self {
        Self { state: FoldState::Empty, name: BytesMut::new(), value: BytesMut::new(), entries: Vec::new() }
    }

    pub fn on_field(&mut self, fragment: &[u8]) {
        match self.state {
            FoldState::Empty => {
                self.name.extend_from_slice(fragment);
                self.state = FoldState::InName;
            }
            FoldState::InName => self.name.extend_from_slice(fragment),
            FoldState::InValue => {
                self.commit();
                self.name.extend_from_slice(fragment);
                self.state = FoldState::InName;
            }
        }
    }

    pub fn on_value(&mut self, fragment: &[u8]) {
        match self.state {
            FoldState::Empty => trace!(len = fragment.len(), "header value without a name, ignored"),
            FoldState::InName => {
                self.value.extend_from_slice(fragment);
                self.state = FoldState::InValue;
            }
            FoldState::InValue => self.value.extend_from_slice(fragment),
        }
    }

    /// Commits the last pending entry, called once the head is complete.
    pub fn finish(&mut self) {
        if self.state == FoldState::InValue {
            self.commit();
        }
        self.name.clear();
        self.state = FoldState::Empty;
    }

    /// Forgets every entry and any pending fragment.
    pub fn reset(&mut self) {
        self.state = FoldState::Empty;
        self.name.clear();
        self.value.clear();
        self.entries.clear();
    }

    /// Hands out the committed entries, leaving the accumulator empty.
    pub fn take(&mut self) -> Vec<HeaderEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    fn commit(&mut self) {
        let name = self.name.split().freeze();
        let value = self.value.split().freeze();
        trace!(name = ?name, value = ?value, "header committed");
        self.entries.push(HeaderEntry::new(name, value));
    }
}

impl Default for HeaderAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
