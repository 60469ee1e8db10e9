//! Contact iterator (C5).
//!
//! Consumes a pre-sorted (timestamp ascending) contact stream and produces,
//! lazily, `(timestamp, group)` pairs where `group` is the run of contacts
//! sharing that timestamp. Forward-only; restartable by constructing a new
//! `ContactGroups` over the same slice.

use crate::prelude::{Id, Time};

/// A single `(timestamp, u, v)` contact. `u != v`; both are valid ids.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ContactEvent {
    pub timestamp: Time,
    pub u: Id,
    pub v: Id,
}

impl ContactEvent {
    pub fn new(timestamp: Time, u: Id, v: Id) -> Self {
        ContactEvent { timestamp, u, v }
    }
}

/// Forward-only iterator grouping a pre-sorted `&[ContactEvent]` slice by
/// timestamp.
pub struct ContactGroups<'a> {
    remaining: &'a [ContactEvent],
}

impl<'a> ContactGroups<'a> {
    /// Build a fresh grouping iterator over `events`, starting from the top
    /// of the stream.
    pub fn new(events: &'a [ContactEvent]) -> Self {
        ContactGroups { remaining: events }
    }
}

impl<'a> Iterator for ContactGroups<'a> {
    type Item = (Time, &'a [ContactEvent]);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.remaining.first()?;
        let timestamp = first.timestamp;
        let split = self
            .remaining
            .iter()
            .position(|e| e.timestamp != timestamp)
            .unwrap_or(self.remaining.len());
        let (group, rest) = self.remaining.split_at(split);
        self.remaining = rest;
        Some((timestamp, group))
    }
}

/// Returns `true` iff `events` is sorted non-decreasing by timestamp, the
/// contract the contact stream input must satisfy.
pub fn is_sorted_by_timestamp(events: &[ContactEvent]) -> bool {
    events
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp)
}
