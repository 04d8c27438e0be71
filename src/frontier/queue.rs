//! Ordered index of PENDING records

use crate::state::{Priority, UrlRecord};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A pending URL with its ordering information
#[derive(Debug, Clone)]
pub struct QueuedUrl {
    pub priority: Priority,
    pub depth: u32,

    /// Admission order; unique per record
    pub seq: u64,

    /// Normalized URL, the record key
    pub url: String,

    pub domain: String,
}

impl QueuedUrl {
    pub fn from_record(record: &UrlRecord) -> Self {
        Self {
            priority: record.priority,
            depth: record.depth,
            seq: record.seq,
            url: record.normalized.clone(),
            domain: record.domain.clone(),
        }
    }
}

// Ascending order: higher priority first, then shallower, then earlier admission
impl Ord for QueuedUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.depth.cmp(&other.depth))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for QueuedUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedUrl {}

/// Pending URLs in dispatch order
///
/// Unlike a heap, the sorted set lets selection walk past ineligible
/// candidates and remove arbitrary entries without rebuilding.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: BTreeSet<QueuedUrl>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: QueuedUrl) -> bool {
        self.entries.insert(entry)
    }

    pub fn remove(&mut self, entry: &QueuedUrl) -> bool {
        self.entries.remove(entry)
    }

    /// Iterates in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = &QueuedUrl> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
