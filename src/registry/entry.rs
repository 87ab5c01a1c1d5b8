//! Stream entry types
//!
//! This module defines the per-stream state stored in the registry.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::slot::FrameSlot;

/// Where and how large a stream is shown on the index page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Displayed width in pixels
    pub width: u32,
    /// Displayed height in pixels
    pub height: u32,
    /// Table row on the index page (rows are rendered in ascending order)
    pub row: usize,
}

impl Placement {
    pub fn new(width: u32, height: u32, row: usize) -> Self {
        Self { width, height, row }
    }
}

/// Entry for a single stream in the registry
#[derive(Debug)]
pub struct StreamEntry {
    /// URL path the stream is served on
    pub path: String,

    /// Display placement on the index page
    pub placement: Placement,

    /// Mailbox shared with the producer
    pub(super) slot: Arc<FrameSlot>,

    /// Number of connected viewers
    subscriber_count: AtomicU32,
}

impl StreamEntry {
    pub(super) fn new(path: String, placement: Placement) -> Self {
        let slot = Arc::new(FrameSlot::new(path.clone()));
        Self {
            path,
            placement,
            slot,
            subscriber_count: AtomicU32::new(0),
        }
    }

    /// The stream's frame slot
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    /// Get the number of subscribers
    pub fn subscriber_count(&self) -> u32 {
        self.subscriber_count.load(Ordering::Relaxed)
    }

    /// Register a viewer; the count drops again when the guard is dropped
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let count = self.subscriber_count.fetch_add(1, Ordering::Relaxed) + 1;

        tracing::info!(
            stream = %self.path,
            subscribers = count,
            "Subscriber added"
        );

        Subscription {
            entry: Arc::clone(self),
        }
    }
}

/// RAII handle for one connected viewer
#[derive(Debug)]
pub struct Subscription {
    entry: Arc<StreamEntry>,
}

impl Subscription {
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.entry.slot
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let prev = self.entry.subscriber_count.fetch_sub(1, Ordering::Relaxed);

        tracing::debug!(
            stream = %self.entry.path,
            subscribers = prev.saturating_sub(1),
            "Subscriber removed"
        );
    }
}

/// Statistics for a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStats {
    /// Number of active subscribers
    pub subscriber_count: u32,
    /// Latest published version (0 = nothing yet)
    pub version: u64,
    /// Size of the latest frame in bytes
    pub last_frame_size: usize,
}
