//! Single-slot "latest frame wins" mailbox
//!
//! A [`FrameSlot`] holds at most one frame: the most recently published one.
//! Publishing overwrites the slot and wakes every waiter; it never queues and
//! never waits for a reader. Readers remember the last version they saw and
//! ask for anything newer:
//!
//! ```text
//!   publish(A)  publish(B)  publish(C)            publish(D)
//!       │           │           │                     │
//!  v=1 ─┴─── v=2 ───┴─── v=3 ───┴──────────── v=4 ────┴──►
//!                                  ▲                   ▲
//!  fast reader:  wait_next(2) ─────┘ (C, 3)            │
//!                                                      │
//!  slow reader:  wait_next(1) ... busy writing ... ────┘ (D, 4)
//! ```
//!
//! The slow reader never sees B or C. Intermediate frames are dropped.
//!
//! Built on `tokio::sync::watch`, which is exactly a lock-protected single
//! value plus a broadcast wakeup.

use tokio::sync::watch;

use super::frame::Frame;

/// Error returned by [`FrameSlot::wait_next`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// The slot was closed (server shutdown)
    Closed,
}

impl std::fmt::Display for SlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotError::Closed => write!(f, "Frame slot closed"),
        }
    }
}

impl std::error::Error for SlotError {}

#[derive(Debug, Clone)]
struct Versioned {
    frame: Frame,
    version: u64,
}

#[derive(Debug, Default)]
struct SlotState {
    current: Option<Versioned>,
    closed: bool,
}

impl SlotState {
    fn version(&self) -> u64 {
        self.current.as_ref().map_or(0, |c| c.version)
    }
}

/// Mailbox for the latest frame of one stream
///
/// One writer (its producer), any number of concurrent readers. Each slot
/// has its own lock; slots never contend with each other.
#[derive(Debug)]
pub struct FrameSlot {
    name: String,
    tx: watch::Sender<SlotState>,
}

impl FrameSlot {
    /// Create an empty slot (version 0)
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(SlotState::default());
        Self {
            name: name.into(),
            tx,
        }
    }

    /// Name used in log output
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the stored frame and wake all waiters
    ///
    /// Returns the new version, or `None` if the slot has been closed.
    /// Cost does not depend on how many sessions are waiting or how fast
    /// they drain their sockets.
    pub fn publish(&self, frame: impl Into<Frame>) -> Option<u64> {
        let frame = frame.into();
        let mut published = None;

        self.tx.send_if_modified(|state| {
            if state.closed {
                return false;
            }
            let version = state.version() + 1;
            state.current = Some(Versioned { frame, version });
            published = Some(version);
            true
        });

        if published.is_none() {
            tracing::debug!(slot = %self.name, "Publish into closed slot ignored");
        }

        published
    }

    /// Wait for a frame newer than `last_seen`
    ///
    /// Returns immediately if the slot already holds a newer frame. The
    /// returned version is always strictly greater than `last_seen`, and it
    /// is the slot's current version at the moment of the check, never an
    /// older skipped one.
    ///
    /// Cancel safe: dropping the future leaves the slot untouched.
    pub async fn wait_next(&self, last_seen: u64) -> Result<(Frame, u64), SlotError> {
        let mut rx = self.tx.subscribe();

        // `wait_for` re-checks the predicate on every wakeup
        let state = rx
            .wait_for(|state| state.closed || state.version() > last_seen)
            .await
            .map_err(|_| SlotError::Closed)?;

        if state.closed {
            return Err(SlotError::Closed);
        }

        match state.current {
            Some(ref current) => Ok((current.frame.clone(), current.version)),
            None => Err(SlotError::Closed),
        }
    }

    /// Peek at the current frame without waiting
    pub fn latest(&self) -> Option<(Frame, u64)> {
        let state = self.tx.borrow();
        state
            .current
            .as_ref()
            .map(|current| (current.frame.clone(), current.version))
    }

    /// Current version (0 until the first publish)
    pub fn version(&self) -> u64 {
        self.tx.borrow().version()
    }

    /// Close the slot, waking every waiter with [`SlotError::Closed`]
    pub fn close(&self) {
        self.tx.send_if_modified(|state| {
            if state.closed {
                false
            } else {
                state.closed = true;
                true
            }
        });
    }

    pub fn is_closed(&self) -> bool {
        self.tx.borrow().closed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;

    fn frame_of(len: usize, fill: u8) -> Frame {
        Frame::new(vec![fill; len])
    }

    #[tokio::test]
    async fn test_first_publish_wakes_waiter() {
        let slot = Arc::new(FrameSlot::new("test"));
        assert_eq!(slot.version(), 0);

        let waiter = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.wait_next(0).await })
        };
        tokio::task::yield_now().await;

        let frame_a = frame_of(100, 0xAA);
        slot.publish(frame_a.clone());

        let (frame, version) = waiter.await.unwrap().unwrap();
        assert_eq!(version, 1);
        assert_eq!(frame, frame_a);
        assert_eq!(frame.len(), 100);
    }

    #[tokio::test]
    async fn test_waiter_never_sees_older_frame() {
        let slot = Arc::new(FrameSlot::new("test"));
        let frame_a = frame_of(100, 0xAA);
        slot.publish(frame_a.clone());

        let (_, seen) = slot.wait_next(0).await.unwrap();
        assert_eq!(seen, 1);

        let waiter = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.wait_next(seen).await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        let frame_b = frame_of(120, 0xBB);
        slot.publish(frame_b.clone());

        let (frame, version) = waiter.await.unwrap().unwrap();
        assert_eq!(version, 2);
        assert_eq!(frame, frame_b);
        assert_ne!(frame, frame_a);
    }

    #[tokio::test]
    async fn test_returns_immediately_when_newer_frame_present() {
        let slot = FrameSlot::new("test");
        for i in 1..=3u8 {
            slot.publish(frame_of(10, i));
        }

        let (frame, version) = tokio::time::timeout(Duration::from_millis(50), slot.wait_next(0))
            .await
            .expect("should not block")
            .unwrap();

        assert_eq!(version, 3);
        assert_eq!(frame.data()[0], 3);
    }

    #[tokio::test]
    async fn test_blocks_until_newer_version() {
        let slot = FrameSlot::new("test");
        slot.publish(frame_of(10, 1));

        let result = tokio::time::timeout(Duration::from_millis(30), slot.wait_next(1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_intermediate_frames_dropped() {
        let slot = FrameSlot::new("test");
        slot.publish(frame_of(10, 1));
        let (_, seen) = slot.wait_next(0).await.unwrap();

        // Reader is "busy" while three frames go by
        slot.publish(frame_of(10, 2));
        slot.publish(frame_of(10, 3));
        slot.publish(frame_of(10, 4));

        let (frame, version) = slot.wait_next(seen).await.unwrap();
        assert_eq!(version, 4);
        assert_eq!(frame.data()[0], 4);
    }

    #[tokio::test]
    async fn test_all_waiters_woken() {
        let slot = Arc::new(FrameSlot::new("test"));

        let waiters: Vec<_> = (0..16)
            .map(|_| {
                let slot = Arc::clone(&slot);
                tokio::spawn(async move { slot.wait_next(0).await })
            })
            .collect();
        tokio::task::yield_now().await;

        slot.publish(Bytes::from_static(b"jpeg"));

        for waiter in waiters {
            let (frame, version) = waiter.await.unwrap().unwrap();
            assert_eq!(version, 1);
            assert_eq!(frame.data().as_ref(), b"jpeg");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_versions_monotonic_under_concurrent_publish() {
        let slot = Arc::new(FrameSlot::new("test"));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                tokio::spawn(async move {
                    let mut last_seen = 0;
                    while last_seen < 500 {
                        let (frame, version) = slot.wait_next(last_seen).await.unwrap();
                        assert!(version > last_seen);
                        assert_eq!(frame.data().as_ref(), &version.to_be_bytes());
                        last_seen = version;
                    }
                })
            })
            .collect();

        let publisher = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for version in 1..=500u64 {
                    slot.publish(version.to_be_bytes().to_vec());
                }
            })
        };

        publisher.join().unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_close_cancels_waiters() {
        let slot = Arc::new(FrameSlot::new("test"));

        let waiter = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move { slot.wait_next(0).await })
        };
        tokio::task::yield_now().await;

        slot.close();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake promptly")
            .unwrap();
        assert_eq!(result, Err(SlotError::Closed));
        assert!(slot.is_closed());
    }

    #[tokio::test]
    async fn test_publish_after_close_ignored() {
        let slot = FrameSlot::new("test");
        assert_eq!(slot.publish(frame_of(4, 1)), Some(1));

        slot.close();

        assert_eq!(slot.publish(frame_of(4, 2)), None);
        assert_eq!(slot.version(), 1);
        assert_eq!(slot.wait_next(0).await, Err(SlotError::Closed));
    }

    #[test]
    fn test_publish_without_waiters() {
        let slot = FrameSlot::new("test");
        assert!(slot.latest().is_none());

        for expected in 1..=1000 {
            assert_eq!(slot.publish(frame_of(8, 0)), Some(expected));
        }

        let (_, version) = slot.latest().unwrap();
        assert_eq!(version, 1000);
    }
}
