//! Live stream session
//!
//! One [`StreamSession`] per viewer. It waits on the stream's frame slot and
//! turns each newer frame into a multipart part. The session is the body of
//! the viewer's response: hyper pulls the next part only once the previous
//! one has gone out, so a slow or dead viewer can only ever stall itself and
//! skips the frames it was too slow for.

use std::convert::Infallible;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::OwnedSemaphorePermit;

use crate::protocol::Part;
use crate::registry::Subscription;
use crate::server::shutdown::Shutdown;
use crate::stats::SessionStats;

use super::context::SessionContext;

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Server shutdown signal received
    Cancelled,
    /// The frame slot was closed
    SlotClosed,
    /// The response body was dropped before the stream ended
    Disconnected,
}

/// Per-viewer stream state
pub struct StreamSession {
    /// Connection-limit slot; dropped before the subscription so a zero
    /// subscriber count means the slot is free again
    _permit: Option<OwnedSemaphorePermit>,
    ctx: SessionContext,
    subscription: Subscription,
    shutdown: Shutdown,
    last_seen: u64,
    stats: SessionStats,
    end: Option<SessionEnd>,
}

impl StreamSession {
    /// Create a session that has not seen any frame yet
    pub fn new(ctx: SessionContext, subscription: Subscription, shutdown: Shutdown) -> Self {
        Self {
            _permit: None,
            ctx,
            subscription,
            shutdown,
            last_seen: 0,
            stats: SessionStats::new(),
            end: None,
        }
    }

    /// Hold `permit` for as long as the session lives
    pub fn with_permit(mut self, permit: Option<OwnedSemaphorePermit>) -> Self {
        self._permit = permit;
        self
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Why the session ended, if it has
    pub fn end(&self) -> Option<SessionEnd> {
        self.end
    }

    /// Wait for a frame newer than the last one and encode it
    ///
    /// Returns `None` once the server shuts down or the slot is closed; every
    /// later call returns `None` immediately.
    pub async fn next_part(&mut self) -> Option<Part> {
        if self.end.is_some() {
            return None;
        }

        let next = tokio::select! {
            biased;
            _ = self.shutdown.recv() => Err(SessionEnd::Cancelled),
            next = self.subscription.slot().wait_next(self.last_seen) => {
                next.map_err(|_| SessionEnd::SlotClosed)
            }
        };

        match next {
            Ok((frame, version)) => {
                let part = Part::new(&frame);
                self.stats.on_frame(version, part.encoded_len());
                self.last_seen = version;

                tracing::trace!(
                    session_id = self.ctx.session_id,
                    version = version,
                    size = frame.len(),
                    "Part ready"
                );
                Some(part)
            }
            Err(end) => {
                self.end = Some(end);
                None
            }
        }
    }

    /// Turn the session into a response body stream
    ///
    /// Each part is yielded as its header, the shared frame payload and the
    /// trailing CRLF.
    pub fn into_body_stream(
        self,
    ) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        stream::unfold(self, |mut session| async move {
            let part = session.next_part().await?;
            Some((part, session))
        })
        .flat_map(|part| stream::iter(part.into_chunks()))
        .map(Ok)
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        let end = self.end.unwrap_or(SessionEnd::Disconnected);

        if end == SessionEnd::Disconnected {
            tracing::info!(
                session_id = self.ctx.session_id,
                peer = %self.ctx.peer_addr,
                stream = %self.ctx.path,
                "Removed streaming client"
            );
        }

        tracing::debug!(
            session_id = self.ctx.session_id,
            frames_sent = self.stats.frames_sent,
            frames_skipped = self.stats.frames_skipped,
            bytes_sent = self.stats.bytes_sent,
            fps = self.stats.delivered_fps(),
            bitrate = self.stats.bitrate(),
            duration_ms = self.stats.duration().as_millis() as u64,
            end = ?end,
            "Stream session ended"
        );
    }
}
