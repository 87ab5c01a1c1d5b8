//! Statistics for viewer sessions and producers

use std::time::{Duration, Instant};

/// Per-viewer statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// When the session started streaming
    pub started_at: Instant,
    /// Parts written to the client
    pub frames_sent: u64,
    /// Bytes written, including part headers
    pub bytes_sent: u64,
    /// Frames published while this session was busy and never sent to it
    pub frames_skipped: u64,
    /// Last version written
    pub last_version: u64,
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_sent: 0,
            bytes_sent: 0,
            frames_skipped: 0,
            last_version: 0,
        }
    }

    /// Record a part for `version` that took `bytes` on the wire
    pub fn on_frame(&mut self, version: u64, bytes: usize) {
        // The first frame a session sees is not counted as skipping history
        if self.last_version > 0 {
            self.frames_skipped += version.saturating_sub(self.last_version + 1);
        }
        self.last_version = version;
        self.frames_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Time since the session started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Average frames per second delivered
    pub fn delivered_fps(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.frames_sent as f64 / secs
        } else {
            0.0
        }
    }

    /// Calculate bitrate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_sent * 8) / secs
        } else {
            0
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-producer statistics
#[derive(Debug, Clone, Default)]
pub struct ProducerStats {
    /// Captures taken from the source
    pub captures: u64,
    /// Frames published to the primary stream
    pub primary_frames: u64,
    /// Frames published to crop streams (all windows together)
    pub crop_frames: u64,
    /// Encoded bytes published
    pub bytes_published: u64,
    /// Restarts after a failure
    pub restarts: u32,
}

impl ProducerStats {
    pub fn new() -> Self {
        Self::default()
    }
}
