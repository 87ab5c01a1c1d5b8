//! Shutdown signal
//!
//! The server holds the `watch::Sender<bool>`; every viewer session and
//! producer thread holds a receiver. Flipping the value to `true` tells all
//! of them to stop.

use tokio::sync::watch;

/// Per-task view of the server shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    /// Set once the signal has been observed
    is_shutdown: bool,
    notify: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new(notify: watch::Receiver<bool>) -> Self {
        Self {
            is_shutdown: false,
            notify,
        }
    }

    /// Non-blocking check, usable from producer threads
    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown || *self.notify.borrow()
    }

    /// Wait until shutdown is signalled
    ///
    /// A dropped sender counts as shutdown.
    pub async fn recv(&mut self) {
        if self.is_shutdown {
            return;
        }
        let _ = self.notify.wait_for(|stop| *stop).await;
        self.is_shutdown = true;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_recv_after_signal() {
        let (tx, rx) = watch::channel(false);
        let mut shutdown = Shutdown::new(rx);
        assert!(!shutdown.is_shutdown());

        tx.send_replace(true);

        tokio::time::timeout(Duration::from_secs(1), shutdown.recv())
            .await
            .unwrap();
        assert!(shutdown.is_shutdown());
    }

    #[tokio::test]
    async fn test_dropped_sender_counts_as_shutdown() {
        let (tx, rx) = watch::channel(false);
        let mut shutdown = Shutdown::new(rx);
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), shutdown.recv())
            .await
            .unwrap();
        assert!(shutdown.is_shutdown());
    }
}
