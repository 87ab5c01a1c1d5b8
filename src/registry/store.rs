//! Stream registry implementation
//!
//! Fixed mapping from URL path to stream entry. Built once before the
//! listener starts; nothing is added or removed while serving, so lookups
//! need no lock at all.

use std::collections::HashMap;
use std::sync::Arc;

use crate::protocol::constants::{INDEX_PATH, ROOT_PATH};

use super::entry::{Placement, StreamEntry, StreamStats};
use super::error::RegistryError;
use super::slot::FrameSlot;

/// Immutable registry of all served streams
#[derive(Debug)]
pub struct StreamRegistry {
    /// Map of path to stream entry
    streams: HashMap<String, Arc<StreamEntry>>,

    /// Paths in registration order (page layout order within a row)
    order: Vec<String>,
}

impl StreamRegistry {
    /// Start building a registry
    pub fn builder() -> StreamRegistryBuilder {
        StreamRegistryBuilder::default()
    }

    /// Look up a stream by exact path
    pub fn get(&self, path: &str) -> Option<&Arc<StreamEntry>> {
        self.streams.get(path)
    }

    /// Frame slot for a path, for handing to a producer
    pub fn slot(&self, path: &str) -> Option<Arc<FrameSlot>> {
        self.streams.get(path).map(|entry| Arc::clone(&entry.slot))
    }

    /// Entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = &Arc<StreamEntry>> {
        self.order.iter().filter_map(|path| self.streams.get(path))
    }

    /// Registered paths in registration order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Get total number of streams
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Get stream statistics
    pub fn get_stream_stats(&self, path: &str) -> Option<StreamStats> {
        self.streams.get(path).map(|entry| {
            let latest = entry.slot.latest();
            StreamStats {
                subscriber_count: entry.subscriber_count(),
                version: latest.as_ref().map_or(0, |(_, version)| *version),
                last_frame_size: latest.as_ref().map_or(0, |(frame, _)| frame.len()),
            }
        })
    }

    /// Close every slot, waking all sessions so they can exit
    pub fn close_all(&self) {
        for entry in self.streams.values() {
            entry.slot.close();
        }
        tracing::debug!(streams = self.streams.len(), "All frame slots closed");
    }
}

/// Builder for [`StreamRegistry`]
#[derive(Debug, Default)]
pub struct StreamRegistryBuilder {
    streams: Vec<(String, Placement)>,
}

impl StreamRegistryBuilder {
    /// Register a stream on its own row below the existing ones
    pub fn stream(self, path: impl Into<String>, width: u32, height: u32) -> Self {
        let row = self
            .streams
            .iter()
            .map(|(_, placement)| placement.row + 1)
            .max()
            .unwrap_or(0);
        self.stream_at(path, Placement::new(width, height, row))
    }

    /// Register a stream with an explicit placement
    pub fn stream_at(mut self, path: impl Into<String>, placement: Placement) -> Self {
        self.streams.push((path.into(), placement));
        self
    }

    /// Validate and freeze the registry
    pub fn build(self) -> Result<StreamRegistry, RegistryError> {
        if self.streams.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut streams = HashMap::with_capacity(self.streams.len());
        let mut order = Vec::with_capacity(self.streams.len());

        for (path, placement) in self.streams {
            // `:` and `*` would make the route a parameter or wildcard, `?`
            // starts the query which routing never sees
            if !path.starts_with('/')
                || path
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, ':' | '*' | '?'))
            {
                return Err(RegistryError::InvalidPath(path));
            }
            if path == ROOT_PATH || path == INDEX_PATH {
                return Err(RegistryError::ReservedPath(path));
            }
            if streams.contains_key(&path) {
                return Err(RegistryError::DuplicatePath(path));
            }

            let entry = StreamEntry::new(path.clone(), placement);
            streams.insert(path.clone(), Arc::new(entry));
            order.push(path);
        }

        tracing::debug!(streams = ?order, "Stream registry built");

        Ok(StreamRegistry { streams, order })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn focus_registry() -> StreamRegistry {
        StreamRegistry::builder()
            .stream_at("/stream.mjpg", Placement::new(800, 600, 0))
            .stream_at("/stream2.mjpg", Placement::new(400, 300, 1))
            .stream_at("/stream3.mjpg", Placement::new(400, 300, 1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup() {
        let registry = focus_registry();

        assert_eq!(registry.stream_count(), 3);
        assert!(registry.get("/stream2.mjpg").is_some());
        assert!(registry.get("/stream4.mjpg").is_none());
        assert!(registry.get("/stream.mjpg?x=1").is_none());
        assert_eq!(
            registry.paths().collect::<Vec<_>>(),
            vec!["/stream.mjpg", "/stream2.mjpg", "/stream3.mjpg"]
        );
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let result = StreamRegistry::builder()
            .stream("/a.mjpg", 10, 10)
            .stream("/a.mjpg", 10, 10)
            .build();

        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicatePath("/a.mjpg".into())
        );
    }

    #[test]
    fn test_reserved_and_invalid_paths_rejected() {
        let reserved = StreamRegistry::builder().stream("/index.html", 1, 1).build();
        assert!(matches!(reserved, Err(RegistryError::ReservedPath(_))));

        let root = StreamRegistry::builder().stream("/", 1, 1).build();
        assert!(matches!(root, Err(RegistryError::ReservedPath(_))));

        let relative = StreamRegistry::builder().stream("stream.mjpg", 1, 1).build();
        assert!(matches!(relative, Err(RegistryError::InvalidPath(_))));

        let spaced = StreamRegistry::builder().stream("/a b", 1, 1).build();
        assert!(matches!(spaced, Err(RegistryError::InvalidPath(_))));

        let wildcard = StreamRegistry::builder().stream("/cam/*rest", 1, 1).build();
        assert!(matches!(wildcard, Err(RegistryError::InvalidPath(_))));

        assert_eq!(
            StreamRegistry::builder().build().unwrap_err(),
            RegistryError::Empty
        );
    }

    #[test]
    fn test_stream_rows_auto_increment() {
        let registry = StreamRegistry::builder()
            .stream("/a.mjpg", 10, 10)
            .stream("/b.mjpg", 10, 10)
            .build()
            .unwrap();

        assert_eq!(registry.get("/a.mjpg").unwrap().placement.row, 0);
        assert_eq!(registry.get("/b.mjpg").unwrap().placement.row, 1);
    }

    #[tokio::test]
    async fn test_slot_shared_with_producer() {
        let registry = focus_registry();
        let producer_slot = registry.slot("/stream3.mjpg").unwrap();

        producer_slot.publish(Bytes::from_static(&[0xFF, 0xD8]));

        let entry = registry.get("/stream3.mjpg").unwrap();
        let (frame, version) = entry.slot().wait_next(0).await.unwrap();
        assert_eq!(version, 1);
        assert_eq!(frame.len(), 2);

        // Other streams are untouched
        assert_eq!(registry.get("/stream2.mjpg").unwrap().slot().version(), 0);
    }

    #[test]
    fn test_subscriber_counting() {
        let registry = focus_registry();

        let entry = registry.get("/stream.mjpg").unwrap();
        let first = entry.subscribe();
        let second = entry.subscribe();

        let stats = registry.get_stream_stats("/stream.mjpg").unwrap();
        assert_eq!(stats.subscriber_count, 2);
        assert_eq!(stats.version, 0);

        drop(first);
        drop(second);

        let stats = registry.get_stream_stats("/stream.mjpg").unwrap();
        assert_eq!(stats.subscriber_count, 0);
    }

    #[tokio::test]
    async fn test_close_all() {
        let registry = focus_registry();
        registry.close_all();

        for entry in registry.entries() {
            assert!(entry.slot().is_closed());
            assert!(entry.slot().wait_next(0).await.is_err());
        }
    }
}
