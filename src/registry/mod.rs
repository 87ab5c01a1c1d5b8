//! Stream registry and frame mailboxes
//!
//! The registry maps URL paths to [`FrameSlot`]s. Producers publish into a
//! slot; every viewer session of that path waits on the same slot.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<StreamRegistry>
//!                     ┌─────────────────────────┐
//!                     │ streams: HashMap<Path,  │
//!                     │   StreamEntry {         │
//!                     │     placement,          │
//!                     │     slot: FrameSlot,    │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Producer]              [Session]               [Session]
//!    slot.publish()          slot.wait_next()        slot.wait_next()
//!         │                       │                       │
//!         └──► latest frame ──────┴──► multipart chunk ──► TCP
//! ```
//!
//! # Zero-Copy Design
//!
//! Frames wrap `bytes::Bytes`, so every session writing the same frame shares
//! one allocation.

pub mod entry;
pub mod error;
pub mod frame;
pub mod slot;
pub mod store;

pub use entry::{Placement, StreamEntry, StreamStats, Subscription};
pub use error::RegistryError;
pub use frame::Frame;
pub use slot::{FrameSlot, SlotError};
pub use store::{StreamRegistry, StreamRegistryBuilder};
