//! # causerie-store
//!
//! In-memory state containers backing the channel list screen.
//!
//! Each store is a single-writer cell: every mutation goes through one
//! `apply_*` entry point that bumps a version counter, and readers take
//! cheap copy-on-write snapshots.  Stores are independent; no operation
//! locks two of them together.

pub mod channels;
pub mod models;
pub mod notifications;
pub mod pins;

mod error;

pub use channels::{ChannelSnapshot, ChannelStore};
pub use error::{Result, StoreError};
pub use models::*;
pub use notifications::{NotificationGate, NotificationSnapshot};
pub use pins::{PinSnapshot, PinStore};
