//! Types shared by every Causerie crate: identifiers, constants and the
//! error taxonomy surfaced to the rendering layer.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{CauserieError, TransportError};
pub use types::{ChannelId, GroupId, MessageId};
