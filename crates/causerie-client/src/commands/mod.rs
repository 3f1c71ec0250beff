//! Commands exposed by [`crate::ActionFacade`].
//!
//! Each sub-module adds one `impl ActionFacade` block for a group of related
//! commands.

pub mod channels;
pub mod navigation;
pub mod refresh;

pub use refresh::RefreshCompletion;
