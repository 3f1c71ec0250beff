//! Channel list screen of the Causerie messenger.
//!
//! The rendering layer mounts a [`MessengerScreen`], reads
//! [`Projection`]s from its [`ActionFacade`] and forwards user intents to
//! the facade's commands.  Network, routing and the notification feed are
//! reached through the traits in [`ports`].

pub mod commands;
pub mod config;
pub mod events;
pub mod facade;
pub mod pagination;
pub mod ports;
pub mod projector;
pub mod screen;
pub mod state;

#[cfg(test)]
mod testing;

use tracing_subscriber::{fmt, EnvFilter};

pub use commands::RefreshCompletion;
pub use config::ClientConfig;
pub use events::{LocalBus, Subscription};
pub use facade::{AckFailure, ActionFacade};
pub use pagination::{FetchKind, FetchOutcome, PageCursor, PageStatus, PaginationController};
pub use ports::{ChannelTransport, NotificationBus, Route, Router, SubscriptionId};
pub use projector::{ChannelListProjector, Projection, SectionLayout, SectionLimits};
pub use screen::MessengerScreen;
pub use state::ClientState;

/// Install the global `tracing` subscriber.  `RUST_LOG` wins over
/// `config.log_filter`.  Does nothing if a subscriber is already set.
pub fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
