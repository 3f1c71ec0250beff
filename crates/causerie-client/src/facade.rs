//! The command surface the rendering layer talks to.
//!
//! [`ActionFacade`] owns the projector and the pagination controller and
//! holds handles to the stores.  The commands themselves live in
//! [`crate::commands`], grouped by domain.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast;

use causerie_shared::{CauserieError, ChannelId, MessageId, TransportError};
use causerie_store::NotificationState;

use crate::pagination::{PageCursor, PageStatus, PaginationController};
use crate::ports::{ChannelTransport, Router};
use crate::projector::{ChannelListProjector, Projection, SectionLimits};
use crate::state::ClientState;

/// Capacity of the ack failure channel; slow listeners miss old failures.
const ACK_FAILURE_BUFFER: usize = 16;

/// A read acknowledgement that failed after navigation already happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckFailure {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub error: TransportError,
}

pub struct ActionFacade<T> {
    pub(crate) state: ClientState,
    pub(crate) projector: ChannelListProjector,
    pub(crate) pagination: PaginationController<T>,
    pub(crate) transport: Arc<T>,
    pub(crate) router: Arc<dyn Router>,
    pub(crate) ack_failures: broadcast::Sender<AckFailure>,
    /// Runtime that background acks are spawned on.
    pub(crate) runtime: Option<Handle>,
}

impl<T: ChannelTransport> ActionFacade<T> {
    /// Build the facade.  When called inside a tokio runtime, that runtime
    /// is used for background acks; otherwise see
    /// [`ActionFacade::with_runtime`].
    pub fn new(
        state: ClientState,
        transport: Arc<T>,
        router: Arc<dyn Router>,
        limits: SectionLimits,
    ) -> Self {
        let projector = ChannelListProjector::new(state.channels.clone(), state.pins.clone(), limits);
        let pagination = PaginationController::new(Arc::clone(&transport), state.channels.clone());
        let (ack_failures, _rx) = broadcast::channel(ACK_FAILURE_BUFFER);

        Self {
            state,
            projector,
            pagination,
            transport,
            router,
            ack_failures,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Spawn background acks on `runtime`, for callers living on a thread
    /// that is not driven by tokio.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    // ------------------------------------------------------------------
    // Read models
    // ------------------------------------------------------------------

    /// Projection reflecting every mutation applied so far.
    pub fn projection(&self) -> Result<Arc<Projection>, CauserieError> {
        self.projector.current()
    }

    pub fn notification_state(&self) -> NotificationState {
        self.state.notifications.state()
    }

    pub fn page_cursor(&self) -> PageCursor {
        self.pagination.cursor()
    }

    pub fn page_status(&self) -> PageStatus {
        self.pagination.status()
    }

    /// Each cursor status change, including `Success` and `Failed`.
    pub fn page_transitions(&self) -> broadcast::Receiver<PageStatus> {
        self.pagination.transitions()
    }

    /// Failures of fire-and-forget acks issued by `open_channel`.
    pub fn ack_failures(&self) -> broadcast::Receiver<AckFailure> {
        self.ack_failures.subscribe()
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn pagination(&self) -> &PaginationController<T> {
        &self.pagination
    }

    /// Stop applying results of requests still in flight.
    pub fn dispose(&self) {
        self.pagination.dispose();
    }

    pub(crate) fn require_channel(&self, id: &ChannelId) -> Result<(), CauserieError> {
        if self.state.channels.snapshot().contains(id) {
            Ok(())
        } else {
            Err(CauserieError::missing_channel(id))
        }
    }
}
