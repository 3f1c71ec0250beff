//! Pull-to-refresh and load-more.

use serde::Serialize;
use tracing::debug;

use causerie_shared::CauserieError;

use crate::facade::ActionFacade;
use crate::pagination::FetchKind;
use crate::ports::ChannelTransport;

/// End state for the refresh indicator once a fetch settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshCompletion {
    /// Pull-down finished: show the "completed" header.
    Completed,
    /// Load-more finished: the footer goes back to idle.
    Idle,
    /// The fetch failed; nothing was retried.
    Failed,
}

impl<T: ChannelTransport> ActionFacade<T> {
    /// Fetch the first page (`is_pull_down`) or the next one.
    ///
    /// Transport failures come back as [`RefreshCompletion::Failed`].  The
    /// `Err` side carries [`CauserieError::FetchInProgress`] for a reentrant
    /// call, [`CauserieError::ScreenDisposed`] for a result that arrived
    /// too late, and invariant violations.
    pub async fn refresh_page(&self, is_pull_down: bool) -> Result<RefreshCompletion, CauserieError> {
        let kind = if is_pull_down {
            FetchKind::Refresh
        } else {
            FetchKind::LoadMore
        };

        match self.pagination.fetch(kind).await {
            Ok(outcome) => {
                debug!(page = outcome.page, added = outcome.added, "Refresh settled");
                Ok(if is_pull_down {
                    RefreshCompletion::Completed
                } else {
                    RefreshCompletion::Idle
                })
            }
            Err(CauserieError::Transport(_)) => Ok(RefreshCompletion::Failed),
            Err(e) => Err(e),
        }
    }
}
