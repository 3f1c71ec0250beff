//! Page cursor for the channel fetcher.
//!
//! One fetch at a time.  `refresh` restarts from page 1, `load_more` asks for
//! the page after the cursor.  A failed `load_more` puts the cursor back so
//! the next attempt requests the same page.  Nothing is retried
//! automatically.
//!
//! A fetch holds the cursor through a [`FetchSlot`].  Dropping the fetch
//! future before it settles (timeout, `select!`, aborted task) releases the
//! slot and rolls the cursor back, so the next call is not rejected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use causerie_shared::constants::FIRST_PAGE;
use causerie_shared::CauserieError;
use causerie_store::ChannelStore;

use crate::ports::ChannelTransport;

/// Capacity of the status transition channel.
const TRANSITION_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageStatus {
    Idle,
    Loading,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    /// Page of the last successful (or in-flight) request, 1-based.
    pub page_number: u32,
    pub status: PageStatus,
    /// `Success` or `Failed` for the last fetch that settled.  Stays set
    /// after `status` went back to `Idle`.
    pub last_outcome: Option<PageStatus>,
    /// What the server said about the last fetched page.  Informational
    /// only: `load_more` does not consult it.
    pub has_more: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page_number: FIRST_PAGE,
            status: PageStatus::Idle,
            last_outcome: None,
            has_more: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Pull-to-refresh: start over from page 1.
    Refresh,
    /// Next page.
    LoadMore,
}

/// Result of a fetch that was applied to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub page: u32,
    /// Channels seen for the first time.
    pub added: usize,
    pub has_more: bool,
}

pub struct PaginationController<T> {
    transport: Arc<T>,
    channels: ChannelStore,
    cursor: watch::Sender<PageCursor>,
    transitions: broadcast::Sender<PageStatus>,
    alive: Arc<AtomicBool>,
}

impl<T: ChannelTransport> PaginationController<T> {
    pub fn new(transport: Arc<T>, channels: ChannelStore) -> Self {
        let (cursor, _rx) = watch::channel(PageCursor::default());
        let (transitions, _rx) = broadcast::channel(TRANSITION_BUFFER);
        Self {
            transport,
            channels,
            cursor,
            transitions,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn cursor(&self) -> PageCursor {
        *self.cursor.borrow()
    }

    pub fn status(&self) -> PageStatus {
        self.cursor.borrow().status
    }

    /// Receiver holding the latest cursor.  Intermediate statuses may be
    /// skipped; use [`PaginationController::transitions`] to see each one.
    pub fn subscribe(&self) -> watch::Receiver<PageCursor> {
        self.cursor.subscribe()
    }

    /// Every status change, in order: `Loading`, then `Success` or `Failed`,
    /// then `Idle`.  A cancelled fetch goes straight from `Loading` to `Idle`.
    pub fn transitions(&self) -> broadcast::Receiver<PageStatus> {
        self.transitions.subscribe()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// The owning screen went away; results still in flight get dropped.
    pub fn dispose(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub async fn refresh(&self) -> Result<FetchOutcome, CauserieError> {
        self.fetch(FetchKind::Refresh).await
    }

    pub async fn load_more(&self) -> Result<FetchOutcome, CauserieError> {
        self.fetch(FetchKind::LoadMore).await
    }

    pub async fn fetch(&self, kind: FetchKind) -> Result<FetchOutcome, CauserieError> {
        let slot = self.begin(kind)?;
        let page = slot.page;
        debug!(?kind, page, "Fetching channels");

        let result = self.transport.fetch_channels_page(page).await;

        if !self.is_alive() {
            // Dropping the slot rolls the cursor back.
            warn!(page, "Screen disposed, discarding fetched channels");
            return Err(CauserieError::ScreenDisposed);
        }

        match result {
            Ok(fetched) => {
                let has_more = fetched.has_more;
                let added = self.channels.apply_page(page, fetched.items);
                slot.settle(PageStatus::Success, |c| c.has_more = has_more);
                info!(page, added, has_more, "Channel page loaded");
                Ok(FetchOutcome {
                    page,
                    added,
                    has_more,
                })
            }
            Err(e) => {
                let fallback = slot.fallback;
                slot.settle(PageStatus::Failed, |c| c.page_number = fallback);
                warn!(page, error = %e, "Channel fetch failed");
                Err(e.into())
            }
        }
    }

    /// Claim the single fetch slot and move the cursor.
    fn begin(&self, kind: FetchKind) -> Result<FetchSlot<'_>, CauserieError> {
        let mut claimed = None;
        self.cursor.send_if_modified(|c| {
            if c.status == PageStatus::Loading {
                return false;
            }
            let target = match kind {
                FetchKind::Refresh => FIRST_PAGE,
                FetchKind::LoadMore => c.page_number.saturating_add(1),
            };
            // A refresh resets before the attempt, so 1 is also where a
            // failed refresh leaves the cursor.
            let fallback = match kind {
                FetchKind::Refresh => FIRST_PAGE,
                FetchKind::LoadMore => c.page_number,
            };
            c.page_number = target;
            c.status = PageStatus::Loading;
            claimed = Some((target, fallback));
            true
        });

        match claimed {
            Some((page, fallback)) => {
                let _ = self.transitions.send(PageStatus::Loading);
                Ok(FetchSlot {
                    cursor: &self.cursor,
                    transitions: &self.transitions,
                    page,
                    fallback,
                    armed: true,
                })
            }
            None => {
                debug!(?kind, "Fetch rejected, another one is in flight");
                Err(CauserieError::FetchInProgress)
            }
        }
    }
}

/// Ownership of the `Loading` cursor for one fetch.
///
/// [`FetchSlot::settle`] publishes the outcome.  Dropping an unsettled slot
/// restores the fallback page and `Idle`.
struct FetchSlot<'a> {
    cursor: &'a watch::Sender<PageCursor>,
    transitions: &'a broadcast::Sender<PageStatus>,
    page: u32,
    fallback: u32,
    armed: bool,
}

impl FetchSlot<'_> {
    /// Publish the terminal status, then settle back to idle.
    fn settle(mut self, status: PageStatus, update: impl FnOnce(&mut PageCursor)) {
        self.armed = false;
        self.cursor.send_modify(|c| {
            update(c);
            c.status = status;
            c.last_outcome = Some(status);
        });
        let _ = self.transitions.send(status);
        self.cursor.send_modify(|c| c.status = PageStatus::Idle);
        let _ = self.transitions.send(PageStatus::Idle);
    }
}

impl Drop for FetchSlot<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let fallback = self.fallback;
        self.cursor.send_modify(|c| {
            c.page_number = fallback;
            c.status = PageStatus::Idle;
        });
        let _ = self.transitions.send(PageStatus::Idle);
        debug!(page = self.page, fallback, "Fetch abandoned, cursor released");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::FakeTransport;
    use causerie_shared::TransportError;
    use causerie_store::{ChannelPage, ChannelRecord};

    fn page(ids: &[&str], has_more: bool) -> ChannelPage {
        ChannelPage {
            items: ids
                .iter()
                .map(|id| {
                    let mut r = ChannelRecord::from(*id);
                    r.is_public = true;
                    r
                })
                .collect(),
            has_more,
        }
    }

    fn controller(
        transport: &Arc<FakeTransport>,
    ) -> (PaginationController<FakeTransport>, ChannelStore) {
        let store = ChannelStore::new();
        (PaginationController::new(transport.clone(), store.clone()), store)
    }

    #[tokio::test]
    async fn test_load_more_advances_and_merges() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_page(Ok(page(&["a", "b"], true)));
        transport.push_page(Ok(page(&["c"], false)));
        let (pager, store) = controller(&transport);

        let first = pager.refresh().await.unwrap();
        assert_eq!(first.page, 1);
        let second = pager.load_more().await.unwrap();
        assert_eq!(second.page, 2);
        assert!(!second.has_more);

        assert_eq!(transport.fetched_pages(), vec![1, 2]);
        assert_eq!(store.snapshot().public_ids().len(), 3);
        assert_eq!(pager.cursor().page_number, 2);
        assert_eq!(pager.status(), PageStatus::Idle);
    }

    #[tokio::test]
    async fn test_failed_load_more_keeps_page_for_retry() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_page(Ok(page(&["a"], true)));
        transport.push_page(Err(TransportError::Timeout));
        transport.push_page(Ok(page(&["b"], true)));
        let (pager, _store) = controller(&transport);

        pager.refresh().await.unwrap();
        let err = pager.load_more().await.unwrap_err();
        assert_eq!(err, CauserieError::Transport(TransportError::Timeout));
        assert_eq!(pager.cursor().page_number, 1);
        assert_eq!(pager.status(), PageStatus::Idle);

        pager.load_more().await.unwrap();
        assert_eq!(transport.fetched_pages(), vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_refresh_resets_after_failures_deep_in_the_list() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_page(Ok(page(&["a"], true)));
        transport.push_page(Ok(page(&["b"], true)));
        transport.push_page(Ok(page(&["c"], true)));
        transport.push_page(Err(TransportError::Network("offline".into())));
        transport.push_page(Ok(page(&["a"], true)));
        let (pager, _store) = controller(&transport);

        pager.refresh().await.unwrap();
        pager.load_more().await.unwrap();
        pager.load_more().await.unwrap();
        assert!(pager.load_more().await.is_err());
        assert_eq!(pager.cursor().page_number, 3);

        pager.refresh().await.unwrap();
        assert_eq!(pager.cursor().page_number, 1);
        assert_eq!(transport.fetched_pages(), vec![1, 2, 3, 4, 1]);
    }

    #[tokio::test]
    async fn test_load_more_ignores_has_more() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_page(Ok(page(&["a"], false)));
        transport.push_page(Ok(page(&[], false)));
        let (pager, _store) = controller(&transport);

        pager.load_more().await.unwrap();
        assert!(!pager.cursor().has_more);
        pager.load_more().await.unwrap();

        assert_eq!(transport.fetched_pages(), vec![2, 3]);
        assert_eq!(pager.cursor().page_number, 3);
    }

    #[tokio::test]
    async fn test_reentrant_fetch_is_rejected() {
        let transport = Arc::new(FakeTransport::new());
        let gate = transport.hold_fetches();
        transport.push_page(Ok(page(&["a"], true)));
        let store = ChannelStore::new();
        let pager = Arc::new(PaginationController::new(transport.clone(), store));

        let in_flight = {
            let pager = pager.clone();
            tokio::spawn(async move { pager.load_more().await })
        };
        transport.wait_for_fetch().await;
        assert_eq!(pager.status(), PageStatus::Loading);
        let page_during = pager.cursor().page_number;
        assert_eq!(page_during, 2);

        assert_eq!(pager.refresh().await, Err(CauserieError::FetchInProgress));
        assert_eq!(pager.load_more().await, Err(CauserieError::FetchInProgress));
        assert_eq!(pager.cursor().page_number, page_during);

        gate.release();
        in_flight.await.unwrap().unwrap();
        assert_eq!(pager.status(), PageStatus::Idle);
    }

    #[tokio::test]
    async fn test_disposed_controller_discards_late_results() {
        let transport = Arc::new(FakeTransport::new());
        let gate = transport.hold_fetches();
        transport.push_page(Ok(page(&["late"], true)));
        let store = ChannelStore::new();
        let pager = Arc::new(PaginationController::new(transport.clone(), store.clone()));

        let in_flight = {
            let pager = pager.clone();
            tokio::spawn(async move { pager.refresh().await })
        };
        transport.wait_for_fetch().await;
        pager.dispose();
        gate.release();

        assert_eq!(in_flight.await.unwrap(), Err(CauserieError::ScreenDisposed));
        assert!(store.snapshot().is_empty());
    }

    fn drain(rx: &mut broadcast::Receiver<PageStatus>) -> Vec<PageStatus> {
        let mut seen = Vec::new();
        while let Ok(status) = rx.try_recv() {
            seen.push(status);
        }
        seen
    }

    #[tokio::test]
    async fn test_status_transitions_are_published() {
        let transport = Arc::new(FakeTransport::new());
        transport.push_page(Err(TransportError::Rejected("503".into())));
        transport.push_page(Ok(page(&["a"], true)));
        let (pager, _store) = controller(&transport);
        let rx = pager.subscribe();
        let mut transitions = pager.transitions();

        assert!(pager.refresh().await.is_err());
        assert_eq!(
            drain(&mut transitions),
            vec![PageStatus::Loading, PageStatus::Failed, PageStatus::Idle]
        );
        assert_eq!(rx.borrow().status, PageStatus::Idle);
        assert_eq!(rx.borrow().last_outcome, Some(PageStatus::Failed));

        pager.refresh().await.unwrap();
        assert_eq!(
            drain(&mut transitions),
            vec![PageStatus::Loading, PageStatus::Success, PageStatus::Idle]
        );
        assert_eq!(pager.cursor().last_outcome, Some(PageStatus::Success));
    }

    #[tokio::test]
    async fn test_cancelled_fetch_releases_the_cursor() {
        let transport = Arc::new(FakeTransport::new());
        let gate = transport.hold_fetches();
        let (pager, store) = controller(&transport);
        let mut transitions = pager.transitions();

        let timed_out = tokio::time::timeout(Duration::from_millis(20), pager.load_more()).await;
        assert!(timed_out.is_err());

        let cursor = pager.cursor();
        assert_eq!(cursor.status, PageStatus::Idle);
        assert_eq!(cursor.page_number, 1);
        assert_eq!(cursor.last_outcome, None);
        assert_eq!(
            drain(&mut transitions),
            vec![PageStatus::Loading, PageStatus::Idle]
        );

        gate.release();
        transport.push_page(Ok(page(&["a"], true)));
        let outcome = pager.refresh().await.unwrap();
        assert_eq!(outcome.page, 1);
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(transport.fetched_pages(), vec![2, 1]);
    }

    #[test]
    fn test_cursor_json_shape() {
        let value = serde_json::to_value(PageCursor::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "pageNumber": 1,
                "status": "Idle",
                "lastOutcome": null,
                "hasMore": true
            })
        );
    }
}
