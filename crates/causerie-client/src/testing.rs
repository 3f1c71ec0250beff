//! Fakes for the collaborator ports, shared by the unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, Semaphore};

use causerie_shared::{ChannelId, GroupId, MessageId, TransportError};
use causerie_store::ChannelPage;

use crate::ports::{ChannelTransport, Route, Router};

/// Ordered record of calls across the fakes, e.g. `"ack:m1"`,
/// `"navigate:/channel"`.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Keeps fetches parked until [`FetchGate::release`] is called.
pub struct FetchGate(Arc<Semaphore>);

impl FetchGate {
    pub fn release(&self) {
        self.0.close();
    }
}

#[derive(Default)]
pub struct FakeTransport {
    pages: Mutex<VecDeque<Result<ChannelPage, TransportError>>>,
    fetched: Mutex<Vec<u32>>,
    joins: Mutex<Vec<(ChannelId, GroupId)>>,
    join_results: Mutex<VecDeque<Result<(), TransportError>>>,
    ack_results: Mutex<VecDeque<Result<(), TransportError>>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    fetch_started: Notify,
    log: CallLog,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn push_page(&self, result: Result<ChannelPage, TransportError>) {
        self.pages.lock().unwrap().push_back(result);
    }

    pub fn push_join(&self, result: Result<(), TransportError>) {
        self.join_results.lock().unwrap().push_back(result);
    }

    pub fn push_ack(&self, result: Result<(), TransportError>) {
        self.ack_results.lock().unwrap().push_back(result);
    }

    pub fn hold_fetches(&self) -> FetchGate {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(semaphore.clone());
        FetchGate(semaphore)
    }

    /// Resolves once a fetch has been issued.
    pub async fn wait_for_fetch(&self) {
        self.fetch_started.notified().await;
    }

    pub fn fetched_pages(&self) -> Vec<u32> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn joins(&self) -> Vec<(ChannelId, GroupId)> {
        self.joins.lock().unwrap().clone()
    }

    pub fn acks(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|entry| entry.strip_prefix("ack:").map(str::to_string))
            .collect()
    }
}

impl ChannelTransport for FakeTransport {
    fn fetch_channels_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<ChannelPage, TransportError>> + Send {
        self.fetched.lock().unwrap().push(page);
        let result = self
            .pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChannelPage::default()));
        let gate = self.gate.lock().unwrap().clone();
        self.fetch_started.notify_one();

        async move {
            if let Some(gate) = gate {
                // Closed semaphore means released.
                let _ = gate.acquire().await;
            }
            result
        }
    }

    fn join_channel(
        &self,
        channel_id: ChannelId,
        group_id: GroupId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.joins.lock().unwrap().push((channel_id, group_id));
        let result = self.join_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        async move { result }
    }

    fn ack_message(
        &self,
        message_id: MessageId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send + 'static {
        self.log.lock().unwrap().push(format!("ack:{message_id}"));
        let result = self.ack_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        async move {
            tokio::task::yield_now().await;
            result
        }
    }
}

#[derive(Default)]
pub struct RecordingRouter {
    routes: Mutex<Vec<Route>>,
    log: CallLog,
}

impl RecordingRouter {
    pub fn with_log(log: CallLog) -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            log,
        }
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Router for RecordingRouter {
    fn navigate(&self, route: Route) {
        self.log
            .lock()
            .unwrap()
            .push(format!("navigate:{}", route.name()));
        self.routes.lock().unwrap().push(route);
    }
}
