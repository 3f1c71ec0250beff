//! The channel store: records keyed by id plus the ordered joined and
//! public id lists the projector consumes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use causerie_shared::constants::FIRST_PAGE;
use causerie_shared::ChannelId;

use crate::error::{Result, StoreError};
use crate::models::{ChannelRecord, JoinStatus, LastMessage};

/// Immutable view of the channel store at one version.
///
/// Cloning is cheap: the collections are shared until the next mutation
/// copies them.
#[derive(Debug, Clone, Default)]
pub struct ChannelSnapshot {
    version: u64,
    records: Arc<HashMap<ChannelId, ChannelRecord>>,
    /// Joined channels in the order they became joined.
    joined: Arc<Vec<ChannelId>>,
    /// Public channels in server order.
    public: Arc<Vec<ChannelId>>,
}

impl ChannelSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, id: &ChannelId) -> Option<&ChannelRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.records.contains_key(id)
    }

    pub fn records(&self) -> &HashMap<ChannelId, ChannelRecord> {
        &self.records
    }

    pub fn joined_ids(&self) -> &[ChannelId] {
        &self.joined
    }

    pub fn public_ids(&self) -> &[ChannelId] {
        &self.public
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ------------------------------------------------------------------
    // Mutation helpers (only reachable through ChannelStore)
    // ------------------------------------------------------------------

    /// Insert or overwrite a record.  Returns the previous join status, or
    /// `None` if the id was new.
    fn upsert(&mut self, mut incoming: ChannelRecord) -> Option<JoinStatus> {
        let id = incoming.id.clone();
        let previous = self.records.get(&id).map(|r| r.join_status);

        // A fetch landing mid-join must not drop the spinner.
        if previous.is_some_and(JoinStatus::is_joining) && !incoming.is_joined() {
            incoming.join_status = JoinStatus::Joining;
        }

        let joined = incoming.is_joined();
        Arc::make_mut(&mut self.records).insert(id.clone(), incoming);
        self.sync_joined(&id, previous.is_some_and(JoinStatus::is_joined), joined);
        previous
    }

    fn set_join_status(&mut self, id: &ChannelId, status: JoinStatus) -> Result<JoinStatus> {
        if !self.records.contains_key(id) {
            return Err(StoreError::UnknownChannel(id.clone()));
        }
        let records = Arc::make_mut(&mut self.records);
        let previous = match records.get_mut(id) {
            Some(record) => std::mem::replace(&mut record.join_status, status),
            None => return Err(StoreError::UnknownChannel(id.clone())),
        };
        self.sync_joined(id, previous.is_joined(), status.is_joined());
        Ok(previous)
    }

    /// Keep the joined list in step with a status change.  The list holds
    /// exactly the ids whose record is `Joined`, so only transitions touch it.
    fn sync_joined(&mut self, id: &ChannelId, was_joined: bool, joined: bool) {
        if joined && !was_joined {
            Arc::make_mut(&mut self.joined).push(id.clone());
        } else if !joined && was_joined {
            Arc::make_mut(&mut self.joined).retain(|j| j != id);
        }
    }

    /// Add or remove `id` from the public list, using `listed` as the
    /// membership index of that list.
    fn sync_public(&mut self, listed: &mut HashSet<ChannelId>, id: &ChannelId, is_public: bool) {
        if is_public {
            if listed.insert(id.clone()) {
                Arc::make_mut(&mut self.public).push(id.clone());
            }
        } else if listed.remove(id) {
            Arc::make_mut(&mut self.public).retain(|p| p != id);
        }
    }

    fn public_index(&self) -> HashSet<ChannelId> {
        self.public.iter().cloned().collect()
    }
}

/// Single-writer owner of all channel records.
///
/// Every mutation goes through [`ChannelStore::apply`], which runs under the
/// writer lock, bumps the version and publishes the new snapshot to
/// subscribers.  Handles are cheap to clone and all refer to the same store.
#[derive(Debug, Clone)]
pub struct ChannelStore {
    state: Arc<Mutex<ChannelSnapshot>>,
    cell: Arc<watch::Sender<ChannelSnapshot>>,
}

impl ChannelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ChannelSnapshot::default());
        Self {
            state: Arc::new(Mutex::new(ChannelSnapshot::default())),
            cell: Arc::new(tx),
        }
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self) -> ChannelSnapshot {
        self.cell.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        self.cell.borrow().version
    }

    /// Receiver woken after every applied mutation.
    pub fn subscribe(&self) -> watch::Receiver<ChannelSnapshot> {
        self.cell.subscribe()
    }

    // ------------------------------------------------------------------
    // Fetch results
    // ------------------------------------------------------------------

    /// Merge one fetched page.  Records are upserted by id with server data
    /// winning.  Page 1 restarts the public ordering; later pages append.
    ///
    /// Returns the number of records that were not known before.
    pub fn apply_page(&self, page: u32, items: Vec<ChannelRecord>) -> usize {
        let count = items.len();
        let added = self
            .apply(|s| {
                let mut listed = if page == FIRST_PAGE {
                    Arc::make_mut(&mut s.public).clear();
                    HashSet::with_capacity(items.len())
                } else {
                    s.public_index()
                };
                let mut added = 0;
                for item in items {
                    let id = item.id.clone();
                    let is_public = item.is_public;
                    if s.upsert(item).is_none() {
                        added += 1;
                    }
                    s.sync_public(&mut listed, &id, is_public);
                }
                Ok(added)
            })
            .unwrap_or(0);

        debug!(page, count, added, "Applied channel page");
        added
    }

    /// Insert or overwrite a single record.  Returns `true` if it was new.
    pub fn upsert(&self, record: ChannelRecord) -> bool {
        self.apply(|s| {
            let id = record.id.clone();
            let is_public = record.is_public;
            let is_new = s.upsert(record).is_none();
            let mut listed = s.public_index();
            s.sync_public(&mut listed, &id, is_public);
            Ok(is_new)
        })
        .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Message events
    // ------------------------------------------------------------------

    /// Record a new last message for a channel.
    pub fn apply_message(&self, id: &ChannelId, message: LastMessage) -> Result<()> {
        self.apply(|s| {
            if !s.records.contains_key(id) {
                return Err(StoreError::UnknownChannel(id.clone()));
            }
            if let Some(record) = Arc::make_mut(&mut s.records).get_mut(id) {
                record.last_message = Some(message);
            }
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Optimistic marker set before the join request goes out.  A channel
    /// that is already joined stays joined; returns whether it changed.
    pub fn mark_joining(&self, id: &ChannelId) -> Result<bool> {
        self.apply(|s| {
            let status = s.get(id).map(|r| r.join_status);
            match status {
                None => Err(StoreError::UnknownChannel(id.clone())),
                Some(JoinStatus::Joined) => Ok(false),
                Some(_) => {
                    s.set_join_status(id, JoinStatus::Joining)?;
                    Ok(true)
                }
            }
        })
    }

    /// Join request succeeded.
    pub fn mark_joined(&self, id: &ChannelId) -> Result<()> {
        self.apply(|s| s.set_join_status(id, JoinStatus::Joined).map(|_| ()))?;
        debug!(channel_id = %id, "Channel joined");
        Ok(())
    }

    /// Join request failed: drop the optimistic marker.  A channel that got
    /// joined in the meantime (e.g. by a fetch) is left alone.
    pub fn clear_joining(&self, id: &ChannelId) -> Result<()> {
        self.apply(|s| {
            let status = s.get(id).map(|r| r.join_status);
            match status {
                None => Err(StoreError::UnknownChannel(id.clone())),
                Some(JoinStatus::Joining) => {
                    s.set_join_status(id, JoinStatus::NotJoined).map(|_| ())
                }
                Some(_) => Ok(()),
            }
        })
    }

    /// The user left the channel.  The record is kept for history.
    pub fn apply_leave(&self, id: &ChannelId) -> Result<()> {
        self.apply(|s| s.set_join_status(id, JoinStatus::NotJoined).map(|_| ()))?;
        debug!(channel_id = %id, "Channel left");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Run `op` under the writer lock.  The version is bumped and the
    /// snapshot published only when `op` succeeds; `op` must not mutate on
    /// error.
    fn apply<R>(&self, op: impl FnOnce(&mut ChannelSnapshot) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let result = op(&mut *state)?;
        state.version += 1;
        self.cell.send_replace(state.clone());
        Ok(result)
    }
}

impl Default for ChannelStore {
    fn default() -> Self {
        Self::new()
    }
}
