//! Channel list projection.
//!
//! Turns channel and pin snapshots into the render-ready model of the
//! messenger screen: joined channels (pinned first, most recently active
//! first), a channel → last message lookup used for read acks, and the
//! popular / discoverable slices of public channels.
//!
//! [`project`] is a pure function.  [`ChannelListProjector`] wraps it with a
//! cache keyed by store versions so repeated reads between mutations are free.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::debug;

use causerie_shared::constants::{DISCOVER_CHANNEL_LIMIT, POPULAR_CHANNEL_LIMIT};
use causerie_shared::{CauserieError, ChannelId, MessageId};
use causerie_store::{ChannelRecord, ChannelStore, PinStore};

/// Caps applied to the public channel sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLimits {
    pub popular: usize,
    pub discover: usize,
}

impl Default for SectionLimits {
    fn default() -> Self {
        Self {
            popular: POPULAR_CHANNEL_LIMIT,
            discover: DISCOVER_CHANNEL_LIMIT,
        }
    }
}

/// Render-ready view of the channel list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Joined channels: pinned first, then by last activity, newest first.
    pub ordered_joined: Vec<ChannelId>,
    /// How many leading entries of `ordered_joined` are pinned.
    pub pinned_count: usize,
    /// Last message per joined channel, for channels that have one.
    pub last_message_of: HashMap<ChannelId, MessageId>,
    pub popular: Vec<ChannelId>,
    pub discoverable: Vec<ChannelId>,
}

impl Projection {
    pub fn has_joined(&self) -> bool {
        !self.ordered_joined.is_empty()
    }

    pub fn last_message_for(&self, id: &ChannelId) -> Option<&MessageId> {
        self.last_message_of.get(id)
    }

    /// Row and header layout of the two-section list.
    pub fn layout(&self) -> SectionLayout {
        let has_joined = self.has_joined();
        SectionLayout {
            // Without joined channels the first section is a single row
            // holding the popular strip.
            joined_rows: if has_joined {
                self.ordered_joined.len()
            } else {
                1
            },
            shows_popular_strip: !has_joined,
            discover_rows: self.discoverable.len(),
            discover_header: (!self.discoverable.is_empty()).then_some(DiscoverHeader {
                show_view_all: has_joined,
            }),
        }
    }
}

/// Shape of the messenger list: section 0 holds joined channels (or the
/// popular strip), section 1 the discoverable channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLayout {
    pub joined_rows: usize,
    pub shows_popular_strip: bool,
    pub discover_rows: usize,
    /// `None` when there is nothing to discover.
    pub discover_header: Option<DiscoverHeader>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverHeader {
    /// "View all" link to the discovery screen.
    pub show_view_all: bool,
}

/// Compute the projection with the default section caps.
///
/// Fails with [`CauserieError::InconsistentState`] when an id in `joined_ids`
/// or `public_ids` has no record, when a listed joined id is not actually
/// joined, or when `joined_ids` repeats an id.
pub fn project(
    channels: &HashMap<ChannelId, ChannelRecord>,
    pins: &HashMap<ChannelId, bool>,
    joined_ids: &[ChannelId],
    public_ids: &[ChannelId],
) -> Result<Projection, CauserieError> {
    project_with_limits(channels, pins, joined_ids, public_ids, SectionLimits::default())
}

pub fn project_with_limits(
    channels: &HashMap<ChannelId, ChannelRecord>,
    pins: &HashMap<ChannelId, bool>,
    joined_ids: &[ChannelId],
    public_ids: &[ChannelId],
    limits: SectionLimits,
) -> Result<Projection, CauserieError> {
    struct Resolved<'a> {
        record: &'a ChannelRecord,
        is_top: bool,
    }

    let mut seen = HashSet::with_capacity(joined_ids.len());
    let mut joined = Vec::with_capacity(joined_ids.len());
    for id in joined_ids {
        let record = channels
            .get(id)
            .ok_or_else(|| CauserieError::missing_channel(id))?;
        if !record.is_joined() {
            return Err(CauserieError::InconsistentState(format!(
                "channel {id} listed as joined but has status {:?}",
                record.join_status
            )));
        }
        if !seen.insert(id) {
            return Err(CauserieError::InconsistentState(format!(
                "channel {id} listed twice as joined"
            )));
        }
        joined.push(Resolved {
            record,
            is_top: pins.get(id).copied().unwrap_or(false),
        });
    }

    for id in public_ids {
        if !channels.contains_key(id) {
            return Err(CauserieError::missing_channel(id));
        }
    }

    // `sort_by` is stable: equal keys keep their joined-list order.
    joined.sort_by(|a, b| {
        b.is_top
            .cmp(&a.is_top)
            .then_with(|| newest_first(a.record.last_activity(), b.record.last_activity()))
    });

    let mut last_message_of = HashMap::new();
    for entry in &joined {
        if let Some(message_id) = entry.record.last_message_id() {
            last_message_of
                .entry(entry.record.id.clone())
                .or_insert_with(|| message_id.clone());
        }
    }

    let pinned_count = joined.iter().take_while(|entry| entry.is_top).count();
    let ordered_joined: Vec<ChannelId> = joined.iter().map(|e| e.record.id.clone()).collect();

    let popular_take = if public_ids.is_empty() {
        public_ids.len()
    } else {
        limits.popular
    };
    let discover_take = if ordered_joined.is_empty() {
        public_ids.len()
    } else {
        limits.discover
    };

    Ok(Projection {
        ordered_joined,
        pinned_count,
        last_message_of,
        popular: public_ids.iter().take(popular_take).cloned().collect(),
        discoverable: public_ids.iter().take(discover_take).cloned().collect(),
    })
}

/// Descending by timestamp; channels without a message go last.
fn newest_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug)]
struct Cached {
    channels_version: u64,
    pins_version: u64,
    projection: Arc<Projection>,
}

/// Projection over live stores, recomputed only when a store version moved.
#[derive(Debug)]
pub struct ChannelListProjector {
    channels: ChannelStore,
    pins: PinStore,
    limits: SectionLimits,
    cache: Mutex<Option<Cached>>,
}

impl ChannelListProjector {
    pub fn new(channels: ChannelStore, pins: PinStore, limits: SectionLimits) -> Self {
        Self {
            channels,
            pins,
            limits,
            cache: Mutex::new(None),
        }
    }

    pub fn limits(&self) -> SectionLimits {
        self.limits
    }

    /// Projection reflecting the latest applied mutations.
    pub fn current(&self) -> Result<Arc<Projection>, CauserieError> {
        let channels = self.channels.snapshot();
        let pins = self.pins.snapshot();

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref() {
            if cached.channels_version == channels.version()
                && cached.pins_version == pins.version()
            {
                return Ok(Arc::clone(&cached.projection));
            }
        }

        let projection = Arc::new(project_with_limits(
            channels.records(),
            pins.pins(),
            channels.joined_ids(),
            channels.public_ids(),
            self.limits,
        )?);

        debug!(
            channels_version = channels.version(),
            pins_version = pins.version(),
            joined = projection.ordered_joined.len(),
            discoverable = projection.discoverable.len(),
            "Recomputed channel list projection"
        );

        *cache = Some(Cached {
            channels_version: channels.version(),
            pins_version: pins.version(),
            projection: Arc::clone(&projection),
        });
        Ok(projection)
    }
}
