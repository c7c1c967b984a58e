//! Process-wide table of document rooms.
//!
//! Rooms live in a sharded [`DashMap`], so joins, leaves and broadcasts for one
//! document are serialized on that document's entry while unrelated documents
//! proceed in parallel. No `.await` happens while an entry is locked.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::session::{DeliveryError, Frame, SessionHandle};
use crate::models::{PresenceUser, RoomDiagnostics};

/// Live members of one document.
#[derive(Debug, Default)]
struct Room {
    members: HashMap<Uuid, SessionHandle>,
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spread rooms over at least `shards` locks, rounded up to a power of two.
    ///
    /// Two documents only contend when they hash to the same shard, so this
    /// should be sized near the expected number of concurrently open rooms.
    pub fn with_shard_amount(shards: usize) -> Self {
        let shards = shards.max(2).next_power_of_two();
        Self {
            rooms: DashMap::with_shard_amount(shards),
        }
    }

    /// Add `session` to the room for `document_id`, creating the room on first join.
    pub fn join(&self, document_id: &str, session: SessionHandle) {
        let mut room = self.rooms.entry(document_id.to_string()).or_default();
        room.members.insert(session.id(), session);
        debug!("Room {} now has {} member(s)", document_id, room.members.len());
    }

    /// Remove a session. The room is dropped as soon as it is empty.
    ///
    /// Returns the identity of the removed session, or `None` if it was not a member.
    pub fn leave(&self, document_id: &str, session_id: Uuid) -> Option<PresenceUser> {
        match self.rooms.entry(document_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let removed = entry.get_mut().members.remove(&session_id)?;
                if entry.get().members.is_empty() {
                    entry.remove();
                    info!("Room {} closed", document_id);
                }
                Some(removed.user())
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Queue `frame` for every member of the room except `exclude`.
    ///
    /// Each peer is handled independently. A peer whose queue is full is
    /// evicted and skipped; a peer whose queue is closed is already tearing
    /// itself down and is skipped.
    pub fn broadcast(&self, document_id: &str, frame: &str, exclude: Option<Uuid>) {
        let Some(room) = self.rooms.get(document_id) else {
            return;
        };

        let frame: Frame = Arc::from(frame);
        let mut delivered = 0usize;
        for (id, session) in room.members.iter() {
            if Some(*id) == exclude {
                continue;
            }
            match session.deliver(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e @ DeliveryError::QueueFull(_)) => {
                    warn!("{} in room {}, evicting {}", e, document_id, session.identity());
                    session.evict();
                }
                Err(e @ DeliveryError::Closed(_)) => {
                    debug!("Skipping peer in room {}: {}", document_id, e);
                }
            }
        }
        debug!("Broadcast in room {} reached {} peer(s)", document_id, delivered);
    }

    pub fn member_count(&self, document_id: &str) -> usize {
        self.rooms
            .get(document_id)
            .map_or(0, |room| room.members.len())
    }

    pub fn contains(&self, document_id: &str, session_id: Uuid) -> bool {
        self.rooms
            .get(document_id)
            .is_some_and(|room| room.members.contains_key(&session_id))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.rooms.iter().map(|room| room.members.len()).sum()
    }

    /// Per-room member counts, sorted by document id.
    pub fn snapshot(&self) -> Vec<RoomDiagnostics> {
        let mut rooms: Vec<RoomDiagnostics> = self
            .rooms
            .iter()
            .map(|room| RoomDiagnostics {
                document_id: room.key().clone(),
                n_members: room.members.len() as u32,
            })
            .collect();
        rooms.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        rooms
    }
}
