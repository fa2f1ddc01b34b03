//! Registry of live rooms keyed by room identifier.
//!
//! One `RoomManager` exists per server and is handed to the protocol handler
//! explicitly. Registry shards and room mutexes are always taken in that
//! order (shard, then room) and never the other way around, so sweeps,
//! joins and disconnects cannot deadlock each other.

use super::Room;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// A room behind its own mutual-exclusion domain.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Registry lookups and updates that can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Room ID is required")]
    EmptyRoomId,
    #[error("Room {0} already exists")]
    RoomExists(String),
    #[error("Room {0} not found")]
    RoomNotFound(String),
}

/// Owns every room on the server.
#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: DashMap<String, SharedRoom>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh room under `room_id`.
    ///
    /// # Arguments
    ///
    /// * `room_id` - Client-chosen identifier; must be non-empty
    ///
    /// # Returns
    ///
    /// The new room, or `RegistryError::RoomExists` if the identifier is
    /// taken and `RegistryError::EmptyRoomId` for an empty one.
    ///
    /// # Example
    ///
    /// ```
    /// use game_server::{RegistryError, RoomManager};
    ///
    /// let manager = RoomManager::new();
    /// let room = manager.create_room("lobby")?;
    /// assert_eq!(room.lock().client_count(), 0);
    /// assert_eq!(
    ///     manager.create_room("lobby").unwrap_err(),
    ///     RegistryError::RoomExists("lobby".to_string())
    /// );
    /// # Ok::<(), RegistryError>(())
    /// ```
    pub fn create_room(&self, room_id: &str) -> Result<SharedRoom, RegistryError> {
        if room_id.is_empty() {
            return Err(RegistryError::EmptyRoomId);
        }
        match self.rooms.entry(room_id.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::RoomExists(room_id.to_string())),
            Entry::Vacant(vacant) => {
                let room = Arc::new(Mutex::new(Room::new(room_id)));
                vacant.insert(room.clone());
                info!("🏠 Room {} created", room_id);
                Ok(room)
            }
        }
    }

    pub fn get_room(&self, room_id: &str) -> Result<SharedRoom, RegistryError> {
        if room_id.is_empty() {
            return Err(RegistryError::EmptyRoomId);
        }
        self.rooms
            .get(room_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::RoomNotFound(room_id.to_string()))
    }

    /// Unregisters a room regardless of occupancy.
    pub fn remove_room(&self, room_id: &str) -> Result<(), RegistryError> {
        if room_id.is_empty() {
            return Err(RegistryError::EmptyRoomId);
        }
        let (_, room) = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RegistryError::RoomNotFound(room_id.to_string()))?;
        room.lock().retire();
        info!("🗑️ Room {} removed", room_id);
        Ok(())
    }

    /// Unregisters `room_id` only if nobody is seated in it.
    ///
    /// The occupancy check and the removal are one atomic step, so a peer
    /// that joined in the meantime keeps its room.
    ///
    /// # Returns
    ///
    /// `true` if the room existed, was empty and is now gone.
    pub fn remove_room_if_empty(&self, room_id: &str) -> bool {
        let removed = self
            .rooms
            .remove_if(room_id, |_, room| retire_if_empty(room))
            .is_some();
        if removed {
            info!("🗑️ Room {} removed", room_id);
        }
        removed
    }

    /// Removes every room with zero occupants and returns how many went.
    ///
    /// Idempotent; safe to run after every disconnect.
    ///
    /// # Example
    ///
    /// ```
    /// use game_server::RoomManager;
    ///
    /// let manager = RoomManager::new();
    /// manager.create_room("a").unwrap();
    /// manager.create_room("b").unwrap();
    ///
    /// assert_eq!(manager.clean_empty_rooms(), 2);
    /// assert_eq!(manager.clean_empty_rooms(), 0);
    /// assert_eq!(manager.room_count(), 0);
    /// ```
    pub fn clean_empty_rooms(&self) -> usize {
        let mut removed = 0;
        self.rooms.retain(|room_id, room| {
            if retire_if_empty(room) {
                debug!("🧹 Swept empty room {}", room_id);
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_ids(&self) -> Vec<String> {
        self.rooms.iter().map(|entry| entry.key().clone()).collect()
    }
}

fn retire_if_empty(room: &SharedRoom) -> bool {
    let mut room = room.lock();
    if room.client_count() == 0 {
        room.retire();
        true
    } else {
        false
    }
}
