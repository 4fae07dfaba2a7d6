//! Shop-room membership table.

use std::collections::HashMap;
use std::sync::RwLock;

use print_core::{ShopEvent, ShopId};
use tokio::sync::broadcast;

/// Buffered events per room before slow subscribers start lagging.
const ROOM_CAPACITY: usize = 1024;

/// Registry of per-shop broadcast rooms.
///
/// Join and publish are its only mutators: rooms are created on first join
/// and pruned once the last subscriber is gone.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<ShopId, broadcast::Sender<ShopEvent>>>,
}

impl RoomRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Join a shop's room, creating it if this is the first subscriber.
    pub fn join(&self, shop_id: ShopId) -> broadcast::Receiver<ShopEvent> {
        let mut rooms = self.rooms.write().unwrap();
        rooms
            .entry(shop_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event to a shop's room.
    ///
    /// Returns how many subscribers received it. A room whose last
    /// subscriber disconnected is pruned here.
    pub fn publish(&self, shop_id: ShopId, event: ShopEvent) -> usize {
        let mut rooms = self.rooms.write().unwrap();
        match rooms.get(&shop_id) {
            Some(tx) => match tx.send(event) {
                Ok(delivered) => delivered,
                Err(_) => {
                    rooms.remove(&shop_id);
                    0
                }
            },
            None => 0,
        }
    }

    /// Number of live subscribers in a shop's room.
    pub fn subscriber_count(&self, shop_id: ShopId) -> usize {
        self.rooms
            .read()
            .unwrap()
            .get(&shop_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of rooms currently open.
    pub fn room_count(&self) -> usize {
        self.rooms.read().unwrap().len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
