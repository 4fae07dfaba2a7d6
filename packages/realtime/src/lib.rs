//! Real-time notification bus for shop dashboards.
//!
//! Shops subscribe to their own room and receive lifecycle events published
//! after the corresponding store mutation committed. Delivery is
//! fire-and-forget: the repository stays the source of truth and subscribers
//! treat the stream as a hint to re-fetch, not as authoritative state.

mod bus;
mod rooms;

pub use bus::{Connection, Handshake, NotificationBus, RealtimeConfig, RealtimeError};
pub use rooms::RoomRegistry;
