//! Central place for metric keys.

pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_DISCONNECTION: &str = "ws.disconnection";
pub const WS_ACTIVE: &str = "ws.active";
pub const ROOM_CREATED: &str = "room.created";
pub const ROOM_EVICTED: &str = "room.evicted";
pub const ROOM_DESTROYED: &str = "room.destroyed";
pub const ROOM_ACTIVE: &str = "room.active";
pub const ROOM_COMMANDS: &str = "room.commands";
pub const ROOM_SNAPSHOTS: &str = "room.snapshots";
