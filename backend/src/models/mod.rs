//! Data models shared across store access, API handlers, and the realtime
//! channel. Wire-facing types serialize with camelCase field names.

pub mod channel;
pub mod device;
pub mod login_attempt;
pub mod session;
pub mod user;
