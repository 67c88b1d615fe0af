pub mod control_channel;
pub mod device_registry;
pub mod login_arbitration;
pub mod session_registry;

pub use control_channel::*;
pub use device_registry::*;
pub use login_arbitration::*;
pub use session_registry::*;
