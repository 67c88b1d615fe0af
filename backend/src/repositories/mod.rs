#![allow(unused_imports)]

pub mod login_attempt;
pub mod memory;
pub mod session;
pub mod user;

pub use login_attempt::*;
pub use memory::*;
pub use session::*;
pub use user::*;
