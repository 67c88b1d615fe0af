pub mod auth;
pub mod devices;
pub mod login_attempts;
pub mod remote;
pub mod session;
