//! Built-in plugins exercising the registry and executor end to end.
//!
//! Deliberately small: the concrete shape of a plugin is a Non-goal, these
//! exist only so tests can drive a real plan without a plugin ecosystem.

pub mod command;
pub mod file_presence;
pub mod noop;

pub use command::CommandPlugin;
pub use file_presence::FilePresencePlugin;
pub use noop::NoopPlugin;
