//! Memcached-ish ASCII protocol building blocks (transport-agnostic).

pub mod command;
pub mod frame;

pub use command::Command;
pub use frame::{FrameBuffer, MAX_BUFFER};
