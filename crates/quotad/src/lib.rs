//! Top-level facade crate for quotad.
//!
//! Re-exports the engine and the server library so users can depend on a
//! single crate.

pub mod core {
    pub use quotad_core::*;
}

pub mod server {
    pub use quotad_server::*;
}
