//! Shared value types used by every layer of the engine core.
//!
//! # Invariants
//! - Id `0` is never a live entity or mesh; it is the `INVALID` sentinel of both.

mod types;

pub use types::{Entity, MeshHandle, Transform};

pub fn crate_info() -> &'static str {
    "dreivy-common v0.1.0"
}
