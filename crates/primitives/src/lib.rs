//! Core types for the object runtime: handles, fixed-size payloads and hook ordering.

/// Opaque identity handles for runtime entities.
pub mod ids;
/// Hook priority bands and pairwise ordering verdicts.
pub mod order;
/// Fixed-size value encoding for symbol payloads.
pub mod payload;

pub use ids::{Atom, ClassId, DomainId, HookPointId, ObjectId, SymbolId, TxId};
pub use order::{Band, Order};
pub use payload::Payload;
