//! Product catalog backed by an in-memory document store.
//!
//! Records are opaque JSON documents keyed by id; the store assigns a UUID
//! when a record arrives without one.

pub mod store;

pub use store::{DocumentStore, Product};
