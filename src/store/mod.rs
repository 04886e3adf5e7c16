//! Document-store backends for the persistence gateway.

mod jsonl;

pub use jsonl::JsonlStore;
