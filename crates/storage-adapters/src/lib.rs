//! # Storage Adapters
//!
//! Implementations of the repository and media ports defined in `domains`.

pub mod media;
pub mod memory;

pub use media::InMemoryMediaStorage;
#[cfg(feature = "media-local")]
pub use media::LocalMediaStorage;
pub use memory::InMemoryStore;
