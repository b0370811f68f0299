//! Local filesystem adapter.
//!
//! Objects are plain files under a root directory; a key `a/b/c` maps to
//! `<root>/a/b/c`. Parent directories are created on write.

mod store;

pub use store::{LocalBlobStore, LocalConfig};
