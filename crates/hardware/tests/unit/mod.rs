//! # Unit Components
//!
//! Fine-grained tests for every component of the cache model.



/// Unit tests for addresses and packets.
pub mod packet;
