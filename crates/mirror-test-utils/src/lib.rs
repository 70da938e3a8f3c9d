//! Shared test fixtures for the directory mirror workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`] : [`tree::TestTree`] temporary directory builder and snapshots
//! - [`pair`] : [`pair::TreePair`] source/replica pair for sync scenarios

pub mod pair;
pub mod tree;

pub use pair::TreePair;
pub use tree::{Snapshot, TestTree};
