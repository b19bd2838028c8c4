//! Common test infrastructure
//!
//! Builds a disposable library (on-disk SQLite database, music directory,
//! playlist files) that end-to-end tests drive exactly like the CLI would.

mod fixtures;
mod library;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use fixtures::{write_m3u, write_vdjfolder};
pub use library::TestLibrary;
