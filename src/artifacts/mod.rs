//! Data structures and algorithms of the sync pipeline
//!
//! - `cas`: digests, file nodes, manifests and blobs
//! - `core`: shared utilities (logging, usage errors)
//! - `diff`: manifest diffing with rename detection, Myers line diffs and reports
//! - `pr`: digest transitions in pull requests
//! - `release`: release planning and release bodies
//! - `state`: module and global state files
//! - `tags`: release tag filtering and semver ordering

pub mod cas;
pub mod core;
pub mod diff;
pub mod pr;
pub mod release;
pub mod state;
pub mod tags;
