//! Content-addressed storage types
//!
//! - `digest`: content hashes and their `<type>:<hex>` form
//! - `file_node`: a single `(path, digest)` manifest entry
//! - `manifest`: path-sorted snapshot of a file tree
//! - `blob`: raw contents, blob sets and file sets

pub mod blob;
pub mod digest;
pub mod file_node;
pub mod manifest;
