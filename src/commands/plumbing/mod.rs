//! Plumbing commands (single module operations)
//!
//! ## Commands
//!
//! - `casdiff` / `diff`: compare two manifests of a module and render the changes
//! - `mod-process`: store a source tree as CAS blobs and record the reference

pub mod casdiff;
pub mod mod_process;
