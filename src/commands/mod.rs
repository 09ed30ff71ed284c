//! Command implementations
//!
//! Commands are methods on `Repository` and fall into two groups:
//!
//! - `plumbing`: work on one module directory or source tree (casdiff, diff, mod-process)
//! - `porcelain`: pipeline steps that talk to git, gh or GitHub (release-tags, release,
//!   comment-pr-casdiff)

pub mod plumbing;
pub mod porcelain;
