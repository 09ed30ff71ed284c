//! Porcelain commands (sync pipeline steps)
//!
//! ## Commands
//!
//! - `release-tags`: list the upstream release tags still to sync
//! - `release`: publish a release of the modules changed since the latest one
//! - `comment-pr-casdiff`: comment casdiff reports on a pull request

pub mod comment_pr;
pub mod release;
pub mod release_tags;
