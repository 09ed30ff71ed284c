//! Release tag selection
//!
//! - `semver`: Go-style semantic versions (`v` prefix, shorthand forms)
//! - `skip_tags`: per-repository tags that must never be synced
//! - `filter`: the tag filter behind `release-tags`

pub mod filter;
pub mod semver;
pub mod skip_tags;
