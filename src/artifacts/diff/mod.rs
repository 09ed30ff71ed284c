//! Manifest diffing
//!
//! - `myers`: Myers' shortest edit script
//! - `unified`: unified diff text built from an edit script
//! - `manifest_diff`: path classification with rename detection
//! - `report`: text and markdown rendering of a manifest diff

pub mod manifest_diff;
pub mod myers;
pub mod report;
pub mod unified;
