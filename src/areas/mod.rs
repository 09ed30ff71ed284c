//! Storage and external systems
//!
//! - `blob_store`: content-addressed blob storage (directory or in-memory)
//! - `sync_dir`: the sync root with its module directories and state files
//! - `workspace`: module source trees on disk
//! - `git`, `gh`: the git and GitHub CLIs
//! - `github`: GitHub releases over the REST API
//! - `repository`: the directory a command runs in and its output writer

pub mod blob_store;
pub mod gh;
pub mod git;
pub mod github;
pub mod repository;
pub mod sync_dir;
pub mod workspace;
