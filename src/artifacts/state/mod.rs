//! Module and global state files
//!
//! - `module_state`: ordered references synced for one module
//! - `global_state`: latest synced reference of every module
//! - `error`: validation failures shared by both

pub mod error;
pub mod global_state;
pub mod module_state;

/// File name of both the module and the global state file
pub const STATE_FILE_NAME: &str = "state.json";
