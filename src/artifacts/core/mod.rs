//! Command line plumbing shared by every subcommand
//!
//! - `UsageError`: command lines that parse but cannot run, reported with exit code 2
//! - `required_flags`: presence checks for flags that must be set and non-empty
//! - `init_logging`: the stderr `tracing` subscriber, filtered by `RUST_LOG`

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "modsync=warn";

/// A command line that parsed but cannot be acted upon
///
/// Reported with exit code 2, like clap's own usage errors.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("<from> and <to> cannot be the same")]
    SameFromAndTo,
    #[error("missing required flag(s): {}", .0.join(", "))]
    MissingFlags(Vec<String>),
}

/// Values of flags that must be present and non-empty, in order
///
/// All missing flags are reported together.
pub fn required_flags<const N: usize>(
    flags: [(&str, Option<String>); N],
) -> Result<[String; N], UsageError> {
    let missing = flags
        .iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| format!("--{name}"))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(UsageError::MissingFlags(missing));
    }

    Ok(flags.map(|(_, value)| value.unwrap_or_default()))
}

/// Install the stderr log subscriber, once per process
///
/// Logs never go to stdout, which is reserved for command output.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
            )
            .init();
    });
}
