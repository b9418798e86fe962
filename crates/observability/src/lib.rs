//! Tracing and logging setup shared by the back-office binaries.

/// Initialize process-wide tracing, taking the output format from
/// `BACKOFFICE_LOG_FORMAT` (`json` by default).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use self::tracing::LogFormat;
