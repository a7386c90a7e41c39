//! FFmpeg library setup and log level configuration.
//!
//! FFmpeg has its own internal logging system, separate from the Rust
//! [`log`](https://crates.io/crates/log) crate, and prints warnings straight
//! to stderr. A frame dump over a damaged file can produce one such line per
//! packet, so the binary lowers it to [`FfmpegLogLevel::Error`] while the
//! crate's own diagnostics go through `log`.
//!
//! # Example
//!
//! ```no_run
//! use framedump::FfmpegLogLevel;
//!
//! framedump::set_ffmpeg_log_level(FfmpegLogLevel::Quiet);
//! ```

use ffmpeg_next::util::log::Level;

use crate::error::ExtractError;

/// FFmpeg internal log verbosity level.
///
/// Maps directly to FFmpeg's `AV_LOG_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging messages.
    Debug,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }

    fn from_ffmpeg_level(level: Level) -> Option<Self> {
        match level {
            Level::Quiet => Some(FfmpegLogLevel::Quiet),
            Level::Panic | Level::Fatal => Some(FfmpegLogLevel::Fatal),
            Level::Error => Some(FfmpegLogLevel::Error),
            Level::Warning => Some(FfmpegLogLevel::Warning),
            Level::Info | Level::Verbose => Some(FfmpegLogLevel::Info),
            Level::Debug | Level::Trace => Some(FfmpegLogLevel::Debug),
        }
    }
}

/// Set the FFmpeg internal log verbosity level.
///
/// This controls what FFmpeg prints to stderr. It does **not** affect
/// Rust-side `log` crate output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Get the current FFmpeg internal log verbosity level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .and_then(FfmpegLogLevel::from_ffmpeg_level)
}

/// Initialise the FFmpeg libraries. Safe to call more than once.
pub(crate) fn initialize() -> Result<(), ExtractError> {
    ffmpeg_next::init()
        .map_err(|error| ExtractError::Ffmpeg(format!("FFmpeg initialisation failed: {error}")))
}
