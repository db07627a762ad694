//! Command-line arguments
//!
//! `oplay [-volume N] <path>`. The single-dash `-volume` form is accepted
//! and rewritten to `--volume` before clap sees it.

use crate::audio::types::VolumeLevel;
use crate::config::Overrides;
use crate::error::ExitStatus;
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments for oplay
#[derive(Parser, Debug, Clone)]
#[command(name = "oplay")]
#[command(about = "Play a seekable Opus stream to the default audio device")]
#[command(version)]
pub struct Args {
    /// Volume 0-100 (omit for unscaled output)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub volume: Option<i64>,

    /// Output device name
    #[arg(long, env = "OPLAY_DEVICE")]
    pub device: Option<String>,

    /// Frames per device callback to request
    #[arg(long, value_name = "FRAMES", env = "OPLAY_FRAMES")]
    pub frames: Option<u32>,

    /// Lifecycle polling interval in milliseconds
    #[arg(long, value_name = "MS", env = "OPLAY_POLL_MS")]
    pub poll_ms: Option<u64>,

    /// Opus file to play
    pub path: PathBuf,
}

impl Args {
    /// Volume as used by the mixer. No `-volume` means passthrough.
    pub fn volume_level(&self) -> VolumeLevel {
        match self.volume {
            Some(percent) => VolumeLevel::from_percent(percent),
            None => VolumeLevel::Passthrough,
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            device: self.device.clone(),
            frames: self.frames,
            poll_ms: self.poll_ms,
        }
    }
}

/// Rewrite `-volume` (and `-volume=N`) to its double-dash form.
pub fn normalize_args<I, T>(argv: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    argv.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            match arg.to_str() {
                Some("-volume") => OsString::from("--volume"),
                Some(s) if s.starts_with("-volume=") => OsString::from(format!("-{}", s)),
                _ => arg,
            }
        })
        .collect()
}

/// Parse a full argv (program name first).
pub fn parse_args<I, T>(argv: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    Args::try_parse_from(normalize_args(argv))
}

/// Exit status for a parse failure: help and version are not errors.
pub fn parse_error_status(error: &clap::Error) -> ExitStatus {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitStatus::Success,
        _ => ExitStatus::Usage,
    }
}
