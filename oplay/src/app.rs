//! Player entry point
//!
//! Wires argument parsing, configuration, the output device, the decoder
//! and the mixer together, waits for the session to end and reports the
//! exit status.

use crate::audio::{AudioOutput, NowPlaying, SymphoniaSource};
use crate::cli;
use crate::config::PlayerConfig;
use crate::error::{ExitStatus, Result};
use crate::playback::events::{event_channel, DEFAULT_EVENT_CAPACITY};
use crate::playback::lifecycle::{run_until_stopped, shutdown_signal};
use crate::playback::{MixerOptions, PlaybackStatus, StopReason, StreamMixer};
use std::ffi::OsString;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Run the player with a full argv (program name first).
///
/// Waits for Ctrl+C or SIGTERM as the quit signal.
pub async fn run<I, T>(argv: I) -> ExitStatus
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    run_with_quit(argv, shutdown_signal()).await
}

/// Same as [`run`] with a caller-supplied quit signal.
pub async fn run_with_quit<I, T, Q>(argv: I, quit: Q) -> ExitStatus
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    Q: Future<Output = ()>,
{
    let args = match cli::parse_args(argv) {
        Ok(args) => args,
        Err(e) => {
            let status = cli::parse_error_status(&e);
            // clap renders usage for us
            let _ = e.print();
            return status;
        }
    };

    match play(args, quit).await {
        Ok(reason) => reason.exit_status(),
        Err(e) => {
            error!("{}", e);
            e.exit_status()
        }
    }
}

async fn play<Q>(args: cli::Args, quit: Q) -> Result<StopReason>
where
    Q: Future<Output = ()>,
{
    let config = PlayerConfig::resolve(args.overrides())?;
    let volume = args.volume_level();
    debug!("Resolved config: {:?}, volume {}", config, volume);

    let mut output = AudioOutput::open(config.device.as_deref(), config.request_frames)?;
    debug!(
        "Output '{}' at {} Hz, {} frames per callback",
        output.device_name(),
        output.sample_rate(),
        output.buffer_frames()
    );

    let source = SymphoniaSource::open(&args.path)?;
    let info = source.info();
    info!("{}", info);

    let now_playing = NowPlaying::from_tags(
        &args.path,
        source.tags().iter().map(|(k, v)| (k.as_str(), v.as_str())),
    );

    let status = Arc::new(PlaybackStatus::new());
    let (producer, mut consumer) = event_channel(DEFAULT_EVENT_CAPACITY);
    let options = MixerOptions {
        volume,
        request_frames: output.buffer_frames() as usize,
        ..Default::default()
    };
    let mut mixer = StreamMixer::new(source, options, Arc::clone(&status), producer)?;

    output.start(move |data: &mut [i16]| mixer.fill(data))?;
    info!("Now playing: {}", now_playing);

    let reason = run_until_stopped(&status, &mut consumer, config.poll_interval, quit).await;

    // No callback may run once the session is marked stopped
    if let Err(e) = output.pause() {
        warn!("{}", e);
    }
    status.mark_stopped();

    let stream_errors = output.error_count();
    if stream_errors > 0 {
        warn!("Audio device reported {} stream errors", stream_errors);
    }
    drop(output);

    Ok(reason)
}
