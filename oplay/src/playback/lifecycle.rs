//! Lifecycle polling loop
//!
//! Runs on the main task while the audio callback plays. Every tick it logs
//! whatever the callback reported and checks the termination flag; a quit
//! signal short-circuits the session to `Terminating`.

use crate::error::ExitStatus;
use crate::playback::events::{EventConsumer, PlaybackEvent};
use crate::playback::state::{PlaybackStatus, TerminationCause};
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Default interval between termination checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    DecodeFault,
    Quit,
}

impl StopReason {
    pub fn exit_status(self) -> ExitStatus {
        match self {
            StopReason::Completed | StopReason::Quit => ExitStatus::Success,
            StopReason::DecodeFault => ExitStatus::Stream,
        }
    }
}

impl From<Option<TerminationCause>> for StopReason {
    fn from(cause: Option<TerminationCause>) -> Self {
        match cause {
            Some(TerminationCause::DecodeFault) => StopReason::DecodeFault,
            Some(TerminationCause::Quit) => StopReason::Quit,
            Some(TerminationCause::Completed) | None => StopReason::Completed,
        }
    }
}

/// Poll until the session terminates or `quit` resolves.
///
/// # Arguments
/// - `status`: shared status written by the audio callback
/// - `events`: consumer half of the callback event channel
/// - `poll_interval`: sleep between checks
/// - `quit`: resolves on an external quit request
///
/// The caller pauses the sink after this returns.
pub async fn run_until_stopped<Q>(
    status: &PlaybackStatus,
    events: &mut EventConsumer,
    poll_interval: Duration,
    quit: Q,
) -> StopReason
where
    Q: Future<Output = ()>,
{
    tokio::pin!(quit);
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut quit => {
                if status.request_quit() {
                    info!("Quit requested, stopping playback");
                }
            }
            _ = ticker.tick() => {}
        }

        log_events(events);

        if status.should_terminate() {
            let dropped = events.dropped();
            if dropped > 0 {
                warn!("{} playback events were dropped", dropped);
            }
            let reason = StopReason::from(status.cause());
            debug!(
                "Session ended: {:?} after {} frames",
                reason,
                status.frames_delivered()
            );
            return reason;
        }
    }
}

fn log_events(events: &mut EventConsumer) {
    while let Some(event) = events.pop() {
        match event {
            PlaybackEvent::EndOfStream { total_frames } => {
                debug!("End of stream reached at frame {}", total_frames);
            }
            PlaybackEvent::Drained { frames_delivered } => {
                info!("Playback finished ({} frames delivered)", frames_delivered);
            }
            PlaybackEvent::DecodeFault { position, error } => {
                error!("Decode error at frame {}: {}", position, error);
            }
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed that signal is never reported.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
