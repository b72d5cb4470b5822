//! Background thread that sends a command on a fixed interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use brickwire_codec::Command;
use brickwire_transport::{Connection, TransportError};

use crate::brick::Brick;
use crate::error::{DeviceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Pause between the end of one tick and the start of the next.
    pub interval: Duration,
    /// End the thread on the first failed tick instead of logging it.
    pub stop_on_error: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            stop_on_error: false,
        }
    }
}

/// Owner of a running poller. Dropping it cancels the thread and waits for it.
#[derive(Debug)]
pub struct PollHandle {
    running: Arc<AtomicBool>,
    wake: Sender<()>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl PollHandle {
    /// Ask the thread to stop after its current tick.
    pub fn cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.wake.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    /// Cancel and wait. Returns the error that ended the thread, if any.
    pub fn join(mut self) -> Result<()> {
        self.cancel();
        self.wait()
    }

    fn wait(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| DeviceError::PollerPanicked)?,
            None => Ok(()),
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
        if let Err(err) = self.wait() {
            debug!(error = %err, "poller ended with error");
        }
    }
}

/// Run `build` and send its command every `config.interval` until cancelled.
///
/// The first tick runs immediately, even if the handle is cancelled before
/// the thread gets going. `build` is called fresh each tick, so
/// components can bind to handles whose state the replies update.
pub fn spawn<C, F>(brick: Brick<C>, config: PollerConfig, mut build: F) -> Result<PollHandle>
where
    C: Connection + 'static,
    F: FnMut() -> Result<Command> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(true));
    let (wake, wakeup) = mpsc::channel::<()>();
    let flag = Arc::clone(&running);

    let thread = thread::Builder::new()
        .name("brickwire-poller".to_string())
        .spawn(move || {
            debug!(interval = ?config.interval, "poller started");
            let outcome = loop {
                if let Err(err) = build().and_then(|command| brick.execute(command)) {
                    if config.stop_on_error {
                        warn!(error = %err, "poll failed, stopping");
                        break Err(err);
                    }
                    warn!(error = %err, "poll failed");
                }

                if !flag.load(Ordering::SeqCst) {
                    break Ok(());
                }
                match wakeup.recv_timeout(config.interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break Ok(()),
                }
            };
            flag.store(false, Ordering::SeqCst);
            debug!("poller stopped");
            outcome
        })
        .map_err(|err| DeviceError::Transport(TransportError::Io(err)))?;

    Ok(PollHandle {
        running,
        wake,
        thread: Some(thread),
    })
}
