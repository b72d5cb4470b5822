use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use brickwire_codec::Command as Request;
use brickwire_device::{ButtonId, ChangeCallback, PollerConfig};

use crate::cmd::{parse_duration, ButtonsArgs, Session};
use crate::exit::{device_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};

#[derive(Debug, Serialize)]
struct ButtonEvent {
    button: ButtonId,
    pressed: bool,
}

impl Record for ButtonEvent {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("button", self.button.to_string()),
            ("pressed", self.pressed.to_string()),
        ]
    }
}

pub fn run(args: ButtonsArgs, session: &Session, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let buttons = session.brick().buttons();

    if !session.is_live() {
        let request =
            Request::direct().add_components(buttons.iter().map(|button| button.pressed_component()));
        return session.preview(request, format);
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("failed to install signal handler: {err}")))?;

    let (events, received) = mpsc::channel::<ButtonEvent>();
    let callback: ChangeCallback = Arc::new(move |button, pressed| {
        let _ = events.send(ButtonEvent { button, pressed });
    });
    for button in &buttons {
        button.set_on_changed(Some(Arc::clone(&callback)));
    }
    drop(callback);

    let poller = session
        .brick()
        .poll_buttons(PollerConfig {
            interval,
            stop_on_error: true,
        })
        .map_err(|err| device_error("failed to start button poller", err))?;
    info!(interval = ?interval, "watching buttons");

    let mut seen = 0usize;
    while running.load(Ordering::SeqCst) && args.count.is_none_or(|limit| seen < limit) {
        match received.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => {
                print_record(&event, format);
                seen += 1;
            }
            Err(RecvTimeoutError::Timeout) => {
                if !poller.is_running() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    poller
        .join()
        .map_err(|err| device_error("button polling failed", err))?;
    for button in &buttons {
        button.set_on_changed(None);
    }
    Ok(SUCCESS)
}
