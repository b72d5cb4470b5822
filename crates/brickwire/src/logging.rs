use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Overrides `--log-level` with a full filter directive, e.g.
/// `brickwire_transport=trace,brickwire_device=debug`.
pub const LOG_ENV: &str = "BRICKWIRE_LOG";

const CRATES: [&str; 4] = [
    "brickwire",
    "brickwire_codec",
    "brickwire_transport",
    "brickwire_device",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    /// Includes hex dumps of every frame.
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Directive applying this level to the brickwire crates. Everything
    /// else stays at `warn` so serial port and clap noise is kept out of
    /// frame traces.
    pub fn directive(self) -> String {
        let mut directive = String::from("warn");
        for name in CRATES {
            directive.push(',');
            directive.push_str(name);
            directive.push('=');
            directive.push_str(self.as_str());
        }
        directive
    }
}

/// Filter from `BRICKWIRE_LOG` when it is set and parses, otherwise from
/// the command line level.
fn filter(level: LogLevel, env: Option<&str>) -> EnvFilter {
    env.filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(level.directive()))
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter(level, env.as_deref()))
        .with_ansi(false)
        .with_target(matches!(level, LogLevel::Debug | LogLevel::Trace))
        .with_thread_names(true);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
