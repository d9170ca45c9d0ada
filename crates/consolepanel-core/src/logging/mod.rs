use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How much a ConsolePanel process writes to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Errors only. The CLI default, so stdout stays pipeable.
    Quiet,
    /// Info events: tool invocations, route outcomes, scheduler lifecycle.
    Normal,
    /// Everything, including per-capture scheduler traffic.
    Debug,
}

impl Verbosity {
    /// Map a repeated `-v` count: none is quiet, one is normal, more is debug.
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            _ => Verbosity::Debug,
        }
    }

    fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "consolepanel=error",
            Verbosity::Normal => "consolepanel=info",
            Verbosity::Debug => "consolepanel=debug",
        }
    }
}

/// Install the JSON stderr subscriber.
///
/// The directive covers every `consolepanel*` crate target. `RUST_LOG` adds to
/// it. Returns false when a subscriber was already installed.
pub fn init_logging(verbosity: Verbosity) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(
            EnvFilter::from_default_env()
                .add_directive(verbosity.directive().parse().expect("Invalid log directive")),
        )
        .try_init()
        .is_ok()
}
